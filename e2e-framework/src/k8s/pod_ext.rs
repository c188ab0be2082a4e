use super::*;

impl PodExt for corev1::Pod {
    fn phase(&self) -> Option<&str> {
        self.status.as_ref()?.phase.as_deref()
    }

    // A pod counts as started once the kubelet has moved it out of Pending; "Unknown" means the
    // node stopped reporting and tells us nothing about whether the containers came up.  An empty
    // phase (nobody has written status yet) is not started either.
    fn is_started(&self) -> bool {
        matches!(self.phase(), Some(POD_PHASE_RUNNING | POD_PHASE_SUCCEEDED | POD_PHASE_FAILED))
    }

    fn is_running(&self) -> bool {
        self.phase() == Some(POD_PHASE_RUNNING)
    }

    fn is_terminating(&self) -> bool {
        self.metadata.deletion_timestamp.is_some()
    }
}
