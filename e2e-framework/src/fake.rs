use std::collections::BTreeMap;
use std::sync::{
    Arc,
    Mutex,
};
use std::time::Duration;

use async_trait::async_trait;
use clockabilly::prelude::*;
use futures::{
    StreamExt,
    stream,
};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::sleep;
use tracing::*;

use crate::backend::{
    ListOptions,
    PodBackend,
    PodEvent,
    PodEventStream,
};
use crate::errors::*;
use crate::k8s::{
    KubeResourceExt,
    PodExt,
    namespaced_name,
};
use crate::prelude::*;

const EVENT_CHANNEL_CAPACITY: usize = 1024;

// An in-memory stand-in for the apiserver plus just enough of a kubelet to move pods from Pending
// to Running.  Watchers only see events that are published after they subscribe; there is no
// initial list like the real watch API gives you, so a watch that is established after a pod is
// created will never hear about it.
#[derive(Clone)]
pub struct FakeCluster {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<FakeState>,
    events: broadcast::Sender<PodEvent>,
    start_delay: Option<Duration>,
    deletion_grace: Option<Duration>,
}

struct FakeState {
    pods: BTreeMap<String, corev1::Pod>,
    resource_version: u64,
    clock: Box<dyn Clockable + Send>,
}

impl FakeState {
    fn next_resource_version(&mut self) -> String {
        self.resource_version += 1;
        self.resource_version.to_string()
    }
}

pub struct FakeClusterBuilder {
    start_delay: Option<Duration>,
    deletion_grace: Option<Duration>,
    clock: Box<dyn Clockable + Send>,
}

impl FakeClusterBuilder {
    // How long the fake kubelet takes to move a new pod to Running
    pub fn start_delay(mut self, delay: Duration) -> Self {
        self.start_delay = Some(delay);
        self
    }

    // Pods stay Pending until somebody calls set_pod_phase
    pub fn manual_start(mut self) -> Self {
        self.start_delay = None;
        self
    }

    pub fn deletion_grace(mut self, grace: Duration) -> Self {
        self.deletion_grace = Some(grace);
        self
    }

    pub fn clock(mut self, clock: Box<dyn Clockable + Send>) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> FakeCluster {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        FakeCluster {
            inner: Arc::new(Inner {
                state: Mutex::new(FakeState {
                    pods: BTreeMap::new(),
                    resource_version: 0,
                    clock: self.clock,
                }),
                events,
                start_delay: self.start_delay,
                deletion_grace: self.deletion_grace,
            }),
        }
    }
}

impl Default for FakeCluster {
    fn default() -> Self {
        FakeCluster::new()
    }
}

impl FakeCluster {
    pub fn new() -> FakeCluster {
        FakeCluster::builder().build()
    }

    pub fn builder() -> FakeClusterBuilder {
        FakeClusterBuilder {
            start_delay: Some(Duration::ZERO),
            deletion_grace: None,
            clock: UtcClock::boxed(),
        }
    }

    pub fn set_pod_phase(&self, name: &str, namespace: &str, phase: &str) -> anyhow::Result<corev1::Pod> {
        let ns_name = namespaced_name(namespace, name);
        let pod = {
            let mut state = self.lock();
            let rv = state.next_resource_version();
            let Some(pod) = state.pods.get_mut(&ns_name) else {
                bail!(FrameworkError::not_found(&ns_name));
            };
            pod.metadata.resource_version = Some(rv);
            pod.status.get_or_insert_with(Default::default).phase = Some(phase.into());
            pod.clone()
        };

        debug!("pod {ns_name} moved to phase {phase}");
        self.publish(PodEvent::Applied(pod.clone()));
        Ok(pod)
    }

    pub fn pod_count(&self) -> usize {
        self.lock().pods.len()
    }

    // Number of live watch subscriptions; lets tests check that an abandoned wait cleaned up
    // after itself
    pub fn watcher_count(&self) -> usize {
        self.inner.events.receiver_count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.inner.state.lock().expect("fake cluster mutex poisoned")
    }

    fn publish(&self, evt: PodEvent) {
        // send only fails when nobody is subscribed, which is fine
        let _ = self.inner.events.send(evt);
    }

    // The kubelet only starts the incarnation it was scheduled for; a namesake created in the
    // meantime has a different uid and gets its own timer
    fn schedule_start(&self, name: String, namespace: String, uid: Option<String>, delay: Duration) {
        let cluster = self.clone();
        tokio::spawn(async move {
            sleep(delay).await;
            let pending = cluster
                .lock()
                .pods
                .get(&namespaced_name(&namespace, &name))
                .is_some_and(|pod| {
                    pod.metadata.uid == uid && pod.phase() == Some(POD_PHASE_PENDING) && !pod.is_terminating()
                });
            if !pending {
                debug!("pod {namespace}/{name} is gone or no longer pending, not starting it");
                return;
            }
            if let Err(err) = cluster.set_pod_phase(&name, &namespace, POD_PHASE_RUNNING) {
                warn!("fake kubelet could not start pod {namespace}/{name}: {err}");
            }
        });
    }

    fn schedule_removal(&self, ns_name: String, grace: Duration) {
        let cluster = self.clone();
        tokio::spawn(async move {
            sleep(grace).await;
            cluster.remove(&ns_name);
        });
    }

    fn remove(&self, ns_name: &str) -> Option<corev1::Pod> {
        let removed = self.lock().pods.remove(ns_name);
        if let Some(pod) = &removed {
            debug!("pod {ns_name} removed");
            self.publish(PodEvent::Deleted(pod.clone()));
        }
        removed
    }
}

fn event_key(evt: &PodEvent) -> String {
    match evt {
        PodEvent::Applied(pod) | PodEvent::Deleted(pod) => pod.namespaced_name(),
    }
}

#[async_trait]
impl PodBackend for FakeCluster {
    async fn create(&self, pod: &corev1::Pod) -> anyhow::Result<corev1::Pod> {
        let name = pod.metadata.name.clone().unwrap_or_default();
        let namespace = pod.metadata.namespace.clone().unwrap_or_default();
        validate_pod_key(&name, &namespace)?;
        let ns_name = namespaced_name(&namespace, &name);

        let created = {
            let mut state = self.lock();
            if state.pods.contains_key(&ns_name) {
                bail!(FrameworkError::already_exists(&ns_name));
            }

            let mut created = pod.clone();
            let rv = state.next_resource_version();
            created.metadata.uid = Some(format!("fake-uid-{rv}"));
            created.metadata.resource_version = Some(rv);
            created.metadata.creation_timestamp = Some(metav1::Time(state.clock.now()));
            created.metadata.deletion_timestamp = None;
            created.status = Some(corev1::PodStatus {
                phase: Some(POD_PHASE_PENDING.into()),
                ..Default::default()
            });
            state.pods.insert(ns_name.clone(), created.clone());
            created
        };

        info!("fake cluster created pod {ns_name}");
        self.publish(PodEvent::Applied(created.clone()));
        if let Some(delay) = self.inner.start_delay {
            self.schedule_start(name, namespace, created.metadata.uid.clone(), delay);
        }
        Ok(created)
    }

    async fn get(&self, name: &str, namespace: &str) -> anyhow::Result<corev1::Pod> {
        let ns_name = namespaced_name(namespace, name);
        match self.lock().pods.get(&ns_name) {
            Some(pod) => Ok(pod.clone()),
            None => Err(FrameworkError::not_found(&ns_name)),
        }
    }

    async fn list(&self, opts: &ListOptions) -> anyhow::Result<Vec<corev1::Pod>> {
        let state = self.lock();
        let mut pods = vec![];
        for pod in state.pods.values() {
            if opts.namespace.as_ref().is_some_and(|ns| pod.metadata.namespace.as_ref() != Some(ns)) {
                continue;
            }
            if opts.name.as_ref().is_some_and(|name| pod.metadata.name.as_ref() != Some(name)) {
                continue;
            }
            if let Some(sel) = &opts.label_selector
                && !pod.matches(sel)?
            {
                continue;
            }
            pods.push(pod.clone());
        }
        Ok(pods)
    }

    async fn delete(&self, name: &str, namespace: &str) -> EmptyResult {
        let ns_name = namespaced_name(namespace, name);
        let Some(grace) = self.inner.deletion_grace else {
            return match self.remove(&ns_name) {
                Some(_) => Ok(()),
                None => Err(FrameworkError::not_found(&ns_name)),
            };
        };

        let terminating = {
            let mut state = self.lock();
            let now = state.clock.now();
            let rv = state.next_resource_version();
            let Some(pod) = state.pods.get_mut(&ns_name) else {
                bail!(FrameworkError::not_found(&ns_name));
            };

            // Deleting something that's already on its way out is a no-op, same as the apiserver
            if pod.is_terminating() {
                return Ok(());
            }
            pod.metadata.resource_version = Some(rv);
            pod.metadata.deletion_timestamp = Some(metav1::Time(now));
            pod.metadata.deletion_grace_period_seconds = Some(grace.as_secs() as i64);
            pod.clone()
        };

        info!("fake cluster is terminating pod {ns_name}");
        self.publish(PodEvent::Applied(terminating));
        self.schedule_removal(ns_name, grace);
        Ok(())
    }

    async fn watch(&self, name: &str, namespace: &str) -> anyhow::Result<PodEventStream> {
        let key = namespaced_name(namespace, name);
        let rx = self.inner.events.subscribe();
        let stream = stream::unfold(rx, move |mut rx| {
            let key = key.clone();
            async move {
                loop {
                    match rx.recv().await {
                        Ok(evt) if event_key(&evt) == key => return Some((Ok(evt), rx)),
                        Ok(_) => continue,
                        Err(RecvError::Lagged(n)) => warn!("watch on {key} fell behind, skipped {n} events"),
                        Err(RecvError::Closed) => return None,
                    }
                }
            }
        })
        .boxed();
        Ok(stream)
    }
}
