// Pod phases as reported in PodStatus
pub const POD_PHASE_PENDING: &str = "Pending";
pub const POD_PHASE_RUNNING: &str = "Running";
pub const POD_PHASE_SUCCEEDED: &str = "Succeeded";
pub const POD_PHASE_FAILED: &str = "Failed";
pub const POD_PHASE_UNKNOWN: &str = "Unknown";

// Field selectors
pub const METADATA_NAME_FIELD: &str = "metadata.name";

// Env vars
pub const CLUSTER_NAME_ENV_VAR: &str = "E2E_CLUSTER_NAME";
pub const KUBECONFIG_PATH_ENV_VAR: &str = "E2E_KUBECONFIG_PATH";
pub const API_OPERATION_TIMEOUT_ENV_VAR: &str = "E2E_API_OPERATION_TIMEOUT_SECONDS";
pub const RESOURCE_DELETE_TIMEOUT_ENV_VAR: &str = "E2E_RESOURCE_DELETE_TIMEOUT_SECONDS";
pub const POLL_INTERVAL_ENV_VAR: &str = "E2E_POLL_INTERVAL_MILLIS";

// Defaults
pub const DEFAULT_API_OPERATION_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_RESOURCE_DELETE_TIMEOUT_SECONDS: u64 = 60;
pub const DEFAULT_POLL_INTERVAL_MILLIS: u64 = 1000;

// Example pod
pub const EXAMPLE_CONTAINER_NAME: &str = "samplepod";
pub const EXAMPLE_IMAGE: &str = "alpine";
pub const EXAMPLE_PULL_POLICY: &str = "IfNotPresent";
pub const EXAMPLE_COMMAND: [&str; 3] = ["/bin/ash", "-c", "trap : TERM INT; sleep infinity & wait"];
