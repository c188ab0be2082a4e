use std::fs::File;
use std::time::Duration;

use serde::{
    Deserialize,
    Serialize,
};
use tracing::*;

use crate::constants::*;
use crate::errors::*;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FrameworkConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,

    // When unset we fall back to kube's default config inference (KUBECONFIG, ~/.kube/config,
    // in-cluster service account)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kubeconfig_path: Option<String>,

    pub api_operation_timeout_seconds: u64,
    pub resource_delete_timeout_seconds: u64,
    pub poll_interval_millis: u64,
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        FrameworkConfig {
            cluster_name: None,
            kubeconfig_path: None,
            api_operation_timeout_seconds: DEFAULT_API_OPERATION_TIMEOUT_SECONDS,
            resource_delete_timeout_seconds: DEFAULT_RESOURCE_DELETE_TIMEOUT_SECONDS,
            poll_interval_millis: DEFAULT_POLL_INTERVAL_MILLIS,
        }
    }
}

impl FrameworkConfig {
    pub fn load(path: &str) -> anyhow::Result<FrameworkConfig> {
        let config_file = File::open(path)?;
        let config: FrameworkConfig = serde_yaml::from_reader(config_file)?;
        config.validate()?;
        Ok(config)
    }

    // Defaults plus the E2E_* overrides from the process environment
    pub fn from_env() -> anyhow::Result<FrameworkConfig> {
        let mut config = FrameworkConfig::default();
        config.apply_process_env()?;
        Ok(config)
    }

    // Same as `load`, but the E2E_* environment variables win over the file
    pub fn load_with_env(path: &str) -> anyhow::Result<FrameworkConfig> {
        let mut config = FrameworkConfig::load(path)?;
        config.apply_process_env()?;
        Ok(config)
    }

    // Overrides come from the lookup function rather than straight from the process environment
    // so that tests can feed in their own values
    pub fn apply_env<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) -> EmptyResult {
        if let Some(name) = lookup(CLUSTER_NAME_ENV_VAR) {
            self.cluster_name = Some(name);
        }
        if let Some(path) = lookup(KUBECONFIG_PATH_ENV_VAR) {
            self.kubeconfig_path = Some(path);
        }
        if let Some(secs) = parse_env_u64(&lookup, API_OPERATION_TIMEOUT_ENV_VAR)? {
            self.api_operation_timeout_seconds = secs;
        }
        if let Some(secs) = parse_env_u64(&lookup, RESOURCE_DELETE_TIMEOUT_ENV_VAR)? {
            self.resource_delete_timeout_seconds = secs;
        }
        if let Some(millis) = parse_env_u64(&lookup, POLL_INTERVAL_ENV_VAR)? {
            self.poll_interval_millis = millis;
        }

        debug!("framework config after env overrides: {self:?}");
        self.validate()
    }

    pub fn api_operation_timeout(&self) -> Duration {
        Duration::from_secs(self.api_operation_timeout_seconds)
    }

    pub fn resource_delete_timeout(&self) -> Duration {
        Duration::from_secs(self.resource_delete_timeout_seconds)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_millis)
    }

    fn apply_process_env(&mut self) -> EmptyResult {
        self.apply_env(|key| std::env::var(key).ok())
    }

    fn validate(&self) -> EmptyResult {
        ensure!(self.api_operation_timeout_seconds > 0, "apiOperationTimeoutSeconds must be positive");
        ensure!(self.poll_interval_millis > 0, "pollIntervalMillis must be positive");
        Ok(())
    }
}

fn parse_env_u64<F: Fn(&str) -> Option<String>>(lookup: &F, key: &str) -> anyhow::Result<Option<u64>> {
    match lookup(key) {
        None => Ok(None),
        Some(val) => match val.trim().parse() {
            Ok(n) => Ok(Some(n)),
            Err(err) => bail!("could not parse {key}={val}: {err}"),
        },
    }
}
