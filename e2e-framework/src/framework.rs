use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::time::{
    sleep,
    timeout,
};
use tracing::*;

use crate::backend::{
    ListOptions,
    PodBackend,
    PodEvent,
};
use crate::config::FrameworkConfig;
use crate::errors::*;
use crate::k8s::{
    KubeBackend,
    PodExt,
    namespaced_name,
};
use crate::prelude::*;

// The Framework is a convenience layer for test suites: it validates identifiers, bounds every
// apiserver call with the configured timeout, and offers a handful of "block until" helpers.  The
// backend is the only source of truth; nothing is cached here.
#[derive(Clone)]
pub struct Framework {
    backend: Arc<dyn PodBackend>,
    config: FrameworkConfig,
}

impl Framework {
    pub async fn new(config: FrameworkConfig) -> anyhow::Result<Framework> {
        let client = match &config.kubeconfig_path {
            Some(path) => {
                info!("loading kubeconfig from {path}");
                let kubeconfig = kube::config::Kubeconfig::read_from(path)?;
                let client_config =
                    kube::Config::from_custom_kubeconfig(kubeconfig, &kube::config::KubeConfigOptions::default())
                        .await?;
                kube::Client::try_from(client_config)?
            },
            None => kube::Client::try_default().await?,
        };
        Ok(Framework::with_backend(Arc::new(KubeBackend::new(client)), config))
    }

    pub fn with_backend(backend: Arc<dyn PodBackend>, config: FrameworkConfig) -> Framework {
        Framework { backend, config }
    }

    pub fn config(&self) -> &FrameworkConfig {
        &self.config
    }

    pub async fn create_pod(&self, pod: &corev1::Pod) -> EmptyResult {
        let name = pod.metadata.name.as_deref().unwrap_or_default();
        let namespace = pod.metadata.namespace.as_deref().unwrap_or_default();
        validate_pod_key(name, namespace)?;
        let ns_name = namespaced_name(namespace, name);

        // If a previous incarnation of this pod is still shutting down, give it a chance to go
        // away before we try to create the new one; a live pod with the same name is an error.
        match self.api_call("get pod", self.backend.get(name, namespace)).await {
            Ok(existing) if !existing.is_terminating() => bail!(FrameworkError::already_exists(&ns_name)),
            Ok(_) => {
                info!("pod {ns_name} is still terminating, waiting for it to go away");
                self.wait_pod_gone(name, namespace, self.config.resource_delete_timeout()).await?;
            },
            Err(err) if FrameworkError::is_not_found(&err) => (),
            Err(err) => return Err(err),
        }

        self.api_call("create pod", self.backend.create(pod)).await?;
        info!("created pod {ns_name}");
        Ok(())
    }

    pub async fn get_pod(&self, name: &str, namespace: &str) -> anyhow::Result<corev1::Pod> {
        validate_pod_key(name, namespace)?;
        self.api_call("get pod", self.backend.get(name, namespace)).await
    }

    pub async fn get_pod_list(&self, opts: &ListOptions) -> anyhow::Result<Vec<corev1::Pod>> {
        let pods = self.api_call("list pods", self.backend.list(opts)).await?;
        debug!("listed {} pods with {opts:?}", pods.len());
        Ok(pods)
    }

    pub async fn get_pod_list_by_label(&self, labels: &BTreeMap<String, String>) -> anyhow::Result<Vec<corev1::Pod>> {
        self.get_pod_list(&ListOptions::with_labels(labels.clone())).await
    }

    pub async fn delete_pod(&self, name: &str, namespace: &str) -> EmptyResult {
        validate_pod_key(name, namespace)?;
        self.api_call("delete pod", self.backend.delete(name, namespace)).await?;
        info!("deleted pod {}", namespaced_name(namespace, name));
        Ok(())
    }

    pub async fn delete_pod_until_finish(&self, name: &str, namespace: &str, wait: Duration) -> EmptyResult {
        validate_pod_key(name, namespace)?;
        let delete_and_poll = async {
            self.delete_pod(name, namespace).await?;
            self.poll_pod_gone(name, namespace).await
        };
        match timeout(wait, delete_and_poll).await {
            Ok(res) => res,
            Err(_) => Err(FrameworkError::timeout(&format!(
                "waiting for pod {} to be deleted",
                namespaced_name(namespace, name)
            ))),
        }
    }

    pub async fn delete_pod_list(&self, pods: &[corev1::Pod]) -> EmptyResult {
        for pod in pods {
            let name = pod.metadata.name.as_deref().unwrap_or_default();
            let namespace = pod.metadata.namespace.as_deref().unwrap_or_default();
            self.delete_pod(name, namespace).await?;
        }
        Ok(())
    }

    // Blocks until the named pod is reported as started, using a watch rather than polling.  The
    // watch is dropped on every exit path, including when the deadline expires.
    pub async fn wait_pod_started(&self, name: &str, namespace: &str, wait: Duration) -> anyhow::Result<corev1::Pod> {
        validate_pod_key(name, namespace)?;
        let ns_name = namespaced_name(namespace, name);

        match timeout(wait, self.watch_until_started(name, namespace, &ns_name)).await {
            Ok(res) => {
                if res.is_ok() {
                    info!("pod {ns_name} started");
                }
                res
            },
            Err(_) => Err(FrameworkError::timeout(&format!("waiting for pod {ns_name} to start"))),
        }
    }

    pub fn check_pod_list_running(pods: &[corev1::Pod]) -> bool {
        !pods.is_empty() && pods.iter().all(|pod| pod.is_running())
    }

    // The whole wait, including any backend call that is in flight, is bounded by `wait`
    pub async fn wait_pod_list_running(
        &self,
        labels: &BTreeMap<String, String>,
        expected: usize,
        wait: Duration,
    ) -> anyhow::Result<Vec<corev1::Pod>> {
        match timeout(wait, self.poll_pod_list_running(labels, expected)).await {
            Ok(res) => res,
            Err(_) => Err(FrameworkError::timeout(&format!(
                "waiting for {expected} running pods with labels {labels:?}"
            ))),
        }
    }

    async fn watch_until_started(&self, name: &str, namespace: &str, ns_name: &str) -> anyhow::Result<corev1::Pod> {
        let mut events = self.backend.watch(name, namespace).await?;
        debug!("watching pod {ns_name}");
        while let Some(evt) = events.next().await {
            match evt? {
                PodEvent::Applied(pod) if pod.is_started() => return Ok(pod),
                PodEvent::Applied(pod) => {
                    debug!("pod {ns_name} not started yet (phase = {:?})", pod.phase());
                },
                PodEvent::Deleted(_) => bail!(FrameworkError::pod_deleted(ns_name)),
            }
        }
        Err(FrameworkError::watch_closed(ns_name))
    }

    async fn poll_pod_list_running(
        &self,
        labels: &BTreeMap<String, String>,
        expected: usize,
    ) -> anyhow::Result<Vec<corev1::Pod>> {
        loop {
            let pods = self.get_pod_list_by_label(labels).await?;
            if pods.len() == expected && Framework::check_pod_list_running(&pods) {
                return Ok(pods);
            }

            debug!("{} of {expected} pods listed for {labels:?}, not all running yet", pods.len());
            sleep(self.config.poll_interval()).await;
        }
    }

    async fn wait_pod_gone(&self, name: &str, namespace: &str, wait: Duration) -> EmptyResult {
        match timeout(wait, self.poll_pod_gone(name, namespace)).await {
            Ok(res) => res,
            Err(_) => Err(FrameworkError::timeout(&format!(
                "waiting for pod {} to be deleted",
                namespaced_name(namespace, name)
            ))),
        }
    }

    async fn poll_pod_gone(&self, name: &str, namespace: &str) -> EmptyResult {
        loop {
            match self.api_call("get pod", self.backend.get(name, namespace)).await {
                Err(err) if FrameworkError::is_not_found(&err) => return Ok(()),
                Err(err) => return Err(err),
                Ok(_) => sleep(self.config.poll_interval()).await,
            }
        }
    }

    async fn api_call<T, F>(&self, op: &str, fut: F) -> anyhow::Result<T>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        match timeout(self.config.api_operation_timeout(), fut).await {
            Ok(res) => res,
            Err(_) => Err(FrameworkError::timeout(op)),
        }
    }
}
