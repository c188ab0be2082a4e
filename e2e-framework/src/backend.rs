use std::collections::BTreeMap;
use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::errors::*;
use crate::prelude::*;

// Change notifications for a single watched pod.  The kube watcher distinguishes between initial
// list results and live updates, but for our purposes both just mean "this is what the pod looks
// like now".
#[derive(Clone, Debug)]
pub enum PodEvent {
    Applied(corev1::Pod),
    Deleted(corev1::Pod),
}

pub type PodEventStream = Pin<Box<dyn Stream<Item = anyhow::Result<PodEvent>> + Send>>;

#[derive(Clone, Debug, Default)]
pub struct ListOptions {
    pub namespace: Option<String>,
    pub label_selector: Option<metav1::LabelSelector>,
    pub name: Option<String>,
}

impl ListOptions {
    pub fn in_namespace(namespace: &str) -> ListOptions {
        ListOptions { namespace: Some(namespace.into()), ..Default::default() }
    }

    pub fn with_labels(labels: BTreeMap<String, String>) -> ListOptions {
        ListOptions {
            label_selector: Some(metav1::LabelSelector { match_labels: Some(labels), ..Default::default() }),
            ..Default::default()
        }
    }
}

// The contract the Framework needs from whatever is standing in for the apiserver.  Errors for
// missing objects must come back as FrameworkError::NotFound so that callers can tell them apart
// from transport failures.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait PodBackend: Send + Sync {
    async fn create(&self, pod: &corev1::Pod) -> anyhow::Result<corev1::Pod>;
    async fn get(&self, name: &str, namespace: &str) -> anyhow::Result<corev1::Pod>;
    async fn list(&self, opts: &ListOptions) -> anyhow::Result<Vec<corev1::Pod>>;
    async fn delete(&self, name: &str, namespace: &str) -> EmptyResult;
    async fn watch(&self, name: &str, namespace: &str) -> anyhow::Result<PodEventStream>;
}
