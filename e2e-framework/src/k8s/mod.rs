mod kube_backend;
mod pod;
mod pod_ext;
mod selector;

pub use kube_backend::KubeBackend;
pub use pod::*;
pub use selector::*;

use crate::prelude::*;

pub trait KubeResourceExt {
    fn namespaced_name(&self) -> String;
    fn matches(&self, sel: &metav1::LabelSelector) -> anyhow::Result<bool>;
}

pub trait PodExt {
    fn phase(&self) -> Option<&str>;
    fn is_started(&self) -> bool;
    fn is_running(&self) -> bool;
    fn is_terminating(&self) -> bool;
}

pub fn namespaced_name(namespace: &str, name: &str) -> String {
    format!("{namespace}/{name}")
}

#[cfg(test)]
pub mod tests;
