pub mod backend;
pub mod config;
pub mod constants;
pub mod errors;
#[cfg(any(test, feature = "fake"))]
pub mod fake;
pub mod framework;
pub mod k8s;
pub mod logging;

pub use crate::backend::{
    ListOptions,
    PodBackend,
    PodEvent,
    PodEventStream,
};
pub use crate::config::FrameworkConfig;
pub use crate::errors::FrameworkError;
pub use crate::framework::Framework;

pub mod prelude {
    pub use k8s_openapi::api::core::v1 as corev1;
    pub use k8s_openapi::apimachinery::pkg::apis::meta::v1 as metav1;
    pub use kube::ResourceExt;

    pub use crate::constants::*;
    pub use crate::errors::EmptyResult;
    pub use crate::k8s::{
        KubeResourceExt,
        PodExt,
    };
}

#[cfg(test)]
mod tests;
