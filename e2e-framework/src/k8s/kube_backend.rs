use async_trait::async_trait;
use futures::{
    StreamExt,
    TryStreamExt,
    future,
};
use kube::api::{
    DeleteParams,
    ListParams,
    PostParams,
};
use kube::runtime::watcher::{
    self,
    Event,
    watcher,
};
use tracing::*;

use super::*;
use crate::backend::{
    ListOptions,
    PodBackend,
    PodEvent,
    PodEventStream,
};
use crate::errors::*;

const HTTP_NOT_FOUND: u16 = 404;
const HTTP_CONFLICT: u16 = 409;

// PodBackend that talks to a real apiserver.  Everything here is a thin pass-through; the only
// thing we do on top of kube is translate the "expected" failure codes into FrameworkErrors.
#[derive(Clone)]
pub struct KubeBackend {
    client: kube::Client,
}

impl KubeBackend {
    pub fn new(client: kube::Client) -> KubeBackend {
        KubeBackend { client }
    }

    fn pod_api(&self, namespace: &str) -> kube::Api<corev1::Pod> {
        kube::Api::namespaced(self.client.clone(), namespace)
    }
}

fn api_error_code(err: &kube::Error) -> Option<u16> {
    match err {
        kube::Error::Api(resp) => Some(resp.code),
        _ => None,
    }
}

fn translate_error(err: kube::Error, ns_name: &str) -> anyhow::Error {
    match api_error_code(&err) {
        Some(HTTP_NOT_FOUND) => FrameworkError::not_found(ns_name),
        _ => err.into(),
    }
}

fn build_list_params(opts: &ListOptions) -> anyhow::Result<ListParams> {
    let mut lp = ListParams::default();
    if let Some(sel) = &opts.label_selector {
        let sel_str = label_selector_string(sel)?;
        if !sel_str.is_empty() {
            lp = lp.labels(&sel_str);
        }
    }
    if let Some(name) = &opts.name {
        lp = lp.fields(&format!("{METADATA_NAME_FIELD}={name}"));
    }
    Ok(lp)
}

#[async_trait]
impl PodBackend for KubeBackend {
    async fn create(&self, pod: &corev1::Pod) -> anyhow::Result<corev1::Pod> {
        let ns_name = pod.namespaced_name();
        let namespace = pod.metadata.namespace.as_deref().unwrap_or_default();
        debug!("creating pod {ns_name}");
        match self.pod_api(namespace).create(&PostParams::default(), pod).await {
            Ok(created) => Ok(created),
            Err(err) if api_error_code(&err) == Some(HTTP_CONFLICT) => Err(FrameworkError::already_exists(&ns_name)),
            Err(err) => Err(err.into()),
        }
    }

    async fn get(&self, name: &str, namespace: &str) -> anyhow::Result<corev1::Pod> {
        self.pod_api(namespace)
            .get(name)
            .await
            .map_err(|err| translate_error(err, &namespaced_name(namespace, name)))
    }

    async fn list(&self, opts: &ListOptions) -> anyhow::Result<Vec<corev1::Pod>> {
        let api: kube::Api<corev1::Pod> = match &opts.namespace {
            Some(ns) => self.pod_api(ns),
            None => kube::Api::all(self.client.clone()),
        };
        let lp = build_list_params(opts)?;
        Ok(api.list(&lp).await?.items)
    }

    async fn delete(&self, name: &str, namespace: &str) -> EmptyResult {
        // delete returns an "either" object; left contains the object being deleted, and right
        // contains a status code indicating the delete is finished.  We don't care which.
        self.pod_api(namespace)
            .delete(name, &DeleteParams::default())
            .await
            .map_err(|err| translate_error(err, &namespaced_name(namespace, name)))?;
        Ok(())
    }

    async fn watch(&self, name: &str, namespace: &str) -> anyhow::Result<PodEventStream> {
        let config = watcher::Config::default().fields(&format!("{METADATA_NAME_FIELD}={name}"));
        let stream = watcher(self.pod_api(namespace), config)
            .map_err(anyhow::Error::from)
            .try_filter_map(|evt| {
                future::ready(Ok(match evt {
                    Event::Apply(pod) | Event::InitApply(pod) => Some(PodEvent::Applied(pod)),
                    Event::Delete(pod) => Some(PodEvent::Deleted(pod)),
                    Event::Init | Event::InitDone => None,
                }))
            })
            .boxed();
        Ok(stream)
    }
}
