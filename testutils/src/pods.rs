use std::collections::BTreeMap;

use e2e_framework::k8s::build_example_pod;
use k8s_openapi::api::core::v1 as corev1;
use rstest::*;

use crate::constants::*;

#[fixture]
pub fn example_pod(#[default(TEST_POD_NAME)] name: &str, #[default(TEST_NAMESPACE)] namespace: &str) -> corev1::Pod {
    build_example_pod(name, namespace).unwrap()
}

pub fn test_app_labels() -> BTreeMap<String, String> {
    BTreeMap::from([(TEST_APP_LABEL_KEY.into(), TEST_APP_LABEL_VALUE.into())])
}

pub fn labeled_pod(name: &str, namespace: &str) -> corev1::Pod {
    let mut pod = example_pod(name, namespace);
    pod.metadata.labels = Some(test_app_labels());
    pod
}

pub fn with_phase(mut pod: corev1::Pod, phase: &str) -> corev1::Pod {
    pod.status = Some(corev1::PodStatus { phase: Some(phase.into()), ..Default::default() });
    pod
}
