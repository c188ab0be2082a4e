use super::*;
use crate::errors::*;

pub fn build_pod(name: &str, namespace: &str, image: &str, command: &[&str]) -> anyhow::Result<corev1::Pod> {
    validate_pod_key(name, namespace)?;
    ensure!(!image.is_empty(), FrameworkError::invalid_argument("container image must not be empty"));

    Ok(corev1::Pod {
        metadata: metav1::ObjectMeta {
            namespace: Some(namespace.into()),
            name: Some(name.into()),
            ..Default::default()
        },
        spec: Some(corev1::PodSpec {
            containers: vec![corev1::Container {
                name: EXAMPLE_CONTAINER_NAME.into(),
                image: Some(image.into()),
                image_pull_policy: Some(EXAMPLE_PULL_POLICY.into()),
                command: Some(command.iter().map(|s| s.to_string()).collect()),
                ..Default::default()
            }],
            ..Default::default()
        }),
        ..Default::default()
    })
}

// A single alpine container that idles forever but still exits promptly on TERM/INT
pub fn build_example_pod(name: &str, namespace: &str) -> anyhow::Result<corev1::Pod> {
    build_pod(name, namespace, EXAMPLE_IMAGE, &EXAMPLE_COMMAND)
}
