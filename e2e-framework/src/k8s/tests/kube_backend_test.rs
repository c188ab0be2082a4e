use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use httpmock::Method::*;

use super::*;
use crate::backend::{
    ListOptions,
    PodBackend,
    PodEvent,
};
use crate::{
    Framework,
    FrameworkConfig,
};

#[rstest]
#[traced_test]
#[tokio::test]
async fn test_get() {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    let pod = example_pod(TEST_POD_NAME, TEST_NAMESPACE);
    let body = pod.clone();
    fake_apiserver
        .handle(move |when, then| {
            when.method(GET).path(pod_path(TEST_NAMESPACE, TEST_POD_NAME));
            then.json_body_obj(&body);
        })
        .build();

    let got = KubeBackend::new(client).get(TEST_POD_NAME, TEST_NAMESPACE).await.unwrap();
    fake_apiserver.assert();
    assert_eq!(got, pod);
}

#[rstest]
#[traced_test]
#[tokio::test]
async fn test_get_not_found() {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    fake_apiserver.handle_not_found(pod_path(TEST_NAMESPACE, TEST_POD_NAME)).build();

    let err = KubeBackend::new(client).get(TEST_POD_NAME, TEST_NAMESPACE).await.unwrap_err();
    fake_apiserver.assert();
    assert!(matches!(err.downcast::<FrameworkError>().unwrap(), FrameworkError::NotFound(_)));
}

#[rstest]
#[traced_test]
#[tokio::test]
async fn test_get_server_error_passthrough() {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    fake_apiserver
        .handle(|when, then| {
            when.method(GET).path(pod_path(TEST_NAMESPACE, TEST_POD_NAME));
            then.status(500).json_body(status_internal_error());
        })
        .build();

    let err = KubeBackend::new(client).get(TEST_POD_NAME, TEST_NAMESPACE).await.unwrap_err();
    fake_apiserver.assert();
    assert!(err.downcast_ref::<FrameworkError>().is_none());
    assert_ok!(err.downcast::<kube::Error>());
}

#[rstest]
#[traced_test]
#[tokio::test]
async fn test_create() {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    let pod = example_pod(TEST_POD_NAME, TEST_NAMESPACE);
    let body = pod.clone();
    fake_apiserver
        .handle(move |when, then| {
            when.method(POST).path(pods_path(TEST_NAMESPACE));
            then.status(201).json_body_obj(&body);
        })
        .build();

    let created = KubeBackend::new(client).create(&pod).await.unwrap();
    fake_apiserver.assert();
    assert_eq!(created.name_any(), TEST_POD_NAME);
}

#[rstest]
#[traced_test]
#[tokio::test]
async fn test_create_conflict() {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    fake_apiserver
        .handle(|when, then| {
            when.method(POST).path(pods_path(TEST_NAMESPACE));
            then.status(409).json_body(status_conflict());
        })
        .build();

    let err = KubeBackend::new(client)
        .create(&example_pod(TEST_POD_NAME, TEST_NAMESPACE))
        .await
        .unwrap_err();
    fake_apiserver.assert();
    assert!(matches!(err.downcast::<FrameworkError>().unwrap(), FrameworkError::AlreadyExists(_)));
}

#[rstest]
#[traced_test]
#[tokio::test]
async fn test_delete() {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    fake_apiserver
        .handle(|when, then| {
            when.method(DELETE).path(pod_path(TEST_NAMESPACE, TEST_POD_NAME));
            then.json_body(status_ok());
        })
        .build();

    KubeBackend::new(client).delete(TEST_POD_NAME, TEST_NAMESPACE).await.unwrap();
    fake_apiserver.assert();
}

#[rstest]
#[traced_test]
#[tokio::test]
async fn test_delete_not_found() {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    fake_apiserver.handle_not_found(pod_path(TEST_NAMESPACE, TEST_POD_NAME)).build();

    let err = KubeBackend::new(client).delete(TEST_POD_NAME, TEST_NAMESPACE).await.unwrap_err();
    fake_apiserver.assert();
    assert!(FrameworkError::is_not_found(&err));
}

#[rstest]
#[traced_test]
#[tokio::test]
async fn test_list_namespaced_with_labels() {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    let body = pod_list(&[labeled_pod(TEST_POD_NAME, TEST_NAMESPACE)]);
    fake_apiserver
        .handle(move |when, then| {
            when.method(GET)
                .path(pods_path(TEST_NAMESPACE))
                .query_param("labelSelector", format!("{TEST_APP_LABEL_KEY}={TEST_APP_LABEL_VALUE}"));
            then.json_body(body.clone());
        })
        .build();

    let opts = ListOptions {
        namespace: Some(TEST_NAMESPACE.into()),
        ..ListOptions::with_labels(test_app_labels())
    };
    let pods = KubeBackend::new(client).list(&opts).await.unwrap();
    fake_apiserver.assert();
    assert_len_eq_x!(&pods, 1);
    assert_eq!(pods[0].name_any(), TEST_POD_NAME);
}

#[rstest]
#[traced_test]
#[tokio::test]
async fn test_list_all_namespaces_by_name() {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    let body = pod_list(&[
        example_pod(TEST_POD_NAME, TEST_NAMESPACE),
        example_pod(TEST_POD_NAME, TEST_OTHER_NAMESPACE),
    ]);
    fake_apiserver
        .handle(move |when, then| {
            when.method(GET)
                .path("/api/v1/pods")
                .query_param("fieldSelector", format!("{METADATA_NAME_FIELD}={TEST_POD_NAME}"));
            then.json_body(body.clone());
        })
        .build();

    let opts = ListOptions { name: Some(TEST_POD_NAME.into()), ..Default::default() };
    let pods = KubeBackend::new(client).list(&opts).await.unwrap();
    fake_apiserver.assert();
    assert_len_eq_x!(&pods, 2);
}

#[rstest]
#[traced_test]
#[tokio::test]
async fn test_watch_initial_list_is_applied() {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    let body = pod_list(&[with_phase(example_pod(TEST_POD_NAME, TEST_NAMESPACE), POD_PHASE_RUNNING)]);
    fake_apiserver
        .handle(move |when, then| {
            when.method(GET)
                .path(pods_path(TEST_NAMESPACE))
                .query_param("fieldSelector", format!("{METADATA_NAME_FIELD}={TEST_POD_NAME}"));
            then.json_body(body.clone());
        })
        .build();

    let mut events = KubeBackend::new(client).watch(TEST_POD_NAME, TEST_NAMESPACE).await.unwrap();
    let evt = events.next().await.unwrap().unwrap();
    fake_apiserver.assert();
    assert!(matches!(evt, PodEvent::Applied(pod) if pod.is_running()));
}

#[rstest]
#[traced_test]
#[tokio::test]
async fn test_framework_over_kube_backend() {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    let body = pod_list(&[with_phase(example_pod(TEST_POD_NAME, TEST_NAMESPACE), POD_PHASE_RUNNING)]);
    fake_apiserver
        .handle(move |when, then| {
            when.method(GET)
                .path(pods_path(TEST_NAMESPACE))
                .query_param("fieldSelector", format!("{METADATA_NAME_FIELD}={TEST_POD_NAME}"));
            then.json_body(body.clone());
        })
        .handle_not_found(pod_path(TEST_NAMESPACE, "missing"))
        .build();

    let f = Framework::with_backend(Arc::new(KubeBackend::new(client)), FrameworkConfig::default());
    let pod = f
        .wait_pod_started(TEST_POD_NAME, TEST_NAMESPACE, Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(pod.name_any(), TEST_POD_NAME);

    let err = f.get_pod("missing", TEST_NAMESPACE).await.unwrap_err();
    fake_apiserver.assert();
    assert!(FrameworkError::is_not_found(&err));
}
