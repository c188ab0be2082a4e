use std::collections::BTreeMap;

use super::*;

fn requirement(key: &str, operator: &str, values: Option<Vec<&str>>) -> metav1::LabelSelectorRequirement {
    metav1::LabelSelectorRequirement {
        key: key.into(),
        operator: operator.into(),
        values: values.map(|vs| vs.into_iter().map(String::from).collect()),
    }
}

fn selector(exprs: Vec<metav1::LabelSelectorRequirement>) -> metav1::LabelSelector {
    metav1::LabelSelector { match_expressions: Some(exprs), ..Default::default() }
}

#[fixture]
fn labeled_test_pod() -> corev1::Pod {
    labeled_pod(TEST_POD_NAME, TEST_NAMESPACE)
}

#[rstest]
#[case::in_match(OPERATOR_IN, Some(vec![TEST_APP_LABEL_VALUE, "other"]), true)]
#[case::in_miss(OPERATOR_IN, Some(vec!["other"]), false)]
#[case::not_in_match(OPERATOR_NOT_IN, Some(vec!["other"]), true)]
#[case::not_in_miss(OPERATOR_NOT_IN, Some(vec![TEST_APP_LABEL_VALUE]), false)]
#[case::exists(OPERATOR_EXISTS, None, true)]
#[case::does_not_exist(OPERATOR_DOES_NOT_EXIST, None, false)]
fn test_matches_expressions(
    labeled_test_pod: corev1::Pod,
    #[case] operator: &str,
    #[case] values: Option<Vec<&str>>,
    #[case] expected: bool,
) {
    let sel = selector(vec![requirement(TEST_APP_LABEL_KEY, operator, values)]);
    assert_eq!(labeled_test_pod.matches(&sel).unwrap(), expected);
}

#[rstest]
#[case::in_no_values(OPERATOR_IN, None)]
#[case::not_in_empty_values(OPERATOR_NOT_IN, Some(vec![]))]
#[case::exists_with_values(OPERATOR_EXISTS, Some(vec!["foo"]))]
#[case::bogus_operator("Sorta", Some(vec!["foo"]))]
fn test_matches_malformed(labeled_test_pod: corev1::Pod, #[case] operator: &str, #[case] values: Option<Vec<&str>>) {
    let sel = selector(vec![requirement(TEST_APP_LABEL_KEY, operator, values)]);
    assert_err!(labeled_test_pod.matches(&sel));
    assert_err!(label_selector_string(&sel));
}

#[rstest]
fn test_matches_labels(labeled_test_pod: corev1::Pod) {
    let sel = metav1::LabelSelector { match_labels: Some(test_app_labels()), ..Default::default() };
    assert!(labeled_test_pod.matches(&sel).unwrap());

    let sel = metav1::LabelSelector {
        match_labels: Some(BTreeMap::from([(TEST_APP_LABEL_KEY.into(), "nope".into())])),
        ..Default::default()
    };
    assert!(!labeled_test_pod.matches(&sel).unwrap());
}

#[rstest]
fn test_matches_missing_key_not_in() {
    let pod = example_pod(TEST_POD_NAME, TEST_NAMESPACE);
    let sel = selector(vec![requirement(TEST_APP_LABEL_KEY, OPERATOR_NOT_IN, Some(vec!["foo"]))]);
    assert!(pod.matches(&sel).unwrap());
}

#[rstest]
fn test_label_selector_string() {
    let sel = metav1::LabelSelector {
        match_labels: Some(test_app_labels()),
        match_expressions: Some(vec![
            requirement("tier", OPERATOR_IN, Some(vec!["web", "api"])),
            requirement("env", OPERATOR_NOT_IN, Some(vec!["prod"])),
            requirement("owner", OPERATOR_EXISTS, None),
            requirement("canary", OPERATOR_DOES_NOT_EXIST, None),
        ]),
    };
    assert_eq!(
        label_selector_string(&sel).unwrap(),
        format!("{TEST_APP_LABEL_KEY}={TEST_APP_LABEL_VALUE},tier in (web,api),env notin (prod),owner,!canary")
    );
}

#[rstest]
fn test_label_selector_string_empty() {
    assert_eq!(label_selector_string(&Default::default()).unwrap(), "");
}
