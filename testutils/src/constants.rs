pub const TEST_POD_NAME: &str = "testpod";
pub const TEST_NAMESPACE: &str = "default";
pub const TEST_OTHER_NAMESPACE: &str = "test-namespace";
pub const TEST_APP_LABEL_KEY: &str = "app";
pub const TEST_APP_LABEL_VALUE: &str = "e2e-sample";
