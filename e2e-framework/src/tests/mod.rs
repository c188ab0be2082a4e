
use std::sync::Arc;
use std::time::Duration;

use e2e_testutils::*;
use rstest::*;
use tokio::time::sleep;
use tracing_test::traced_test;

use crate::errors::*;
use crate::fake::FakeCluster;
use crate::prelude::*;
use crate::{
    Framework,
    FrameworkConfig,
    ListOptions,
    PodBackend,
    PodEvent,
};

const TEST_POLL_INTERVAL_MILLIS: u64 = 50;

#[fixture]
fn fake_cluster() -> FakeCluster {
    FakeCluster::new()
}

fn test_config() -> FrameworkConfig {
    FrameworkConfig {
        poll_interval_millis: TEST_POLL_INTERVAL_MILLIS,
        ..Default::default()
    }
}

fn fake_framework(cluster: &FakeCluster) -> Framework {
    Framework::with_backend(Arc::new(cluster.clone()), test_config())
}
