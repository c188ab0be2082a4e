
use std::sync::Arc;

use e2e_framework::fake::FakeCluster;
use e2e_framework::{
    Framework,
    FrameworkConfig,
};
use rstest::*;
use tracing_test::traced_test;

use super::*;

#[fixture]
fn fake_cluster() -> FakeCluster {
    FakeCluster::new()
}

fn fake_framework(cluster: &FakeCluster) -> Framework {
    let config = FrameworkConfig { poll_interval_millis: 50, ..Default::default() };
    Framework::with_backend(Arc::new(cluster.clone()), config)
}

fn parse_opts(args: &[&str]) -> Options {
    Options::parse_from([&["e2e-smoke"], args].concat())
}
