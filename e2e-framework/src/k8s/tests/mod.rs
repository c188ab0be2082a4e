mod kube_backend_test;
mod selector_test;

use assertables::*;
use e2e_testutils::*;
use rstest::*;
use tracing_test::traced_test;

use super::*;
use crate::errors::*;
