use std::time::Duration;

use clap::Parser;
use e2e_framework::errors::*;
use e2e_framework::prelude::*;
use e2e_framework::{
    Framework,
    FrameworkConfig,
    ListOptions,
    k8s,
    logging,
};
use tracing::*;

#[derive(Clone, Debug, Parser)]
struct Options {
    // Settings in the file are still subject to the E2E_* environment overrides
    #[arg(long)]
    config_file: Option<String>,

    #[arg(long, default_value = "default")]
    namespace: String,

    #[arg(long, default_value = "e2e-smoke")]
    pod_name: String,

    #[arg(long, default_value = EXAMPLE_IMAGE)]
    image: String,

    // How long to wait for the pod to start
    #[arg(long, default_value_t = 60)]
    timeout_seconds: u64,

    #[arg(short, long, default_value = "info")]
    verbosity: String,
}

fn load_config(opts: &Options) -> anyhow::Result<FrameworkConfig> {
    match &opts.config_file {
        Some(path) => FrameworkConfig::load_with_env(path),
        None => FrameworkConfig::from_env(),
    }
}

async fn run_cycle(f: &Framework, opts: &Options) -> EmptyResult {
    let pod = k8s::build_pod(&opts.pod_name, &opts.namespace, &opts.image, &EXAMPLE_COMMAND)?;
    let ns_name = pod.namespaced_name();

    // The wait goes first so that its watch is established before the create lands
    let started = tokio::try_join!(
        f.wait_pod_started(&opts.pod_name, &opts.namespace, Duration::from_secs(opts.timeout_seconds)),
        f.create_pod(&pod),
    );
    if let Err(err) = started {
        // A live namesake belongs to somebody else, leave it alone
        if !FrameworkError::is_already_exists(&err) {
            error!("pod {ns_name} never started, cleaning up");
            if let Err(cleanup_err) = f.delete_pod(&opts.pod_name, &opts.namespace).await {
                warn!("could not clean up pod {ns_name}: {cleanup_err}");
            }
        }
        return Err(err);
    }

    let fetched = f.get_pod(&opts.pod_name, &opts.namespace).await?;
    info!("pod {ns_name} is in phase {:?}", fetched.phase());

    let pods = f.get_pod_list(&ListOptions::in_namespace(&opts.namespace)).await?;
    ensure!(
        pods.iter().any(|p| p.name_any() == opts.pod_name),
        "pod {ns_name} missing from list of {} pods in {}",
        pods.len(),
        opts.namespace,
    );

    f.delete_pod_until_finish(&opts.pod_name, &opts.namespace, f.config().resource_delete_timeout())
        .await?;
    info!("smoke cycle for {ns_name} passed");
    Ok(())
}

#[instrument(ret, err)]
async fn run(opts: Options) -> EmptyResult {
    let config = load_config(&opts)?;
    if let Some(cluster) = &config.cluster_name {
        info!("running against cluster {cluster}");
    }

    let f = Framework::new(config).await?;
    run_cycle(&f, &opts).await
}

#[tokio::main]
async fn main() {
    let args = Options::parse();
    logging::setup(&args.verbosity);
    if let Err(err) = run(args).await {
        error!("smoke test failed: {err:?}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests;
