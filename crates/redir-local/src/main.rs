//! redir-local: location filter in front of a remote location manager.
//!
//! Forwards every locate to the manager and, when client and chosen data
//! server share a private network, hands the client a local path instead.

mod address;
mod attributes;
mod config;
mod directive;
mod finder;
mod flags;
mod locate;
mod mapper;
mod policy;
mod server;
mod stats;

use std::time::Duration;

use config::ServiceConfig;
use finder::http::HttpFinder;
use locate::RedirectDecider;
use mapper::LocalRootMapper;
use policy::SharedPolicy;
use server::AppState;
use stats::DecisionStats;

fn main() -> anyhow::Result<()> {
    let config_path = {
        let args: Vec<String> = std::env::args().collect();
        args.iter()
            .position(|a| a == "--config")
            .and_then(|i| args.get(i + 1).cloned())
            .or_else(|| args.get(1).filter(|a| !a.starts_with('-')).cloned())
            .or_else(|| std::env::var("REDIR_LOCAL_CONFIG").ok())
            .unwrap_or_else(|| "redir-local.toml".to_string())
    };

    let config = ServiceConfig::load(&config_path)?;

    // The tonic OTLP exporter needs a reactor, so the runtime comes first.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let tracing_guard = redir_tracing::init_tracing(&config.tracing);

        tracing::info!(
            config_path = %config_path,
            listen_address = %config.server.listen_address,
            manager_url = %config.finder.manager_url,
            directive_file = %config.policy.directive_file.display(),
            otlp_export = tracing_guard.exporting(),
            "Starting redir-local"
        );

        run(config).await
    })
}

async fn run(config: ServiceConfig) -> anyhow::Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.finder.timeout_secs))
        .build()?;
    let finder = HttpFinder::new(client, &config.finder.manager_url)?;

    let mapper = LocalRootMapper::load(&config.policy.directive_file);
    tracing::info!(
        manager = %finder.base_url(),
        local_root = mapper.local_root().unwrap_or("<none>"),
        resolve_hostnames = config.policy.resolve_hostnames,
        "Path translation ready"
    );

    let decider = RedirectDecider::new(finder, mapper, DecisionStats::new())
        .with_hostname_resolution(config.policy.resolve_hostnames);
    let policy = decider.configure(&config.policy.directive_file).await;

    let state = AppState {
        config,
        decider,
        policy: SharedPolicy::new(policy),
    };

    server::run(state).await
}
