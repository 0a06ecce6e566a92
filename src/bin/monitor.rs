use clap::Parser;
use endpoint_monitor::{
    Monitor,
    actors::messages::StartOutcome,
    config::{Config, read_config_file},
};
use tracing::{debug, info, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file, falls back to environment variables when absent
    #[arg(short)]
    file: Option<String>,
}

fn init() {
    let filter = filter::Targets::new().with_targets(vec![
        ("endpoint_monitor", LevelFilter::DEBUG),
        ("tower_http", LevelFilter::INFO),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let config = match &args.file {
        Some(path) => read_config_file(path)?,
        None => Config::from_env(),
    };

    let monitor = Monitor::from_config(&config)?;

    match monitor.start().await? {
        StartOutcome::Started(report) => info!(
            "initial sweep: {} checked, {} healthy, {} unhealthy",
            report.checked, report.healthy, report.unhealthy
        ),
        StartOutcome::AlreadyRunning => debug!("scheduler was already running"),
    }

    serve_api(&config, &monitor).await?;

    tokio::signal::ctrl_c().await?;
    info!("received Ctrl-C, shutting down");

    monitor.shutdown().await
}

#[cfg(feature = "api")]
async fn serve_api(config: &Config, monitor: &Monitor) -> anyhow::Result<()> {
    use endpoint_monitor::api::{ApiState, spawn_api_server};

    if let Some(api) = &config.api {
        spawn_api_server(api.clone(), ApiState::from(monitor)).await?;
    }
    Ok(())
}

#[cfg(not(feature = "api"))]
async fn serve_api(config: &Config, _monitor: &Monitor) -> anyhow::Result<()> {
    if config.api.is_some() {
        tracing::warn!("api configured but this build has no api feature");
    }
    Ok(())
}
