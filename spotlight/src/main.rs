mod config;

use clap::{Args, Parser};
use config::{Config, ConfigError, LogFormat, LoggingConfig, MetricsConfig};
use dashboard_router::DashboardError;
use dashboard_router::config::ValidationError;
use metrics_exporter_statsd::StatsdBuilder;
use std::path::PathBuf;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const METRICS_PREFIX: &str = "spotlight";

#[derive(Parser)]
#[command(name = "spotlight", about = "Performance platform dashboard pages")]
enum CliCommand {
    /// Serve dashboard pages
    Serve(ConfigArgs),
    /// Parse and validate a config file, then exit
    Validate(ConfigArgs),
}

#[derive(Args)]
struct ConfigArgs {
    #[arg(long)]
    config_file_path: PathBuf,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid config: {0}")]
    Validation(#[from] ValidationError),
    #[error("could not initialize logging: {0}")]
    Logging(#[from] TryInitError),
    #[error("could not initialize metrics: {0}")]
    Metrics(String),
    #[error("could not start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error(transparent)]
    Service(#[from] DashboardError),
}

fn main() -> Result<(), CliError> {
    match CliCommand::parse() {
        CliCommand::Serve(args) => serve(load_config(&args)?),
        CliCommand::Validate(args) => {
            let config = load_config(&args)?;
            let dashboards = &config.dashboards;
            println!("Config OK");
            println!(
                "  listener:       {}:{}",
                dashboards.listener.host, dashboards.listener.port
            );
            println!(
                "  admin listener: {}:{}",
                dashboards.admin_listener.host, dashboards.admin_listener.port
            );
            println!("  config api:     {}", dashboards.config_api.url);
            println!("  data api:       {}", dashboards.data_api.url);
            println!(
                "  workers:        {} (queue {}, timeout {}s)",
                dashboards.workers.size,
                dashboards.workers.queue_capacity,
                dashboards.workers.job_timeout_secs
            );
            Ok(())
        }
    }
}

fn load_config(args: &ConfigArgs) -> Result<Config, CliError> {
    let config = Config::from_file(&args.config_file_path)?;
    config.dashboards.validate()?;
    Ok(config)
}

fn serve(config: Config) -> Result<(), CliError> {
    let logging = config.logging.unwrap_or_default();

    // Must outlive the runtime so buffered events are flushed on exit
    let _sentry_guard = logging.sentry_dsn.as_deref().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    init_logging(&logging)?;

    if let Some(metrics_config) = &config.metrics {
        init_statsd_recorder(metrics_config)?;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    tracing::info!("Starting spotlight");
    runtime.block_on(dashboard_router::run(config.dashboards))?;
    Ok(())
}

fn init_logging(logging: &LoggingConfig) -> Result<(), TryInitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let json = logging.format == LogFormat::Json;

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(|| fmt::layer()))
        .with(
            logging
                .sentry_dsn
                .is_some()
                .then(|| sentry::integrations::tracing::layer()),
        )
        .try_init()
}

fn init_statsd_recorder(config: &MetricsConfig) -> Result<(), CliError> {
    let recorder = StatsdBuilder::from(config.statsd_host.clone(), config.statsd_port)
        .build(Some(METRICS_PREFIX))
        .map_err(|e| CliError::Metrics(e.to_string()))?;

    metrics::set_global_recorder(recorder)
        .map_err(|_| CliError::Metrics("a metrics recorder is already installed".into()))
}
