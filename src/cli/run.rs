//! Run command implementation

use crate::api::{create_router, serve, AppState};
use crate::cli::{ConfigSourceArgs, RunArgs, DEFAULT_CONFIG_PATH};
use crate::config::{ConfigError, KeepaliveConfig, LogFormat};
use crate::scheduler::Scheduler;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Load configuration with environment and CLI overrides
///
/// An explicitly named file must exist; the default file is optional.
pub fn load_config_with_overrides(args: &ConfigSourceArgs) -> Result<KeepaliveConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => KeepaliveConfig::load(Some(path))?,
        None => {
            let default = Path::new(DEFAULT_CONFIG_PATH);
            if default.exists() {
                KeepaliveConfig::load(Some(default))?
            } else {
                KeepaliveConfig::default()
            }
        }
    };

    config = config.with_env_overrides()?;

    if !args.targets.is_empty() {
        config.ping.targets = args.targets.clone();
    }
    if let Some(interval) = args.interval {
        config.ping.interval_seconds = interval;
    }
    if let Some(ref log_level) = args.log_level {
        config.logging.level = log_level.clone();
    }

    Ok(config)
}

/// Initialize tracing based on configuration
pub fn init_tracing(config: &crate::config::LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter_str = crate::logging::build_filter_directives(config);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    match config.format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()?;
        }
    }

    Ok(())
}

/// Install the global Prometheus recorder, if none is installed yet.
fn install_metrics_recorder() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "Metrics recorder unavailable, /metrics will be empty");
            None
        }
    }
}

/// Wait for shutdown signal (SIGINT or SIGTERM)
pub async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
        _ = cancel_token.cancelled() => {}
    }

    cancel_token.cancel();
}

/// Main run command handler
pub async fn run_pinger(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load, merge and validate configuration
    let mut config = load_config_with_overrides(&args.source)?;
    if let Some(port) = args.health_port {
        config.health.port = port;
    }
    if args.no_health {
        config.health.enabled = false;
    }
    config.validate()?;

    // 2. Initialize tracing
    init_tracing(&config.logging)?;
    tracing::debug!(?config, "Loaded configuration");

    // 3. Bind the health endpoint before pinging so a bad port fails fast
    let cancel_token = CancellationToken::new();
    let server_handle = if config.health.enabled {
        let addr = config.health.bind_addr();
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        let state = Arc::new(AppState::new(install_metrics_recorder()));
        tracing::info!(addr = %addr, "Health endpoint listening");
        Some(tokio::spawn(serve(
            listener,
            create_router(state),
            cancel_token.clone(),
        )))
    } else {
        tracing::info!("Health endpoint disabled");
        None
    };

    // 4. Start the scheduler
    let scheduler = Scheduler::from_config(config.ping.clone())?;
    let state = scheduler.state();
    let scheduler_handle = scheduler.start(cancel_token.clone());

    // 5. Wait for a signal
    shutdown_signal(cancel_token.clone()).await;

    // 6. Drain
    scheduler_handle.await?;
    if let Some(handle) = server_handle {
        handle.await??;
    }

    tracing::info!(in_flight = state.in_flight(), "Pinger stopped");
    Ok(())
}
