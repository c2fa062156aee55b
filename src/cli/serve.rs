//! Serve command implementation

use crate::cli::ServeArgs;
use crate::config::DispatchConfig;
use crate::engine::DispositionEngine;
use crate::logging::init_tracing;
use crate::roster::Roster;
use crate::store::InMemoryStore;
use crate::sweep::RequeueSweeper;
use crate::telemetry;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Load configuration with CLI overrides
pub fn load_config_with_overrides(
    args: &ServeArgs,
) -> Result<DispatchConfig, Box<dyn std::error::Error>> {
    // Load from file if it exists, otherwise use defaults
    let mut config = if args.config.exists() {
        DispatchConfig::load(Some(&args.config))?
    } else {
        tracing::debug!("Config file not found, using defaults");
        DispatchConfig::default()
    };

    config = config.with_env_overrides();

    // CLI overrides (highest priority)
    if let Some(ref log_level) = args.log_level {
        config.logging.level = log_level.clone();
    }
    if let Some(interval) = args.sweep_interval {
        config.sweep.interval_seconds = interval;
    }
    if args.no_sweep {
        config.sweep.enabled = false;
    }
    if args.metrics {
        config.metrics.enabled = true;
    }

    Ok(config)
}

/// Seed a roster from the `[[callers]]` section
pub fn build_roster(config: &DispatchConfig) -> Result<Arc<Roster>, Box<dyn std::error::Error>> {
    let roster = Arc::new(Roster::new());
    for caller_config in &config.callers {
        roster.add_caller(caller_config.to_caller())?;
        tracing::info!(
            caller_id = %caller_config.id,
            active = caller_config.active,
            "Loaded caller from config"
        );
    }
    Ok(roster)
}

/// Build an in-memory engine over `roster` and register the configured sources
pub fn build_engine(
    config: &DispatchConfig,
    roster: Arc<Roster>,
) -> Result<Arc<DispositionEngine>, Box<dyn std::error::Error>> {
    let graph = config.transition_graph()?;
    let engine = Arc::new(DispositionEngine::new(
        Arc::new(InMemoryStore::new()),
        roster,
        graph,
        config.allocation.clone(),
    ));
    for source_config in &config.sources {
        engine.register_source(source_config.build());
    }
    Ok(engine)
}

/// Wait for shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for CTRL+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
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
    }

    cancel_token.cancel();
}

/// Main serve command handler
pub async fn run_serve(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load and merge configuration
    let config = load_config_with_overrides(&args)?;
    config.validate()?;

    // 2. Initialize tracing and metrics
    init_tracing(&config.logging)?;

    tracing::info!("Starting dispatch engine");
    tracing::debug!(?config, "Loaded configuration");

    if config.metrics.enabled {
        telemetry::install_exporter(&config.metrics)?;
        tracing::info!(listen = %config.metrics.listen, "Prometheus exporter listening");
    }

    // 3. Callers, store and sources
    let roster = build_roster(&config)?;
    let engine = build_engine(&config, roster)?;
    tracing::info!(
        callers = config.callers.len(),
        sources = ?engine.source_ids(),
        "Engine ready"
    );

    // 4. Start the sweep (if enabled)
    let cancel_token = CancellationToken::new();
    let sweep_handle = if config.sweep.enabled {
        tracing::info!(
            interval_seconds = config.sweep.interval_seconds,
            "Starting requeue sweep"
        );
        let sweeper = RequeueSweeper::new(Arc::clone(&engine), config.sweep.clone());
        Some(sweeper.start(cancel_token.clone()))
    } else {
        tracing::info!("Requeue sweep disabled");
        None
    };

    // 5. Run until interrupted
    shutdown_signal(cancel_token.clone()).await;

    // 6. Cleanup
    if let Some(handle) = sweep_handle {
        tracing::info!("Waiting for requeue sweep to stop");
        handle.await?;
    }

    tracing::info!("Dispatch engine stopped");
    Ok(())
}
