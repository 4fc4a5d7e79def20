//! voxify-ai - respiratory sound classification service
//!
//! Loads the gate and fusion models once, then serves `/health`, `/filter`
//! and `/predict` over HTTP.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use voxify_ai::api::AudioRoot;
use voxify_ai::{models, AppState, DiagnosisService, Error, PipelineConfig};
use voxify_common::config::{self, ConfigOverrides};

/// Command-line arguments for voxify-ai
#[derive(Parser, Debug)]
#[command(name = "voxify-ai")]
#[command(about = "Respiratory sound classification service")]
#[command(version)]
struct Args {
    /// Config file (TOML)
    #[arg(short, long, env = "VOXIFY_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address (host:port)
    #[arg(short, long, env = "VOXIFY_BIND")]
    bind: Option<String>,

    /// Directory request paths are confined to
    #[arg(long, env = "VOXIFY_AUDIO_ROOT")]
    audio_root: Option<PathBuf>,

    /// Gate model artifact
    #[arg(long, env = "VOXIFY_GATE_MODEL")]
    gate_model: Option<PathBuf>,

    /// Fusion model artifact
    #[arg(long, env = "VOXIFY_FUSION_MODEL")]
    fusion_model: Option<PathBuf>,

    /// Log level used when RUST_LOG is unset
    #[arg(long, env = "VOXIFY_LOG_LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // The config decides the log level, so its source is logged once tracing is up
    let config_path = config::resolve_config_path(args.config.as_deref());
    let (file_config, config_source) = config::load_with_source(config_path.as_deref())
        .context("Failed to load configuration")?;
    let settings = file_config.apply_overrides(ConfigOverrides {
        bind_address: args.bind,
        audio_root: args.audio_root,
        gate_model: args.gate_model,
        fusion_model: args.fusion_model,
        log_level: args.log_level,
    });

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting voxify-ai v{}", env!("CARGO_PKG_VERSION"));
    config::log_source(&config_source);

    settings.validate().context("Invalid configuration")?;
    let pipeline = PipelineConfig::from_settings(&settings.pipeline)?;

    info!("Gate model: {}", settings.models.gate.display());
    let gate_model = models::load_gate_model(&settings.models.gate).map_err(|source| {
        Error::ModelUnavailable {
            model: "gate",
            source,
        }
    })?;

    info!("Fusion model: {}", settings.models.fusion.display());
    let fusion_model = models::load_fusion_model(&settings.models.fusion).map_err(|source| {
        Error::ModelUnavailable {
            model: "fusion",
            source,
        }
    })?;

    let audio_root = match &settings.audio_root {
        Some(dir) => AudioRoot::new(dir).context("Invalid audio_root")?,
        None => AudioRoot::unrestricted(),
    };
    match audio_root.path() {
        Some(dir) => info!("Audio root: {}", dir.display()),
        None => warn!("No audio_root configured; requests may name any readable file"),
    }

    let service = Arc::new(DiagnosisService::new(gate_model, fusion_model, pipeline)?);
    let app = voxify_ai::build_router(AppState::new(service).with_audio_root(audio_root));

    let listener = tokio::net::TcpListener::bind(&settings.bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", settings.bind_address))?;
    info!("Listening on http://{}", settings.bind_address);
    info!("Health check: http://{}/health", settings.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
