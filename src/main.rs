use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use image_previewer::{
    config::{
        Config, LoggingConfig,
        defaults::{CONFIG_PATH_ENV, DEFAULT_CONFIG_FILE},
    },
    services::{ArtifactStorage, FillTransform, HttpImageSource, PreviewService},
    web::{AppState, WebServer, shutdown_signal},
};

#[derive(Parser)]
#[command(name = "image-previewer")]
#[command(version)]
#[command(about = "On-demand image resizing proxy with an LRU artifact cache")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = CONFIG_PATH_ENV, default_value = DEFAULT_CONFIG_FILE)]
    config: String,

    /// Listening IP address
    #[arg(short = 'H', long, value_name = "IP")]
    host: Option<String>,

    /// Listening port
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Log level (overrides config file)
    #[arg(short = 'v', long)]
    log_level: Option<String>,
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if logging.level == "trace" {
            format!("image_previewer={},tower_http=trace", logging.level).into()
        } else {
            format!("image_previewer={}", logging.level).into()
        }
    });

    let registry = tracing_subscriber::registry().with(filter);
    if logging.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load_from_file(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config))?;
    if let Some(host) = cli.host {
        config.web.host = host;
    }
    if let Some(port) = cli.port {
        config.web.port = port;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    init_logging(&config.logging);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config_file = %cli.config,
        cache_capacity = config.cache.capacity,
        coalesce_requests = config.cache.coalesce_requests,
        request_timeout = %humantime::format_duration(config.web.request_timeout),
        "Starting image previewer"
    );

    let storage = ArtifactStorage::new(&config.storage.artifact_path);
    storage.ensure_root().await.with_context(|| {
        format!(
            "Failed to create storage directory {}",
            config.storage.artifact_path.display()
        )
    })?;
    info!(path = %storage.root().display(), "Artifact storage ready");

    let source = Arc::new(HttpImageSource::from_config(&config)?);
    let transform = Arc::new(FillTransform::default());
    let preview_service = Arc::new(PreviewService::new(&config, source, transform)?);

    let config = Arc::new(config);
    let web_server = WebServer::new(AppState::new(Arc::clone(&config), preview_service))?;
    info!("Starting web server on {}", web_server.addr());

    let cancellation_token = CancellationToken::new();
    let (server_ready_tx, server_ready_rx) = tokio::sync::oneshot::channel();

    let server_token = cancellation_token.clone();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = web_server
            .serve_with_cancellation(server_ready_tx, server_token)
            .await
        {
            error!("Web server failed: {}", e);
        }
    });

    match server_ready_rx.await {
        Ok(Ok(addr)) => info!(address = %addr, "Web server is now listening"),
        Ok(Err(bind_error)) => {
            error!("Failed to bind web server: {}", bind_error);
            return Err(bind_error);
        }
        Err(_) => {
            error!("Web server task completed without signaling");
            return Err(anyhow::anyhow!("Web server failed to start"));
        }
    }

    shutdown_signal().await;
    cancellation_token.cancel();

    if let Err(e) = server_handle.await {
        error!("Web server task panicked: {}", e);
    }

    info!("Image previewer stopped");
    Ok(())
}
