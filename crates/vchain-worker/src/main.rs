//! Chained video generation binary.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vchain_client::ArkClient;
use vchain_media::{check_ffmpeg, FfmpegRunner};
use vchain_worker::{load_prompts, ChainConfig, ChainOrchestrator, RunInputs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider (required for TLS/HTTPS)
    let _ = rustls::crypto::ring::default_provider().install_default();

    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vchain=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting vchain");

    let config = ChainConfig::from_env().context("invalid chain configuration")?;
    let inputs = RunInputs::from_env().context("missing run inputs")?;
    info!("Chain config: {:?}", config);

    let prompts = load_prompts(&inputs.prompts_file).await?;
    info!(
        "Loaded {} prompts from {}",
        prompts.len(),
        inputs.prompts_file.display()
    );

    if check_ffmpeg().is_err() {
        warn!("FFmpeg not found in PATH; local frame extraction and concatenation will fail");
    }

    let client = Arc::new(ArkClient::from_env().context("cannot create generation client")?);

    // Setup signal handler: stop after the current step (or poll wait)
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal, stopping chain");
            let _ = cancel_tx.send(true);
        }
    });

    let tool = Arc::new(FfmpegRunner::new().with_cancel(cancel_rx.clone()));
    let params = config.params.clone();
    let orchestrator =
        ChainOrchestrator::new(client.clone(), client, tool, config).with_cancel(cancel_rx);

    let result = orchestrator
        .run(&prompts, inputs.initial_frame, &params)
        .await;

    println!("{}", result);
    if let Some(output) = result.final_output() {
        println!("Output: {}", output.display());
    }

    if result.failure.is_some() {
        std::process::exit(1);
    }
    Ok(())
}
