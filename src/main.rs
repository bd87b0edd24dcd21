use anyhow::{Context, Result};
use pipeline_panel::backend::rest::{PanelApi, PanelRest};
use pipeline_panel::backend::ws::{ChannelHandle, PipelineChannel};
use pipeline_panel::config::Config;
use pipeline_panel::controller;
use pipeline_panel::tui::{self, state::PanelState, TuiCommand};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load saved settings from .env (real env vars take precedence)
    Config::load_env_file();
    let config = Config::load_or_default(Path::new("config.toml"))?;

    let log_file = std::fs::File::create(&config.logging.file)
        .with_context(|| format!("Failed to create log file: {}", config.logging.file))?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(log_file)
        .with_ansi(false)
        .init();

    println!();
    println!("  Horizonte Inmobiliaria - Panel de Datos v0.1.0");
    println!("  ==============================================");
    println!("  Backend: {}", config.backend.base_url);
    println!();

    tracing::info!(backend = %config.backend.base_url, "panel starting");

    let api: Arc<dyn PanelApi> = Arc::new(PanelRest::new(
        &config.backend.base_url,
        config.backend.request_timeout(),
    )?);

    // Channels
    let (state_tx, state_rx) = watch::channel(PanelState::new());
    let (cmd_tx, cmd_rx) = mpsc::channel::<TuiCommand>(16);
    let (events_tx, events_rx) = mpsc::channel(256);

    // --- Phase 1: startup reads ---
    controller::spawn_initial_fetches(api.clone(), state_tx.clone());

    // --- Phase 2: subscribe to the pipeline channel ---
    let channel = PipelineChannel::new(
        &config.backend.socket_url(),
        config.backend.reconnect_delay(),
    );
    let subscription = ChannelHandle::spawn(channel, events_tx);

    // --- Phase 3: controller + TUI ---
    let controller_task = tokio::spawn(controller::run_controller(
        api,
        state_tx,
        cmd_rx,
        events_rx,
        subscription.sender(),
    ));

    let result = tui::run_tui(state_rx, cmd_tx, Duration::from_millis(config.ui.tick_ms)).await;

    drop(subscription);
    if let Err(e) = controller_task.await {
        tracing::error!("controller task failed: {}", e);
    }
    tracing::info!("panel stopped");

    result
}
