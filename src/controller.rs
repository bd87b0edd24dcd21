//! Single owner of `PanelState` mutation. Turns TUI commands into state
//! transitions and outbound calls, and applies channel events as they arrive.

use crate::backend::rest::PanelApi;
use crate::backend::types::RunAction;
use crate::backend::ws::ChannelEvent;
use crate::tui::state::{PanelState, SourceSlot};
use crate::tui::TuiCommand;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Fire the two startup reads. Each lands in its own piece of state, in
/// whatever order they complete.
pub fn spawn_initial_fetches(
    api: Arc<dyn PanelApi>,
    state_tx: watch::Sender<PanelState>,
) -> (JoinHandle<()>, JoinHandle<()>) {
    let api_exec = api.clone();
    let state_exec = state_tx.clone();
    let last_execution = tokio::spawn(async move {
        let result = api_exec.last_execution().await;
        state_exec.send_modify(|s| s.apply_last_execution(result));
    });

    let sources = tokio::spawn(async move {
        let result = api.sources().await;
        state_tx.send_modify(|s| s.apply_sources(result));
    });

    (last_execution, sources)
}

pub fn apply_channel_event(state: &mut PanelState, event: ChannelEvent) {
    match event {
        ChannelEvent::Connected => state.channel_connected = true,
        ChannelEvent::Disconnected(reason) => {
            if state.channel_connected {
                tracing::warn!(%reason, "pipeline channel lost");
            }
            state.channel_connected = false;
        }
        ChannelEvent::Status(ev) => {
            tracing::debug!(message = %ev.message, action = ?ev.action, "status");
            state.on_status(&ev);
        }
        ChannelEvent::Finished(ev) => {
            let finished = ev.action.as_deref().and_then(RunAction::from_backend);
            if finished.is_some() && finished != state.current_action {
                tracing::warn!(?finished, running = ?state.current_action, "finish for a different stage");
            }
            tracing::info!(
                action = ?finished,
                date = ?ev.last_execution_date,
                "pipeline finished"
            );
            state.on_finished(&ev);
        }
    }
}

/// Run until the TUI quits or drops its command sender.
pub async fn run_controller(
    api: Arc<dyn PanelApi>,
    state_tx: watch::Sender<PanelState>,
    mut cmd_rx: mpsc::Receiver<TuiCommand>,
    mut events_rx: mpsc::Receiver<ChannelEvent>,
    run_tx: mpsc::Sender<RunAction>,
) {
    let mut events_open = true;
    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    None | Some(TuiCommand::Quit) => return,
                    Some(TuiCommand::Run(action)) => start_run(&state_tx, &run_tx, action).await,
                    Some(TuiCommand::SelectFile(slot, path)) => select_file(&state_tx, slot, path),
                    Some(TuiCommand::Upload) => start_upload(&api, &state_tx),
                }
            }
            event = events_rx.recv(), if events_open => {
                match event {
                    Some(event) => state_tx.send_modify(|s| apply_channel_event(s, event)),
                    None => {
                        tracing::debug!("channel event stream closed");
                        events_open = false;
                    }
                }
            }
        }
    }
}

async fn start_run(
    state_tx: &watch::Sender<PanelState>,
    run_tx: &mpsc::Sender<RunAction>,
    action: RunAction,
) {
    let mut started = None;
    state_tx.send_modify(|s| started = s.start_run(action));
    let Some(action) = started else {
        tracing::debug!(?action, "run already in progress, ignoring");
        return;
    };
    tracing::info!(?action, "starting pipeline stage");
    if run_tx.send(action).await.is_err() {
        tracing::error!(?action, "pipeline channel is gone; run request dropped");
    }
}

fn select_file(state_tx: &watch::Sender<PanelState>, slot: SourceSlot, path: Option<PathBuf>) {
    match path {
        Some(path) if !path.is_file() => {
            tracing::warn!(path = %path.display(), "selected source file not found");
            state_tx.send_modify(|s| {
                s.upload_status = format!("No se encontró el archivo: {}", path.display());
            });
        }
        path => state_tx.send_modify(|s| s.select_file(slot, path)),
    }
}

fn start_upload(api: &Arc<dyn PanelApi>, state_tx: &watch::Sender<PanelState>) {
    let mut request = None;
    state_tx.send_modify(|s| request = s.begin_upload());
    let Some(request) = request else {
        return;
    };

    let api = api.clone();
    let state_tx = state_tx.clone();
    tokio::spawn(async move {
        let result = api.upload_sources(&request).await;
        state_tx.send_modify(|s| s.finish_upload(result));
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::types::{FinishedEvent, StatusEvent};

    #[test]
    fn test_connection_indicator() {
        let mut s = PanelState::new();
        apply_channel_event(&mut s, ChannelEvent::Connected);
        assert!(s.channel_connected);
        apply_channel_event(&mut s, ChannelEvent::Disconnected("eof".to_string()));
        assert!(!s.channel_connected);
    }

    #[test]
    fn test_channel_events_drive_run() {
        let mut s = PanelState::new();
        s.start_run(RunAction::Full);
        apply_channel_event(
            &mut s,
            ChannelEvent::Status(StatusEvent {
                message: "Renombrando columnas...".to_string(),
                action: Some("all".to_string()),
            }),
        );
        assert_eq!(s.progress, 18);
        apply_channel_event(
            &mut s,
            ChannelEvent::Finished(FinishedEvent {
                last_execution_date: Some("01/02/2025, 09:00:00".to_string()),
                ..Default::default()
            }),
        );
        assert_eq!(s.progress, 100);
        assert_eq!(s.last_execution.display(), "01/02/2025, 09:00:00");
    }
}
