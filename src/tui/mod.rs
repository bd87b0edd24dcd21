pub mod input;
pub mod render;
pub mod state;

use crate::backend::types::RunAction;
use anyhow::Result;
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use futures_util::StreamExt;
use input::InputState;
use ratatui::prelude::*;
use state::{PanelState, SourceSlot};
use std::io::stdout;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// Commands the TUI sends to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum TuiCommand {
    Quit,
    Run(RunAction),
    SelectFile(SourceSlot, Option<PathBuf>),
    Upload,
}

/// Run the TUI. Reads state from `state_rx`, sends commands on `cmd_tx`.
pub async fn run_tui(
    state_rx: watch::Receiver<PanelState>,
    cmd_tx: mpsc::Sender<TuiCommand>,
    tick: Duration,
) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = tui_loop(&mut terminal, state_rx, cmd_tx, tick).await;

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

async fn tui_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    mut state_rx: watch::Receiver<PanelState>,
    cmd_tx: mpsc::Sender<TuiCommand>,
    tick: Duration,
) -> Result<()> {
    let mut events = EventStream::new();
    let mut ticker = tokio::time::interval(tick);
    let mut input = InputState::default();
    let mut spinner_frame: u8 = 0;

    loop {
        let state = state_rx.borrow().clone();
        terminal.draw(|f| render::draw(f, &state, &input, spinner_frame))?;

        tokio::select! {
            maybe_event = events.next() => {
                let Some(event) = maybe_event else {
                    return Ok(());
                };
                if let Event::Key(key) = event? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if let Some(cmd) = input.handle_key(key, &state) {
                        let quit = cmd == TuiCommand::Quit;
                        if cmd_tx.send(cmd).await.is_err() || quit {
                            return Ok(());
                        }
                    }
                }
            }
            changed = state_rx.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
            }
            _ = ticker.tick() => {
                spinner_frame = spinner_frame.wrapping_add(1);
            }
        }
    }
}
