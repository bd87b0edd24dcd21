use super::state::{PanelState, SourceSlot};
use super::TuiCommand;
use crate::backend::types::RunAction;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::path::PathBuf;

const PAGE: usize = 10;

/// Terminal-local state that never leaves the TUI task.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    /// Slot whose path is being typed, if any.
    pub editing: Option<SourceSlot>,
    pub edit_buffer: String,
    /// Lines scrolled back from the tail of the activity log; 0 follows it.
    pub log_scroll_back: usize,
}

impl InputState {
    pub fn handle_key(&mut self, key: KeyEvent, state: &PanelState) -> Option<TuiCommand> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(TuiCommand::Quit);
        }
        if let Some(slot) = self.editing {
            return self.handle_edit_key(slot, key);
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Some(TuiCommand::Quit),
            KeyCode::Char('l') => Some(TuiCommand::Run(RunAction::Clean)),
            KeyCode::Char('c') => Some(TuiCommand::Run(RunAction::Convert)),
            KeyCode::Char('f') => Some(TuiCommand::Run(RunAction::Full)),
            KeyCode::Char('u') => Some(TuiCommand::Upload),
            KeyCode::Char('t') => {
                self.begin_edit(SourceSlot::Training, state);
                None
            }
            KeyCode::Char('d') => {
                self.begin_edit(SourceSlot::Dolar, state);
                None
            }
            KeyCode::Up => {
                self.scroll_back(1, state);
                None
            }
            KeyCode::Down => {
                self.log_scroll_back = self.log_scroll_back.saturating_sub(1);
                None
            }
            KeyCode::PageUp => {
                self.scroll_back(PAGE, state);
                None
            }
            KeyCode::PageDown => {
                self.log_scroll_back = self.log_scroll_back.saturating_sub(PAGE);
                None
            }
            KeyCode::End => {
                self.log_scroll_back = 0;
                None
            }
            _ => None,
        }
    }

    /// Never scrolls past the oldest log line.
    fn scroll_back(&mut self, lines: usize, state: &PanelState) {
        let oldest = state.status_log.len().saturating_sub(1);
        self.log_scroll_back = (self.log_scroll_back + lines).min(oldest);
    }

    fn begin_edit(&mut self, slot: SourceSlot, state: &PanelState) {
        self.editing = Some(slot);
        self.edit_buffer = state
            .selected_file(slot)
            .map(|p| p.display().to_string())
            .unwrap_or_default();
    }

    fn handle_edit_key(&mut self, slot: SourceSlot, key: KeyEvent) -> Option<TuiCommand> {
        match key.code {
            KeyCode::Enter => {
                self.editing = None;
                let raw = std::mem::take(&mut self.edit_buffer);
                let trimmed = raw.trim().trim_matches('"');
                let path = (!trimmed.is_empty()).then(|| PathBuf::from(trimmed));
                Some(TuiCommand::SelectFile(slot, path))
            }
            KeyCode::Esc => {
                self.editing = None;
                self.edit_buffer.clear();
                None
            }
            KeyCode::Backspace => {
                self.edit_buffer.pop();
                None
            }
            KeyCode::Char(c) => {
                self.edit_buffer.push(c);
                None
            }
            _ => None,
        }
    }
}
