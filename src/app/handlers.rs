//! Keyboard dispatch. Returns `true` when the app should exit.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, HeaderMode};
use crate::model::{Mode, TransferDirection};

impl App {
    pub(crate) fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Ok(true);
        }
        if self.notice.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q')) {
                self.notice = None;
            }
            return Ok(false);
        }
        match self.mode {
            Mode::ConfirmDelete => {
                match key.code {
                    KeyCode::Char('y') | KeyCode::Enter => self.confirm_delete(),
                    KeyCode::Char('n') | KeyCode::Esc => self.dismiss_delete_request(),
                    _ => {}
                }
                Ok(false)
            }
            Mode::ConfirmTransfer => {
                match key.code {
                    KeyCode::Char('y') | KeyCode::Enter => self.confirm_transfer(),
                    KeyCode::Char('n') | KeyCode::Esc => self.dismiss_pending_transfer(),
                    _ => {}
                }
                Ok(false)
            }
            Mode::Normal => self.handle_normal_key(key),
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Tab | KeyCode::BackTab => {
                self.active_side = self.active_side.other();
            }
            KeyCode::Up | KeyCode::Char('k') => {
                let pane = self.active_pane_mut();
                pane.selected = pane.selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let pane = self.active_pane_mut();
                if pane.selected + 1 < pane.entries.len() {
                    pane.selected += 1;
                }
            }
            KeyCode::Enter | KeyCode::Right => {
                let side = self.active_side;
                let target = self
                    .active_pane()
                    .entries
                    .get(self.active_pane().selected)
                    .filter(|entry| entry.is_dir())
                    .map(|entry| entry.name.clone());
                if let Some(name) = target {
                    self.enter(side, &name);
                }
            }
            KeyCode::Backspace | KeyCode::Left | KeyCode::Char('h') => {
                self.up(self.active_side);
            }
            KeyCode::Char('~') => self.home(self.active_side),
            KeyCode::Char(' ') => self.active_pane_mut().toggle_mark(),
            KeyCode::Char('r') => self.refresh_side(self.active_side),
            KeyCode::Char('R') => self.check_connection(),
            KeyCode::Char('p') => self.start_transfer(TransferDirection::Push),
            KeyCode::Char('l') => self.start_transfer(TransferDirection::Pull),
            KeyCode::Char('x') => self.request_delete(),
            KeyCode::Char('c') => self.cancel_transfer(),
            KeyCode::Char('v') => self.cycle_header_mode(),
            _ => {}
        }
        Ok(false)
    }

    pub(crate) fn cycle_header_mode(&mut self) {
        self.header_mode = match self.header_mode {
            HeaderMode::Help => HeaderMode::Logs,
            HeaderMode::Logs => HeaderMode::Off,
            HeaderMode::Off => HeaderMode::Help,
        };
    }
}
