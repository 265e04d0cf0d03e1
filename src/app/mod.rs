use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc;

use anyhow::Result;

use crate::adb::AdbBackend;
use crate::app::constants::{DEFAULT_REMOTE_ROOT, LOG_NO_LOGS_MESSAGE, STATUS_READY};
use crate::app::logging::{log_path, prune_log_file};
use crate::model::{
    ConnectionStatus, DeleteRequest, DiskUsage, Entry, Mode, Notice, PaneState, PendingTransfer,
    RunningTransfer, Side, TransferDirection, TransferPlan, TransferUpdate,
};
use crate::transfer::CancelFlag;

pub(crate) mod constants;
mod connections;
mod delete;
mod handlers;
mod listing;
mod logging;
mod navigation;
mod transfer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HeaderMode {
    Help,
    Logs,
    Off,
}

pub(crate) struct App {
    pub(crate) backend: Arc<dyn AdbBackend>,
    pub(crate) log_path: PathBuf,
    pub(crate) last_log: String,
    pub(crate) log_lines: VecDeque<String>,
    pub(crate) status: String,
    pub(crate) header_mode: HeaderMode,
    pub(crate) connection: ConnectionStatus,
    pub(crate) active_side: Side,
    pub(crate) local_cwd: PathBuf,
    pub(crate) remote_cwd: String,
    pub(crate) local_pane: PaneState,
    pub(crate) remote_pane: PaneState,
    pub(crate) disk_usage: Option<DiskUsage>,
    pub(crate) mode: Mode,
    pub(crate) notice: Option<Notice>,
    pub(crate) delete_request: Option<DeleteRequest>,
    pub(crate) pending_transfer: Option<PendingTransfer>,
    pub(crate) running_transfer: Option<RunningTransfer>,
    // In-flight background work; each receiver is drained by a poll_* method
    // on the foreground thread.
    pub(crate) connection_rx: Option<mpsc::Receiver<ConnectionStatus>>,
    pub(crate) remote_fetch: Option<mpsc::Receiver<(String, Result<Vec<Entry>>)>>,
    pub(crate) usage_rx: Option<mpsc::Receiver<(String, Result<Option<DiskUsage>>)>>,
    pub(crate) plan_rx: Option<mpsc::Receiver<Result<TransferPlan>>>,
    pub(crate) planning_direction: Option<TransferDirection>,
    pub(crate) transfer_rx: Option<mpsc::Receiver<TransferUpdate>>,
    pub(crate) transfer_cancel: Option<CancelFlag>,
    pub(crate) delete_rx: Option<mpsc::Receiver<(Side, usize, Option<String>)>>,
}

impl App {
    pub(crate) fn new(backend: Arc<dyn AdbBackend>) -> Result<Self> {
        let log_path = log_path()?;
        prune_log_file(&log_path);
        let local_cwd = std::env::current_dir()
            .ok()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("/"));
        let mut app = Self {
            backend,
            log_path,
            last_log: String::from(LOG_NO_LOGS_MESSAGE),
            log_lines: VecDeque::new(),
            status: STATUS_READY.to_string(),
            header_mode: HeaderMode::Help,
            connection: ConnectionStatus::Checking,
            active_side: Side::Local,
            local_cwd,
            remote_cwd: DEFAULT_REMOTE_ROOT.to_string(),
            local_pane: PaneState::default(),
            remote_pane: PaneState::default(),
            disk_usage: None,
            mode: Mode::Normal,
            notice: None,
            delete_request: None,
            pending_transfer: None,
            running_transfer: None,
            connection_rx: None,
            remote_fetch: None,
            usage_rx: None,
            plan_rx: None,
            planning_direction: None,
            transfer_rx: None,
            transfer_cancel: None,
            delete_rx: None,
        };
        app.refresh_local();
        app.check_connection();
        Ok(app)
    }

    pub(crate) fn active_pane(&self) -> &PaneState {
        match self.active_side {
            Side::Local => &self.local_pane,
            Side::Remote => &self.remote_pane,
        }
    }

    pub(crate) fn active_pane_mut(&mut self) -> &mut PaneState {
        match self.active_side {
            Side::Local => &mut self.local_pane,
            Side::Remote => &mut self.remote_pane,
        }
    }

    pub(crate) fn transfer_busy(&self) -> bool {
        self.running_transfer.is_some() || self.plan_rx.is_some()
    }

    #[cfg(test)]
    pub(crate) fn for_test(backend: Arc<dyn AdbBackend>) -> Self {
        let mut base = std::env::temp_dir();
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        base.push(format!("adbfm-test-{nanos}.log"));
        Self {
            backend,
            log_path: base,
            last_log: String::from(LOG_NO_LOGS_MESSAGE),
            log_lines: VecDeque::new(),
            status: STATUS_READY.to_string(),
            header_mode: HeaderMode::Help,
            connection: ConnectionStatus::Checking,
            active_side: Side::Local,
            local_cwd: std::env::temp_dir(),
            remote_cwd: DEFAULT_REMOTE_ROOT.to_string(),
            local_pane: PaneState::default(),
            remote_pane: PaneState::default(),
            disk_usage: None,
            mode: Mode::Normal,
            notice: None,
            delete_request: None,
            pending_transfer: None,
            running_transfer: None,
            connection_rx: None,
            remote_fetch: None,
            usage_rx: None,
            plan_rx: None,
            planning_direction: None,
            transfer_rx: None,
            transfer_cancel: None,
            delete_rx: None,
        }
    }
}
