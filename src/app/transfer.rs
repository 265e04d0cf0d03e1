//! Transfer orchestration: planning on a worker thread, one session thread
//! per confirmed transfer, progress drained by the foreground loop.

use std::sync::mpsc;
use std::time::Instant;

use crate::app::App;
use crate::app::constants::{NOTICE_NOT_CONNECTED_MESSAGE, NOTICE_NOT_CONNECTED_TITLE};
use crate::model::{
    Mode, Notice, PendingTransfer, RunningTransfer, SessionOutcome, Side, TransferDirection,
    TransferUpdate,
};
use crate::plan::{plan_pull, plan_push};
use crate::transfer::{CancelFlag, run_session};

impl App {
    /// Kicks off planning for a push (local selection) or pull (remote
    /// selection). The subtree walk can be slow, so it runs off-thread.
    pub(crate) fn start_transfer(&mut self, direction: TransferDirection) {
        if self.transfer_busy() {
            self.set_status("A transfer is already in progress");
            return;
        }
        if !self.connection.is_connected() {
            self.notice = Some(Notice {
                title: NOTICE_NOT_CONNECTED_TITLE.to_string(),
                message: NOTICE_NOT_CONNECTED_MESSAGE.to_string(),
            });
            return;
        }
        let selection = match direction {
            TransferDirection::Push => self.local_pane.selection(),
            TransferDirection::Pull => self.remote_pane.selection(),
        };
        if selection.is_empty() {
            self.set_status("Nothing selected");
            return;
        }
        let local_cwd = self.local_cwd.clone();
        let remote_cwd = self.remote_cwd.clone();
        let backend = self.backend.clone();
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let result = match direction {
                TransferDirection::Push => plan_push(&selection, &local_cwd),
                TransferDirection::Pull => plan_pull(&selection, &remote_cwd, backend.as_ref()),
            };
            let _ = tx.send(result);
        });
        self.plan_rx = Some(rx);
        self.planning_direction = Some(direction);
        self.set_status(format!("{}: planning...", direction.label()));
    }

    pub(crate) fn poll_plan(&mut self) {
        let Some(rx) = &self.plan_rx else {
            return;
        };
        let Ok(result) = rx.try_recv() else {
            return;
        };
        self.plan_rx = None;
        let Some(direction) = self.planning_direction.take() else {
            return;
        };
        match result {
            Ok(plan) if plan.items.is_empty() => {
                self.set_status("Nothing to transfer");
            }
            Ok(plan) => {
                self.pending_transfer = Some(PendingTransfer { direction, plan });
                self.mode = Mode::ConfirmTransfer;
            }
            Err(err) => {
                self.notice = Some(Notice {
                    title: format!("{} failed", direction.label()),
                    message: format!("Planning failed: {err:#}"),
                });
                self.set_status(format!("{} planning failed", direction.label()));
            }
        }
    }

    pub(crate) fn confirm_transfer(&mut self) {
        let Some(pending) = self.pending_transfer.take() else {
            return;
        };
        self.mode = Mode::Normal;
        let dest_root = match pending.direction {
            TransferDirection::Push => self.remote_cwd.clone(),
            TransferDirection::Pull => self.local_cwd.to_string_lossy().into_owned(),
        };
        let cancel = CancelFlag::new();
        let (tx, rx) = mpsc::channel();
        let backend = self.backend.clone();
        let plan = pending.plan.clone();
        let direction = pending.direction;
        let worker_cancel = cancel.clone();
        std::thread::spawn(move || {
            let outcome = run_session(
                &plan,
                direction,
                &dest_root,
                backend.as_ref(),
                &tx,
                &worker_cancel,
            );
            let _ = tx.send(TransferUpdate::Done(outcome));
        });
        self.running_transfer = Some(RunningTransfer {
            direction: pending.direction,
            total_bytes: pending.plan.total_bytes,
            item_count: pending.plan.items.len(),
            fraction: 0.0,
            bytes_done: 0,
            throughput: None,
            eta_secs: None,
            current_item: String::new(),
            started: Instant::now(),
        });
        self.transfer_rx = Some(rx);
        self.transfer_cancel = Some(cancel);
        self.set_status(format!(
            "{}: {} items, {} bytes",
            pending.direction.label(),
            pending.plan.items.len(),
            pending.plan.total_bytes
        ));
    }

    pub(crate) fn dismiss_pending_transfer(&mut self) {
        self.pending_transfer = None;
        self.mode = Mode::Normal;
        self.set_status("Transfer cancelled before start");
    }

    pub(crate) fn cancel_transfer(&mut self) {
        if let Some(cancel) = &self.transfer_cancel {
            cancel.cancel();
            self.set_status("Cancelling transfer...");
        }
    }

    pub(crate) fn poll_transfer_progress(&mut self) {
        let Some(rx) = self.transfer_rx.take() else {
            return;
        };
        let mut done = false;
        while let Ok(update) = rx.try_recv() {
            match update {
                TransferUpdate::Progress {
                    fraction,
                    bytes_done,
                    throughput,
                    eta_secs,
                    current_item,
                } => {
                    if let Some(running) = &mut self.running_transfer {
                        running.fraction = fraction;
                        running.bytes_done = bytes_done;
                        running.throughput = throughput;
                        running.eta_secs = eta_secs;
                        running.current_item = current_item;
                    }
                }
                TransferUpdate::Done(outcome) => {
                    self.finish_transfer(outcome);
                    done = true;
                }
            }
        }
        if !done {
            self.transfer_rx = Some(rx);
        }
    }

    fn finish_transfer(&mut self, outcome: SessionOutcome) {
        let direction = self
            .running_transfer
            .as_ref()
            .map(|running| running.direction);
        self.running_transfer = None;
        self.transfer_cancel = None;
        let Some(direction) = direction else {
            return;
        };
        let dest_side = match direction {
            TransferDirection::Push => Side::Remote,
            TransferDirection::Pull => Side::Local,
        };
        match outcome {
            SessionOutcome::Completed => {
                self.notice = Some(Notice {
                    title: format!("{} complete", direction.label()),
                    message: "All items transferred".to_string(),
                });
                self.set_status(format!("{} complete", direction.label()));
            }
            SessionOutcome::Failed(message) => {
                self.notice = Some(Notice {
                    title: format!("{} failed", direction.label()),
                    message: message.clone(),
                });
                self.set_status(format!("{} failed: {message}", direction.label()));
            }
            SessionOutcome::Cancelled => {
                self.set_status(format!("{} cancelled", direction.label()));
            }
        }
        // Completed, failed or cancelled: the destination may have changed.
        self.refresh_side(dest_side);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adb::MockAdbBackend;
    use crate::model::{ConnectionStatus, Entry, EntryKind};
    use std::sync::Arc;
    use std::time::Duration;

    fn file_entry(name: &str, size: u64) -> Entry {
        Entry {
            name: name.to_string(),
            kind: EntryKind::File,
            size_bytes: Some(size),
        }
    }

    fn pump(app: &mut App) {
        for _ in 0..200 {
            app.poll_plan();
            app.poll_transfer_progress();
            app.poll_remote_fetch();
            app.poll_usage();
            if app.plan_rx.is_none() && app.transfer_rx.is_none() {
                return;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        panic!("transfer machinery never settled");
    }

    fn connected_app(backend: Arc<MockAdbBackend>) -> App {
        let mut app = App::for_test(backend);
        app.connection = ConnectionStatus::Connected("serial".to_string());
        app
    }

    #[test]
    fn pull_flow_plans_confirms_and_completes() {
        let backend = Arc::new(MockAdbBackend::default());
        backend.script_transfer("/sdcard/movie.mp4", vec![50, 100]);
        let mut app = connected_app(backend.clone());
        app.remote_pane.entries = vec![file_entry("movie.mp4", 4096)];
        app.start_transfer(TransferDirection::Pull);
        pump_plan(&mut app);
        assert_eq!(app.mode, Mode::ConfirmTransfer);
        let pending = app.pending_transfer.as_ref().unwrap();
        assert_eq!(pending.plan.items.len(), 1);
        app.confirm_transfer();
        pump(&mut app);
        assert!(app.running_transfer.is_none());
        assert!(app.notice.as_ref().unwrap().title.contains("complete"));
        assert_eq!(backend.transferred.lock().unwrap().len(), 1);
    }

    fn pump_plan(app: &mut App) {
        for _ in 0..200 {
            app.poll_plan();
            if app.plan_rx.is_none() {
                return;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        panic!("planning never finished");
    }

    #[test]
    fn failed_item_surfaces_a_notice() {
        let backend = Arc::new(MockAdbBackend::default());
        // no script -> the mock fails the transfer process
        let mut app = connected_app(backend);
        app.remote_pane.entries = vec![file_entry("broken.bin", 10)];
        app.start_transfer(TransferDirection::Pull);
        pump_plan(&mut app);
        app.confirm_transfer();
        pump(&mut app);
        let notice = app.notice.as_ref().expect("failure notice");
        assert!(notice.title.contains("failed"));
    }

    #[test]
    fn transfer_without_device_shows_notice_instead_of_planning() {
        let backend = Arc::new(MockAdbBackend::default());
        let mut app = App::for_test(backend);
        app.connection = ConnectionStatus::NoDevice;
        app.local_pane.entries = vec![file_entry("a", 1)];
        app.start_transfer(TransferDirection::Push);
        assert!(app.plan_rx.is_none());
        assert!(app.notice.is_some());
    }

    #[test]
    fn empty_selection_never_starts_planning() {
        let backend = Arc::new(MockAdbBackend::default());
        let mut app = connected_app(backend);
        app.start_transfer(TransferDirection::Pull);
        assert!(app.plan_rx.is_none());
        assert_eq!(app.status, "Nothing selected");
    }

    #[test]
    fn dismissing_pending_transfer_clears_state() {
        let backend = Arc::new(MockAdbBackend::default());
        let mut app = connected_app(backend);
        app.remote_pane.entries = vec![file_entry("a", 1)];
        app.start_transfer(TransferDirection::Pull);
        pump_plan(&mut app);
        assert!(app.pending_transfer.is_some());
        app.dismiss_pending_transfer();
        assert!(app.pending_transfer.is_none());
        assert_eq!(app.mode, Mode::Normal);
    }

    #[test]
    fn second_transfer_is_rejected_while_one_runs() {
        let backend = Arc::new(MockAdbBackend::default());
        let mut app = connected_app(backend);
        app.remote_pane.entries = vec![file_entry("a", 1)];
        app.running_transfer = Some(RunningTransfer {
            direction: TransferDirection::Pull,
            total_bytes: 1,
            item_count: 1,
            fraction: 0.0,
            bytes_done: 0,
            throughput: None,
            eta_secs: None,
            current_item: String::new(),
            started: Instant::now(),
        });
        app.start_transfer(TransferDirection::Pull);
        assert!(app.plan_rx.is_none());
        assert!(app.status.contains("already in progress"));
    }
}
