//! Drives one transfer session: strictly sequential work items, one bridge
//! process per item, per-item percentages folded into a byte-weighted global
//! fraction with throughput and ETA.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

use crate::adb::AdbBackend;
use crate::model::{SessionOutcome, TransferDirection, TransferPlan, TransferUpdate, join_remote};

/// Throughput is resampled at most this often to keep the first few noisy
/// progress events from whipsawing the ETA.
const THROUGHPUT_SAMPLE_INTERVAL: Duration = Duration::from_millis(500);

/// Cooperative cancellation shared between the foreground thread and the
/// transfer worker. Checked before each item and inside the pty drain loop.
#[derive(Debug, Clone, Default)]
pub(crate) struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Byte-weighted global progress over a whole session.
struct ProgressTracker {
    total_bytes: u64,
    completed_before: u64,
    bytes_done: u64,
    sample_at: Instant,
    sample_bytes: u64,
    throughput: Option<f64>,
}

impl ProgressTracker {
    fn new(total_bytes: u64, now: Instant) -> Self {
        Self {
            total_bytes,
            completed_before: 0,
            bytes_done: 0,
            sample_at: now,
            sample_bytes: 0,
            throughput: None,
        }
    }

    /// Folds one per-item percentage into the session-wide byte count.
    /// Monotonic: a late or repeated lower percentage never moves the global
    /// fraction backwards, and mid-item progress is capped at the item's own
    /// size.
    fn observe(&mut self, item_size: u64, percent: u8, now: Instant) {
        let in_item = ((item_size as f64) * f64::from(percent) / 100.0) as u64;
        let candidate = self
            .completed_before
            .saturating_add(in_item.min(item_size));
        self.bytes_done = self.bytes_done.max(candidate);
        self.resample(now);
    }

    fn complete_item(&mut self, item_size: u64, now: Instant) {
        self.completed_before = self.completed_before.saturating_add(item_size);
        self.bytes_done = self.bytes_done.max(self.completed_before);
        self.resample(now);
    }

    fn resample(&mut self, now: Instant) {
        let elapsed = now.duration_since(self.sample_at);
        if elapsed < THROUGHPUT_SAMPLE_INTERVAL {
            return;
        }
        let delta = self.bytes_done.saturating_sub(self.sample_bytes);
        self.throughput = Some(delta as f64 / elapsed.as_secs_f64());
        self.sample_at = now;
        self.sample_bytes = self.bytes_done;
    }

    fn fraction(&self) -> f64 {
        (self.bytes_done as f64 / self.total_bytes as f64).min(1.0)
    }

    /// None while no meaningful throughput has been observed yet.
    fn eta_secs(&self) -> Option<u64> {
        let throughput = self.throughput.filter(|t| *t > 0.0)?;
        let remaining = self.total_bytes.saturating_sub(self.bytes_done);
        Some((remaining as f64 / throughput).ceil() as u64)
    }

    fn throughput(&self) -> Option<f64> {
        self.throughput.filter(|t| *t > 0.0)
    }
}

/// Runs the whole plan against the bridge. Items are processed in order; the
/// first failing item aborts the remaining ones ("abort remaining" policy).
/// On cancellation the in-flight item's partial destination artifact is
/// removed; items completed earlier stay in place.
pub(crate) fn run_session(
    plan: &TransferPlan,
    direction: TransferDirection,
    dest_root: &str,
    backend: &dyn AdbBackend,
    tx: &Sender<TransferUpdate>,
    cancel: &CancelFlag,
) -> SessionOutcome {
    if plan.items.is_empty() {
        return SessionOutcome::Failed("nothing to transfer".to_string());
    }
    let mut tracker = ProgressTracker::new(plan.total_bytes, Instant::now());
    for item in &plan.items {
        // Once cancelled, no bridge process for a new item is spawned.
        if cancel.is_cancelled() {
            return SessionOutcome::Cancelled;
        }
        let dest = match direction {
            TransferDirection::Push => join_remote(dest_root, &item.dest_rel),
            TransferDirection::Pull => std::path::Path::new(dest_root)
                .join(&item.dest_rel)
                .to_string_lossy()
                .into_owned(),
        };
        let result = {
            let tracker = &mut tracker;
            let mut on_percent = |percent: u8| {
                tracker.observe(item.size_bytes, percent, Instant::now());
                let _ = tx.send(TransferUpdate::Progress {
                    fraction: tracker.fraction(),
                    bytes_done: tracker.bytes_done,
                    throughput: tracker.throughput(),
                    eta_secs: tracker.eta_secs(),
                    current_item: item.dest_rel.clone(),
                });
            };
            backend.transfer_item(direction, &item.source, &dest, &mut on_percent, cancel)
        };
        if let Err(err) = result {
            if cancel.is_cancelled() {
                // Partial destination artifact of the current item only;
                // no rollback of items that already finished.
                let _ = backend.remove_dest(direction, &dest);
                return SessionOutcome::Cancelled;
            }
            return SessionOutcome::Failed(format!("{}: {err:#}", item.dest_rel));
        }
        tracker.complete_item(item.size_bytes, Instant::now());
        let _ = tx.send(TransferUpdate::Progress {
            fraction: tracker.fraction(),
            bytes_done: tracker.bytes_done,
            throughput: tracker.throughput(),
            eta_secs: tracker.eta_secs(),
            current_item: item.dest_rel.clone(),
        });
    }
    SessionOutcome::Completed
}
