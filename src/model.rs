use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
    Local,
    Remote,
}

impl Side {
    pub(crate) fn other(self) -> Side {
        match self {
            Side::Local => Side::Remote,
            Side::Remote => Side::Local,
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            Side::Local => "Local",
            Side::Remote => "Device",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EntryKind {
    File,
    Directory,
}

/// One row of a directory listing. `size_bytes` is known for files when the
/// listing format carries it, `None` otherwise (directories, simple format).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Entry {
    pub(crate) name: String,
    pub(crate) kind: EntryKind,
    pub(crate) size_bytes: Option<u64>,
}

impl Entry {
    pub(crate) fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DiskUsage {
    pub(crate) total_bytes: u64,
    pub(crate) used_bytes: u64,
    pub(crate) available_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ConnectionStatus {
    Checking,
    Connected(String),
    NoDevice,
    ToolMissing,
}

impl ConnectionStatus {
    pub(crate) fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TransferDirection {
    Push,
    Pull,
}

impl TransferDirection {
    pub(crate) fn label(self) -> &'static str {
        match self {
            TransferDirection::Push => "Push",
            TransferDirection::Pull => "Pull",
        }
    }
}

/// One file-level unit of a transfer plan. `dest_rel` is relative to the
/// destination cursor and preserves the directory structure of the original
/// selection: selecting a directory `foo` containing `bar/baz.txt` yields
/// `foo/bar/baz.txt`, never a flattened copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WorkItem {
    pub(crate) source: String,
    pub(crate) dest_rel: String,
    pub(crate) size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TransferPlan {
    pub(crate) items: Vec<WorkItem>,
    pub(crate) total_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SessionOutcome {
    Completed,
    Failed(String),
    Cancelled,
}

/// Progress events posted by the transfer worker to the foreground thread.
#[derive(Debug, Clone)]
pub(crate) enum TransferUpdate {
    Progress {
        fraction: f64,
        bytes_done: u64,
        throughput: Option<f64>,
        eta_secs: Option<u64>,
        current_item: String,
    },
    Done(SessionOutcome),
}

#[derive(Debug, Clone)]
pub(crate) struct RunningTransfer {
    pub(crate) direction: TransferDirection,
    pub(crate) total_bytes: u64,
    pub(crate) item_count: usize,
    pub(crate) fraction: f64,
    pub(crate) bytes_done: u64,
    pub(crate) throughput: Option<f64>,
    pub(crate) eta_secs: Option<u64>,
    pub(crate) current_item: String,
    pub(crate) started: Instant,
}

#[derive(Debug, Clone)]
pub(crate) struct PendingTransfer {
    pub(crate) direction: TransferDirection,
    pub(crate) plan: TransferPlan,
}

/// One browse pane. Entries are replaced wholesale on each refresh; nothing
/// holds a reference across a refresh boundary.
#[derive(Debug, Clone, Default)]
pub(crate) struct PaneState {
    pub(crate) entries: Vec<Entry>,
    pub(crate) selected: usize,
    pub(crate) marked: Vec<String>,
    pub(crate) loading: bool,
    pub(crate) error: Option<String>,
}

impl PaneState {
    pub(crate) fn replace_entries(&mut self, entries: Vec<Entry>) {
        self.entries = entries;
        self.marked.clear();
        self.loading = false;
        self.error = None;
        if self.selected >= self.entries.len() {
            self.selected = self.entries.len().saturating_sub(1);
        }
    }

    pub(crate) fn toggle_mark(&mut self) {
        let Some(entry) = self.entries.get(self.selected) else {
            return;
        };
        if let Some(pos) = self.marked.iter().position(|name| *name == entry.name) {
            self.marked.remove(pos);
        } else {
            self.marked.push(entry.name.clone());
        }
    }

    /// Marked entries, or the highlighted one when nothing is marked.
    pub(crate) fn selection(&self) -> Vec<Entry> {
        if self.marked.is_empty() {
            return self
                .entries
                .get(self.selected)
                .cloned()
                .into_iter()
                .collect();
        }
        self.entries
            .iter()
            .filter(|entry| self.marked.contains(&entry.name))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Normal,
    ConfirmDelete,
    ConfirmTransfer,
}

#[derive(Debug, Clone)]
pub(crate) struct Notice {
    pub(crate) title: String,
    pub(crate) message: String,
}

#[derive(Debug, Clone)]
pub(crate) struct DeleteRequest {
    pub(crate) side: Side,
    pub(crate) names: Vec<String>,
}

pub(crate) fn join_remote(dir: &str, name: &str) -> String {
    if dir.ends_with('/') {
        format!("{dir}{name}")
    } else {
        format!("{dir}/{name}")
    }
}
