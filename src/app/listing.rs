//! Listing refreshes. Local listings are read synchronously; remote listings
//! and disk usage run on worker threads and post back full snapshots, which
//! are discarded when the user has navigated elsewhere in the meantime.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::mpsc;

use crate::app::App;
use crate::app::constants::NOT_CONNECTED_MESSAGE;
use crate::model::{Entry, EntryKind};
use crate::parse::sort_entries;

pub(crate) fn read_local_entries(dir: &Path) -> io::Result<Vec<Entry>> {
    let mut entries = Vec::new();
    for child in fs::read_dir(dir)? {
        let child = child?;
        let name = child.file_name().to_string_lossy().into_owned();
        let file_type = child.file_type()?;
        if file_type.is_dir() {
            entries.push(Entry {
                name,
                kind: EntryKind::Directory,
                size_bytes: None,
            });
        } else {
            let size = child.metadata().map(|meta| meta.len()).ok();
            entries.push(Entry {
                name,
                kind: EntryKind::File,
                size_bytes: size,
            });
        }
    }
    sort_entries(&mut entries);
    Ok(entries)
}

impl App {
    /// Re-lists the local cursor. A PermissionDenied is recovered locally by
    /// reverting to the parent directory, never surfaced as a failure.
    pub(crate) fn refresh_local(&mut self) {
        match read_local_entries(&self.local_cwd) {
            Ok(entries) => {
                self.local_pane.replace_entries(entries);
            }
            Err(err) if err.kind() == io::ErrorKind::PermissionDenied => {
                self.set_status(format!(
                    "Permission denied: {}",
                    self.local_cwd.display()
                ));
                if let Some(parent) = self.local_cwd.parent() {
                    self.local_cwd = parent.to_path_buf();
                    self.refresh_local();
                } else {
                    self.local_pane.error = Some("Permission denied".to_string());
                }
            }
            Err(err) => {
                self.local_pane.loading = false;
                self.local_pane.error = Some(err.to_string());
            }
        }
    }

    pub(crate) fn start_remote_refresh(&mut self) {
        if !self.connection.is_connected() {
            self.remote_pane.entries.clear();
            self.remote_pane.error = Some(NOT_CONNECTED_MESSAGE.to_string());
            return;
        }
        let path = self.remote_cwd.clone();
        let backend = self.backend.clone();
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let result = backend.list_dir(&path);
            let _ = tx.send((path, result));
        });
        self.remote_pane.loading = true;
        self.remote_pane.error = None;
        self.remote_fetch = Some(rx);
        self.start_usage_fetch();
    }

    pub(crate) fn poll_remote_fetch(&mut self) {
        let Some(rx) = &self.remote_fetch else {
            return;
        };
        let Ok((path, result)) = rx.try_recv() else {
            return;
        };
        self.remote_fetch = None;
        // A stale snapshot for a directory the user already left.
        if path != self.remote_cwd {
            return;
        }
        match result {
            Ok(entries) => {
                self.remote_pane.replace_entries(entries);
            }
            Err(err) => {
                self.remote_pane.loading = false;
                self.remote_pane.error = Some(format!("{err:#}"));
                self.set_status(format!("Listing failed: {err:#}"));
            }
        }
    }

    pub(crate) fn start_usage_fetch(&mut self) {
        if !self.connection.is_connected() {
            return;
        }
        let path = self.remote_cwd.clone();
        let backend = self.backend.clone();
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let result = backend.disk_usage(&path);
            let _ = tx.send((path, result));
        });
        self.usage_rx = Some(rx);
    }

    pub(crate) fn poll_usage(&mut self) {
        let Some(rx) = &self.usage_rx else {
            return;
        };
        let Ok((path, result)) = rx.try_recv() else {
            return;
        };
        self.usage_rx = None;
        if path != self.remote_cwd {
            return;
        }
        match result {
            Ok(usage) => self.disk_usage = usage,
            // Disk usage is decoration; a failed probe just clears it.
            Err(_) => self.disk_usage = None,
        }
    }

    pub(crate) fn refresh_side(&mut self, side: crate::model::Side) {
        match side {
            crate::model::Side::Local => self.refresh_local(),
            crate::model::Side::Remote => self.start_remote_refresh(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adb::MockAdbBackend;
    use crate::model::{ConnectionStatus, DiskUsage, Side};
    use std::sync::Arc;
    use std::time::Duration;

    fn entry(name: &str, kind: EntryKind) -> Entry {
        Entry {
            name: name.to_string(),
            kind,
            size_bytes: None,
        }
    }

    fn wait_for<F: Fn(&App) -> bool>(app: &mut App, done: F) {
        for _ in 0..100 {
            app.poll_remote_fetch();
            app.poll_usage();
            if done(app) {
                return;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        panic!("background fetch never completed");
    }

    #[test]
    fn local_listing_sorts_directories_first() {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("adbfm-list-{nanos}"));
        fs::create_dir_all(dir.join("zdir")).unwrap();
        fs::write(dir.join("afile"), b"x").unwrap();
        let entries = read_local_entries(&dir).unwrap();
        assert_eq!(entries[0].name, "zdir");
        assert!(entries[0].is_dir());
        assert_eq!(entries[1].name, "afile");
        assert_eq!(entries[1].size_bytes, Some(1));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn remote_refresh_applies_matching_snapshot() {
        let backend = Arc::new(MockAdbBackend::default());
        backend.set_listing("/sdcard/", vec![entry("DCIM", EntryKind::Directory)]);
        let mut app = App::for_test(backend);
        app.connection = ConnectionStatus::Connected("serial".to_string());
        app.start_remote_refresh();
        wait_for(&mut app, |app| !app.remote_pane.loading);
        assert_eq!(app.remote_pane.entries.len(), 1);
        assert_eq!(app.remote_pane.entries[0].name, "DCIM");
    }

    #[test]
    fn stale_remote_snapshot_is_discarded() {
        let backend = Arc::new(MockAdbBackend::default());
        backend.set_listing("/sdcard/", vec![entry("old", EntryKind::Directory)]);
        let mut app = App::for_test(backend);
        app.connection = ConnectionStatus::Connected("serial".to_string());
        app.start_remote_refresh();
        // Navigate away before the result lands.
        app.remote_cwd = "/sdcard/DCIM/".to_string();
        for _ in 0..100 {
            app.poll_remote_fetch();
            if app.remote_fetch.is_none() {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(app.remote_pane.entries.is_empty());
    }

    #[test]
    fn remote_refresh_without_device_sets_pane_error() {
        let backend = Arc::new(MockAdbBackend::default());
        let mut app = App::for_test(backend);
        app.connection = ConnectionStatus::NoDevice;
        app.start_remote_refresh();
        assert_eq!(app.remote_pane.error.as_deref(), Some(NOT_CONNECTED_MESSAGE));
        assert!(app.remote_fetch.is_none());
    }

    #[test]
    fn listing_error_is_surfaced_on_the_pane() {
        let backend = Arc::new(MockAdbBackend::default());
        backend.set_listing_error("/sdcard/", "ls: /sdcard/: Permission denied");
        let mut app = App::for_test(backend);
        app.connection = ConnectionStatus::Connected("serial".to_string());
        app.start_remote_refresh();
        wait_for(&mut app, |app| app.remote_pane.error.is_some());
        assert!(
            app.remote_pane
                .error
                .as_deref()
                .unwrap()
                .contains("Permission denied")
        );
    }

    #[test]
    fn disk_usage_snapshot_lands_for_live_cursor() {
        let backend = Arc::new(MockAdbBackend::default());
        backend.set_usage(Some(DiskUsage {
            total_bytes: 100,
            used_bytes: 60,
            available_bytes: 40,
        }));
        let mut app = App::for_test(backend);
        app.connection = ConnectionStatus::Connected("serial".to_string());
        app.start_usage_fetch();
        wait_for(&mut app, |app| app.disk_usage.is_some());
        assert_eq!(app.disk_usage.unwrap().available_bytes, 40);
    }

    #[test]
    fn refresh_side_dispatches_per_side() {
        let backend = Arc::new(MockAdbBackend::default());
        let mut app = App::for_test(backend);
        app.local_cwd = std::env::temp_dir();
        app.refresh_side(Side::Local);
        assert!(app.local_pane.error.is_none());
    }
}
