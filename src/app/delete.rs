//! Deletion of marked or highlighted entries, behind a confirm prompt.
//! The worker keeps going past individual failures and reports the first
//! error alongside the count of entries it did remove.

use std::fs;
use std::sync::mpsc;

use crate::app::App;
use crate::model::{DeleteRequest, Mode, Notice, Side, join_remote};

impl App {
    pub(crate) fn request_delete(&mut self) {
        let names: Vec<String> = self
            .active_pane()
            .selection()
            .into_iter()
            .map(|entry| entry.name)
            .collect();
        if names.is_empty() {
            self.set_status("Nothing selected");
            return;
        }
        self.delete_request = Some(DeleteRequest {
            side: self.active_side,
            names,
        });
        self.mode = Mode::ConfirmDelete;
    }

    pub(crate) fn confirm_delete(&mut self) {
        let Some(request) = self.delete_request.take() else {
            return;
        };
        self.mode = Mode::Normal;
        let side = request.side;
        let backend = self.backend.clone();
        let local_cwd = self.local_cwd.clone();
        let remote_cwd = self.remote_cwd.clone();
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let mut removed = 0usize;
            let mut first_error: Option<String> = None;
            for name in &request.names {
                let result = match side {
                    Side::Local => {
                        let path = local_cwd.join(name);
                        let outcome = match fs::symlink_metadata(&path) {
                            Ok(meta) if meta.is_dir() => fs::remove_dir_all(&path),
                            Ok(_) => fs::remove_file(&path),
                            Err(err) => Err(err),
                        };
                        outcome.map_err(|err| format!("{name}: {err}"))
                    }
                    Side::Remote => backend
                        .delete(&join_remote(&remote_cwd, name))
                        .map_err(|err| format!("{name}: {err:#}")),
                };
                match result {
                    Ok(()) => removed += 1,
                    Err(message) => {
                        if first_error.is_none() {
                            first_error = Some(message);
                        }
                    }
                }
            }
            let _ = tx.send((side, removed, first_error));
        });
        self.delete_rx = Some(rx);
        self.set_status("Deleting...");
    }

    pub(crate) fn dismiss_delete_request(&mut self) {
        self.delete_request = None;
        self.mode = Mode::Normal;
    }

    pub(crate) fn poll_delete(&mut self) {
        let Some(rx) = &self.delete_rx else {
            return;
        };
        let Ok((side, removed, error)) = rx.try_recv() else {
            return;
        };
        self.delete_rx = None;
        match error {
            Some(message) => {
                self.notice = Some(Notice {
                    title: "Delete failed".to_string(),
                    message,
                });
                self.set_status(format!("Removed {removed}, with errors"));
            }
            None => {
                self.set_status(format!("Removed {removed}"));
            }
        }
        self.refresh_side(side);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adb::MockAdbBackend;
    use crate::model::{Entry, EntryKind};
    use std::sync::Arc;
    use std::time::Duration;

    fn wait_for_delete(app: &mut App) {
        for _ in 0..100 {
            app.poll_delete();
            if app.delete_rx.is_none() {
                return;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        panic!("delete worker never finished");
    }

    fn file_entry(name: &str) -> Entry {
        Entry {
            name: name.to_string(),
            kind: EntryKind::File,
            size_bytes: Some(1),
        }
    }

    #[test]
    fn remote_delete_targets_joined_paths() {
        let backend = Arc::new(MockAdbBackend::default());
        let mut app = App::for_test(backend.clone());
        app.active_side = Side::Remote;
        app.remote_pane.entries = vec![file_entry("trash.bin")];
        app.request_delete();
        assert_eq!(app.mode, Mode::ConfirmDelete);
        app.confirm_delete();
        wait_for_delete(&mut app);
        let deleted = backend.deleted.lock().unwrap().clone();
        assert_eq!(deleted, vec!["/sdcard/trash.bin".to_string()]);
        assert!(app.status.contains("Removed 1"));
    }

    #[test]
    fn local_delete_removes_file_and_directory() {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("adbfm-del-{nanos}"));
        fs::create_dir_all(dir.join("subdir")).unwrap();
        fs::write(dir.join("file.txt"), b"x").unwrap();
        fs::write(dir.join("subdir/inner"), b"y").unwrap();

        let backend = Arc::new(MockAdbBackend::default());
        let mut app = App::for_test(backend);
        app.local_cwd = dir.clone();
        app.refresh_local();
        app.local_pane.marked = vec!["subdir".to_string(), "file.txt".to_string()];
        app.request_delete();
        app.confirm_delete();
        wait_for_delete(&mut app);
        assert!(!dir.join("file.txt").exists());
        assert!(!dir.join("subdir").exists());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn failures_keep_going_and_report_first_error() {
        let backend = Arc::new(MockAdbBackend::default());
        backend.set_delete_error("/sdcard/locked", "rm: permission denied");
        let mut app = App::for_test(backend.clone());
        app.active_side = Side::Remote;
        app.remote_pane.entries = vec![file_entry("locked"), file_entry("ok")];
        app.remote_pane.marked = vec!["locked".to_string(), "ok".to_string()];
        app.request_delete();
        app.confirm_delete();
        wait_for_delete(&mut app);
        let deleted = backend.deleted.lock().unwrap().clone();
        assert!(deleted.contains(&"/sdcard/ok".to_string()));
        let notice = app.notice.as_ref().expect("error notice");
        assert!(notice.message.contains("permission denied"));
        assert!(app.status.contains("Removed 1"));
    }

    #[test]
    fn dismissing_confirm_leaves_everything_in_place() {
        let backend = Arc::new(MockAdbBackend::default());
        let mut app = App::for_test(backend.clone());
        app.active_side = Side::Remote;
        app.remote_pane.entries = vec![file_entry("keep.me")];
        app.request_delete();
        app.dismiss_delete_request();
        assert_eq!(app.mode, Mode::Normal);
        assert!(app.delete_request.is_none());
        assert!(backend.deleted.lock().unwrap().is_empty());
    }
}
