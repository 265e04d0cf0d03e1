//! The two cursors and their transitions. A local operation never touches the
//! remote cursor and vice versa.

use crate::app::App;
use crate::app::constants::DEFAULT_REMOTE_ROOT;
use crate::model::{Side, join_remote};

/// Parent of a remote directory path. The remote cursor is always
/// `/`-terminated except the root, which is exactly `/`.
pub(crate) fn parent_remote_dir(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    let base = trimmed
        .rsplit_once('/')
        .map(|(base, _)| base)
        .unwrap_or("");
    if base.is_empty() {
        "/".to_string()
    } else {
        format!("{base}/")
    }
}

impl App {
    /// Descends into `name`. Callers only pass names that resolved to
    /// directories in the latest listing.
    pub(crate) fn enter(&mut self, side: Side, name: &str) {
        debug_assert!(
            self.pane(side)
                .entries
                .iter()
                .any(|entry| entry.name == name && entry.is_dir()),
            "enter() requires a directory from the current listing"
        );
        match side {
            Side::Local => {
                self.local_cwd = self.local_cwd.join(name);
                self.local_pane.selected = 0;
                self.refresh_local();
            }
            Side::Remote => {
                self.remote_cwd = format!("{}/", join_remote(&self.remote_cwd, name));
                self.remote_pane.selected = 0;
                self.start_remote_refresh();
            }
        }
    }

    pub(crate) fn up(&mut self, side: Side) {
        match side {
            Side::Local => {
                let Some(parent) = self.local_cwd.parent() else {
                    return;
                };
                self.local_cwd = parent.to_path_buf();
                self.local_pane.selected = 0;
                self.refresh_local();
            }
            Side::Remote => {
                if self.remote_cwd == "/" {
                    return;
                }
                self.remote_cwd = parent_remote_dir(&self.remote_cwd);
                self.remote_pane.selected = 0;
                self.start_remote_refresh();
            }
        }
    }

    pub(crate) fn home(&mut self, side: Side) {
        match side {
            Side::Local => {
                if let Some(home) = dirs::home_dir() {
                    self.local_cwd = home;
                    self.local_pane.selected = 0;
                    self.refresh_local();
                }
            }
            Side::Remote => {
                self.remote_cwd = DEFAULT_REMOTE_ROOT.to_string();
                self.remote_pane.selected = 0;
                self.start_remote_refresh();
            }
        }
    }

    pub(crate) fn pane(&self, side: Side) -> &crate::model::PaneState {
        match side {
            Side::Local => &self.local_pane,
            Side::Remote => &self.remote_pane,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adb::MockAdbBackend;
    use crate::model::{ConnectionStatus, Entry, EntryKind};
    use std::sync::Arc;

    fn connected_app() -> App {
        let backend = Arc::new(MockAdbBackend::default());
        let mut app = App::for_test(backend);
        app.connection = ConnectionStatus::Connected("serial".to_string());
        app
    }

    fn dir_entry(name: &str) -> Entry {
        Entry {
            name: name.to_string(),
            kind: EntryKind::Directory,
            size_bytes: None,
        }
    }

    #[test]
    fn remote_up_at_root_is_a_no_op() {
        let mut app = connected_app();
        app.remote_cwd = "/".to_string();
        app.up(Side::Remote);
        assert_eq!(app.remote_cwd, "/");
    }

    #[test]
    fn remote_up_strips_one_segment_and_keeps_separator() {
        let mut app = connected_app();
        app.remote_cwd = "/sdcard/DCIM/".to_string();
        app.up(Side::Remote);
        assert_eq!(app.remote_cwd, "/sdcard/");
        app.up(Side::Remote);
        assert_eq!(app.remote_cwd, "/");
    }

    #[test]
    fn remote_enter_appends_trailing_separator() {
        let mut app = connected_app();
        app.remote_pane.entries = vec![dir_entry("DCIM")];
        app.enter(Side::Remote, "DCIM");
        assert_eq!(app.remote_cwd, "/sdcard/DCIM/");
    }

    #[test]
    fn remote_enter_from_root() {
        let mut app = connected_app();
        app.remote_cwd = "/".to_string();
        app.remote_pane.entries = vec![dir_entry("sdcard")];
        app.enter(Side::Remote, "sdcard");
        assert_eq!(app.remote_cwd, "/sdcard/");
    }

    #[test]
    fn local_operations_leave_remote_cursor_alone() {
        let mut app = connected_app();
        app.local_cwd = std::env::temp_dir();
        let before = app.remote_cwd.clone();
        app.up(Side::Local);
        app.home(Side::Local);
        assert_eq!(app.remote_cwd, before);
    }

    #[test]
    fn remote_home_resets_to_default_root() {
        let mut app = connected_app();
        app.remote_cwd = "/data/local/tmp/".to_string();
        app.home(Side::Remote);
        assert_eq!(app.remote_cwd, DEFAULT_REMOTE_ROOT);
    }

    #[test]
    fn parent_remote_dir_handles_single_segment() {
        assert_eq!(parent_remote_dir("/sdcard/"), "/");
        assert_eq!(parent_remote_dir("/sdcard/DCIM/"), "/sdcard/");
        assert_eq!(parent_remote_dir("/"), "/");
    }
}
