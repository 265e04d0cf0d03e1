//! Device-presence probe, run on demand (startup and explicit reconnect).

use std::sync::mpsc;

use crate::app::App;
use crate::model::ConnectionStatus;

impl App {
    pub(crate) fn check_connection(&mut self) {
        self.connection = ConnectionStatus::Checking;
        self.set_status("Checking adb connection...");
        let backend = self.backend.clone();
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let _ = tx.send(backend.devices());
        });
        self.connection_rx = Some(rx);
    }

    pub(crate) fn poll_connection(&mut self) {
        let Some(rx) = &self.connection_rx else {
            return;
        };
        let Ok(status) = rx.try_recv() else {
            return;
        };
        self.connection_rx = None;
        match &status {
            ConnectionStatus::Connected(serial) => {
                self.set_status(format!("Connected: {serial}"));
                self.connection = status.clone();
                self.start_remote_refresh();
            }
            ConnectionStatus::NoDevice => {
                self.set_status("No device found. Connect via USB and enable debugging.");
                self.connection = status.clone();
                self.remote_pane.entries.clear();
                self.disk_usage = None;
            }
            ConnectionStatus::ToolMissing => {
                self.set_status("adb executable not found in PATH");
                self.connection = status.clone();
                self.remote_pane.entries.clear();
                self.disk_usage = None;
            }
            ConnectionStatus::Checking => {}
        }
    }
}
