use std::process::Command;

use anyhow::{Context, Result, bail};

use crate::model::{ConnectionStatus, DiskUsage, Entry, TransferDirection};
use crate::parse::{parse_devices, parse_disk_usage, parse_listing};
use crate::transfer::CancelFlag;

#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::Mutex;

pub(crate) const ADB_PROGRAM: &str = "adb";

/// Everything the app asks of the adb bridge. Seam for tests: the real
/// implementation shells out, the mock serves canned listings and scripted
/// transfer progress.
pub(crate) trait AdbBackend: Send + Sync {
    /// Probes device presence. Absorbs errors into the status: a missing adb
    /// executable is `ToolMissing`, which is distinct from "adb reachable,
    /// zero devices".
    fn devices(&self) -> ConnectionStatus;
    fn list_dir(&self, path: &str) -> Result<Vec<Entry>>;
    fn disk_usage(&self, path: &str) -> Result<Option<DiskUsage>>;
    fn delete(&self, path: &str) -> Result<()>;
    /// Runs one bridge process for one work item, reporting each scraped
    /// per-item percentage. Blocks until the process exits or `cancel` is
    /// observed (in which case the process is killed and an error returned).
    fn transfer_item(
        &self,
        direction: TransferDirection,
        source: &str,
        dest: &str,
        on_percent: &mut dyn FnMut(u8),
        cancel: &CancelFlag,
    ) -> Result<()>;
    /// Removes a (possibly partial) destination artifact after cancellation.
    fn remove_dest(&self, direction: TransferDirection, dest: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub(crate) struct RealAdbBackend;

impl RealAdbBackend {
    fn run_shell(&self, command: &str) -> Result<(String, String)> {
        run_adb(&["shell", command])
    }
}

impl AdbBackend for RealAdbBackend {
    fn devices(&self) -> ConnectionStatus {
        match run_adb(&["devices"]) {
            Ok((stdout, _)) => parse_devices(&stdout),
            Err(err) if is_tool_missing(&err) => ConnectionStatus::ToolMissing,
            Err(_) => ConnectionStatus::NoDevice,
        }
    }

    fn list_dir(&self, path: &str) -> Result<Vec<Entry>> {
        let (stdout, stderr) = self.run_shell(&format!("ls -al {}", shell_quote(path)))?;
        if stdout.trim().is_empty() && !stderr.trim().is_empty() {
            bail!("ls {path}: {}", stderr.trim());
        }
        Ok(parse_listing(&stdout))
    }

    fn disk_usage(&self, path: &str) -> Result<Option<DiskUsage>> {
        let (stdout, _) = self.run_shell(&format!("df {}", shell_quote(path)))?;
        Ok(parse_disk_usage(&stdout))
    }

    fn delete(&self, path: &str) -> Result<()> {
        let (_, stderr) = self.run_shell(&format!("rm -rf {}", shell_quote(path)))?;
        if !stderr.trim().is_empty() {
            bail!("rm -rf {path}: {}", stderr.trim());
        }
        Ok(())
    }

    fn transfer_item(
        &self,
        direction: TransferDirection,
        source: &str,
        dest: &str,
        on_percent: &mut dyn FnMut(u8),
        cancel: &CancelFlag,
    ) -> Result<()> {
        // Ensure the destination's parent exists; adb does not create
        // intermediate directories for single-file transfers.
        match direction {
            TransferDirection::Push => {
                if let Some(parent) = remote_parent(dest) {
                    self.run_shell(&format!("mkdir -p {}", shell_quote(&parent)))?;
                }
            }
            TransferDirection::Pull => {
                if let Some(parent) = std::path::Path::new(dest).parent() {
                    std::fs::create_dir_all(parent).context("create destination dir")?;
                }
            }
        }
        let args: Vec<String> = match direction {
            TransferDirection::Push => {
                vec!["push".to_string(), source.to_string(), dest.to_string()]
            }
            TransferDirection::Pull => {
                vec!["pull".to_string(), source.to_string(), dest.to_string()]
            }
        };
        crate::pty::run_with_progress(ADB_PROGRAM, &args, on_percent, cancel)
    }

    fn remove_dest(&self, direction: TransferDirection, dest: &str) -> Result<()> {
        match direction {
            TransferDirection::Push => {
                self.run_shell(&format!("rm -f {}", shell_quote(dest)))?;
                Ok(())
            }
            TransferDirection::Pull => match std::fs::remove_file(dest) {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(err) => Err(err).context("remove partial file"),
            },
        }
    }
}

/// Runs adb as a plain captured subprocess (no pty; used for everything that
/// does not need progress streaming).
fn run_adb(args: &[&str]) -> Result<(String, String)> {
    let output = Command::new(ADB_PROGRAM)
        .args(args)
        .output()
        .with_context(|| format!("run {ADB_PROGRAM} {}", args.join(" ")))?;
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    if !output.status.success() && stdout.trim().is_empty() {
        bail!("adb {} failed: {}", args.join(" "), stderr.trim());
    }
    Ok((stdout, stderr))
}

fn is_tool_missing(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<std::io::Error>()
            .is_some_and(|io| io.kind() == std::io::ErrorKind::NotFound)
    })
}

fn shell_quote(path: &str) -> String {
    format!("'{}'", path.replace('\'', "'\\''"))
}

fn remote_parent(path: &str) -> Option<String> {
    let trimmed = path.trim_end_matches('/');
    let (base, _) = trimmed.rsplit_once('/')?;
    if base.is_empty() {
        None
    } else {
        Some(base.to_string())
    }
}

#[cfg(test)]
pub(crate) struct MockAdbBackend {
    pub(crate) status: Mutex<ConnectionStatus>,
    listings: Mutex<HashMap<String, Vec<Entry>>>,
    listing_errors: Mutex<HashMap<String, String>>,
    usage: Mutex<Option<DiskUsage>>,
    /// percent sequences served per source path; missing source -> failure
    transfer_scripts: Mutex<HashMap<String, Vec<u8>>>,
    pub(crate) transferred: Mutex<Vec<(String, String)>>,
    pub(crate) removed_dests: Mutex<Vec<String>>,
    pub(crate) deleted: Mutex<Vec<String>>,
    delete_errors: Mutex<HashMap<String, String>>,
    /// signal cancel after serving this many percent callbacks
    cancel_after: Mutex<Option<usize>>,
}

#[cfg(test)]
impl Default for MockAdbBackend {
    fn default() -> Self {
        Self {
            status: Mutex::new(ConnectionStatus::NoDevice),
            listings: Mutex::new(HashMap::new()),
            listing_errors: Mutex::new(HashMap::new()),
            usage: Mutex::new(None),
            transfer_scripts: Mutex::new(HashMap::new()),
            transferred: Mutex::new(vec![]),
            removed_dests: Mutex::new(vec![]),
            deleted: Mutex::new(vec![]),
            delete_errors: Mutex::new(HashMap::new()),
            cancel_after: Mutex::new(None),
        }
    }
}

#[cfg(test)]
impl MockAdbBackend {
    pub(crate) fn set_listing(&self, path: &str, entries: Vec<Entry>) {
        self.listings
            .lock()
            .unwrap()
            .insert(path.to_string(), entries);
    }

    pub(crate) fn set_listing_error(&self, path: &str, message: &str) {
        self.listing_errors
            .lock()
            .unwrap()
            .insert(path.to_string(), message.to_string());
    }

    pub(crate) fn set_usage(&self, usage: Option<DiskUsage>) {
        *self.usage.lock().unwrap() = usage;
    }

    pub(crate) fn script_transfer(&self, source: &str, percents: Vec<u8>) {
        self.transfer_scripts
            .lock()
            .unwrap()
            .insert(source.to_string(), percents);
    }

    pub(crate) fn set_delete_error(&self, path: &str, message: &str) {
        self.delete_errors
            .lock()
            .unwrap()
            .insert(path.to_string(), message.to_string());
    }

    pub(crate) fn cancel_after_percents(&self, count: usize) {
        *self.cancel_after.lock().unwrap() = Some(count);
    }
}

#[cfg(test)]
impl AdbBackend for MockAdbBackend {
    fn devices(&self) -> ConnectionStatus {
        self.status.lock().unwrap().clone()
    }

    fn list_dir(&self, path: &str) -> Result<Vec<Entry>> {
        if let Some(message) = self.listing_errors.lock().unwrap().get(path) {
            bail!("{message}");
        }
        Ok(self
            .listings
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or_default())
    }

    fn disk_usage(&self, _path: &str) -> Result<Option<DiskUsage>> {
        Ok(*self.usage.lock().unwrap())
    }

    fn delete(&self, path: &str) -> Result<()> {
        if let Some(message) = self.delete_errors.lock().unwrap().get(path) {
            bail!("{message}");
        }
        self.deleted.lock().unwrap().push(path.to_string());
        Ok(())
    }

    fn transfer_item(
        &self,
        _direction: TransferDirection,
        source: &str,
        dest: &str,
        on_percent: &mut dyn FnMut(u8),
        cancel: &CancelFlag,
    ) -> Result<()> {
        self.transferred
            .lock()
            .unwrap()
            .push((source.to_string(), dest.to_string()));
        let Some(percents) = self.transfer_scripts.lock().unwrap().get(source).cloned() else {
            bail!("transfer process exited with status 1");
        };
        let cancel_after = *self.cancel_after.lock().unwrap();
        for (i, percent) in percents.into_iter().enumerate() {
            if cancel.is_cancelled() {
                bail!("cancelled");
            }
            on_percent(percent);
            if cancel_after == Some(i + 1) {
                cancel.cancel();
            }
        }
        if cancel.is_cancelled() {
            bail!("cancelled");
        }
        Ok(())
    }

    fn remove_dest(&self, _direction: TransferDirection, dest: &str) -> Result<()> {
        self.removed_dests.lock().unwrap().push(dest.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_quote_escapes_single_quotes() {
        assert_eq!(shell_quote("/sdcard/a b"), "'/sdcard/a b'");
        assert_eq!(shell_quote("it's"), "'it'\\''s'");
    }

    #[test]
    fn remote_parent_of_nested_path() {
        assert_eq!(remote_parent("/sdcard/DCIM/a.jpg"), Some("/sdcard/DCIM".to_string()));
        assert_eq!(remote_parent("/sdcard/"), None);
        assert_eq!(remote_parent("/file"), None);
    }

    #[test]
    fn tool_missing_detected_through_context_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no adb");
        let err = anyhow::Error::new(io).context("run adb devices");
        assert!(is_tool_missing(&err));
        let other = anyhow::anyhow!("device offline");
        assert!(!is_tool_missing(&other));
    }
}
