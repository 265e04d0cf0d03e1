//! Runs a transfer process on a pseudo-terminal and scrapes its progress.
//!
//! adb only emits `[ NN%] path` frames when it believes it is talking to a
//! terminal; through a plain pipe the carriage-return rewrites are never
//! flushed. A reader thread forwards raw chunks over a channel, and the
//! control loop drains it with a short timeout so cancellation is observed
//! promptly.

use std::io::Read;
use std::sync::mpsc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use portable_pty::{CommandBuilder, PtySize, native_pty_system};

use crate::parse::parse_progress;
use crate::transfer::CancelFlag;

/// Only the most recent progress frame matters; older bytes are discarded.
const TRAILING_WINDOW_BYTES: usize = 1024;
/// Worst-case cancellation latency is this poll interval plus kill time.
const DRAIN_TIMEOUT: Duration = Duration::from_millis(50);

/// Spawns `program args..` on a pty, reporting each percentage scraped from
/// its combined output. Returns once the process exits; a non-zero exit is an
/// error carrying the tail of the captured output. When `cancel` is raised
/// the process is killed and an error returned.
pub(crate) fn run_with_progress(
    program: &str,
    args: &[String],
    on_percent: &mut dyn FnMut(u8),
    cancel: &CancelFlag,
) -> Result<()> {
    let pty_system = native_pty_system();
    let pair = pty_system
        .openpty(PtySize {
            rows: 24,
            cols: 80,
            pixel_width: 0,
            pixel_height: 0,
        })
        .context("open pty")?;

    let mut command = CommandBuilder::new(program);
    command.args(args);
    let mut child = pair
        .slave
        .spawn_command(command)
        .with_context(|| format!("spawn {program}"))?;
    // The slave end belongs to the child now; holding it open here would
    // keep the reader from ever seeing EOF.
    drop(pair.slave);

    let mut reader = pair.master.try_clone_reader().context("clone pty reader")?;
    let (tx, rx) = mpsc::channel::<Vec<u8>>();
    std::thread::spawn(move || {
        let mut buffer = [0u8; 4096];
        loop {
            match reader.read(&mut buffer) {
                // EOF, or EIO once the child closes the slave end.
                Ok(0) | Err(_) => break,
                Ok(count) => {
                    if tx.send(buffer[..count].to_vec()).is_err() {
                        break;
                    }
                }
            }
        }
    });

    let mut window: Vec<u8> = Vec::with_capacity(TRAILING_WINDOW_BYTES);
    let mut last_reported: Option<u8> = None;
    let mut output_done = false;
    loop {
        if cancel.is_cancelled() {
            let _ = child.kill();
            let _ = child.wait();
            bail!("transfer cancelled");
        }
        if output_done {
            break;
        }
        match rx.recv_timeout(DRAIN_TIMEOUT) {
            Ok(chunk) => {
                let saw_frame_byte = chunk.iter().any(|b| matches!(b, b'%' | b']'));
                window.extend_from_slice(&chunk);
                if window.len() > TRAILING_WINDOW_BYTES {
                    let excess = window.len() - TRAILING_WINDOW_BYTES;
                    window.drain(..excess);
                }
                if saw_frame_byte {
                    if let Some(percent) = parse_progress(&window) {
                        if last_reported != Some(percent) {
                            last_reported = Some(percent);
                            on_percent(percent);
                        }
                    }
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                output_done = true;
            }
        }
    }

    let status = child.wait().context("wait for transfer process")?;
    if !status.success() {
        let tail = String::from_utf8_lossy(&window).trim().to_string();
        if tail.is_empty() {
            bail!("transfer process exited with {status}");
        }
        bail!("transfer process exited with {status}: {tail}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Pty allocation can fail in minimal environments; these tests bail out
    // quietly when /dev/ptmx is unavailable rather than fail the suite.
    fn pty_available() -> bool {
        native_pty_system()
            .openpty(PtySize {
                rows: 24,
                cols: 80,
                pixel_width: 0,
                pixel_height: 0,
            })
            .is_ok()
    }

    #[test]
    fn scrapes_percent_frames_from_pty_output() {
        if !pty_available() {
            return;
        }
        let mut seen = Vec::new();
        let cancel = CancelFlag::new();
        let args = vec![
            "-c".to_string(),
            "printf '[ 10%%] a\\r[ 55%%] a\\r[100%%] a\\n'".to_string(),
        ];
        run_with_progress("sh", &args, &mut |p| seen.push(p), &cancel).unwrap();
        assert!(seen.contains(&100), "saw {seen:?}");
        assert!(seen.iter().all(|p| *p <= 100));
    }

    #[test]
    fn nonzero_exit_is_an_error_with_output_tail() {
        if !pty_available() {
            return;
        }
        let cancel = CancelFlag::new();
        let args = vec!["-c".to_string(), "echo device offline; exit 3".to_string()];
        let err = run_with_progress("sh", &args, &mut |_| {}, &cancel).unwrap_err();
        assert!(err.to_string().contains("device offline"), "{err}");
    }

    #[test]
    fn missing_program_fails_to_spawn() {
        if !pty_available() {
            return;
        }
        let cancel = CancelFlag::new();
        let result = run_with_progress(
            "definitely-not-a-real-binary-3141",
            &[],
            &mut |_| {},
            &cancel,
        );
        assert!(result.is_err());
    }

    #[test]
    fn pre_signalled_cancel_kills_promptly() {
        if !pty_available() {
            return;
        }
        let cancel = CancelFlag::new();
        cancel.cancel();
        let args = vec!["-c".to_string(), "sleep 30".to_string()];
        let started = std::time::Instant::now();
        let err = run_with_progress("sh", &args, &mut |_| {}, &cancel).unwrap_err();
        assert!(err.to_string().contains("cancelled"));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
