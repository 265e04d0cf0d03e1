//! Best-effort parsers for the human-oriented text adb gives back. These are
//! boundary adapters, not a grammar: ambiguous input degrades to "name only,
//! size unknown" instead of erroring.

use crate::model::{ConnectionStatus, DiskUsage, Entry, EntryKind};

/// Block unit used by `df` on the device.
const DF_BLOCK_BYTES: u64 = 1024;

/// Parses a remote directory listing in either supported format.
///
/// Simple format (`ls -p`): one name per line, directories suffixed with `/`,
/// no sizes. Detailed format (`ls -al`): permission string, link count,
/// owner, group, size, date, time, name; the name may contain spaces, so it
/// is recovered as everything after the two date/time columns. `.` and `..`
/// are dropped. Output is sorted directories-first, then case-insensitive.
pub(crate) fn parse_listing(text: &str) -> Vec<Entry> {
    let mut entries = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("total ") {
            continue;
        }
        let entry = if looks_like_permissions(line.split_whitespace().next().unwrap_or("")) {
            parse_detailed_line(line)
        } else {
            parse_simple_line(line)
        };
        if let Some(entry) = entry {
            if entry.name == "." || entry.name == ".." {
                continue;
            }
            entries.push(entry);
        }
    }
    sort_entries(&mut entries);
    entries
}

fn parse_simple_line(line: &str) -> Option<Entry> {
    if let Some(name) = line.strip_suffix('/') {
        if name.is_empty() {
            return None;
        }
        Some(Entry {
            name: name.to_string(),
            kind: EntryKind::Directory,
            size_bytes: None,
        })
    } else {
        Some(Entry {
            name: line.to_string(),
            kind: EntryKind::File,
            size_bytes: None,
        })
    }
}

fn parse_detailed_line(line: &str) -> Option<Entry> {
    let columns: Vec<&str> = line.split_whitespace().collect();
    let permissions = *columns.first()?;
    let kind = if permissions.starts_with('d') {
        EntryKind::Directory
    } else {
        EntryKind::File
    };

    let Some(date_index) = columns.iter().position(|col| looks_like_date(col)) else {
        // No recognizable date column: best-effort fallback, last column is
        // the name and the size stays unknown.
        return Some(Entry {
            name: (*columns.last()?).to_string(),
            kind,
            size_bytes: None,
        });
    };
    if date_index == 0 || date_index + 2 > columns.len() {
        return None;
    }

    let size_bytes = match kind {
        EntryKind::Directory => None,
        EntryKind::File => columns[date_index - 1].parse::<u64>().ok(),
    };
    // Name is everything after the date and time columns; joining on a
    // single space tolerates embedded spaces in the original name.
    let raw_name = columns.get(date_index + 2..)?.join(" ");
    if raw_name.is_empty() {
        return None;
    }
    // `ls -al` renders symlinks as "name -> target".
    let name = raw_name
        .split_once(" -> ")
        .map(|(name, _)| name.to_string())
        .unwrap_or(raw_name);
    Some(Entry {
        name,
        kind,
        size_bytes,
    })
}

pub(crate) fn sort_entries(entries: &mut [Entry]) {
    entries.sort_by(|a, b| {
        b.is_dir()
            .cmp(&a.is_dir())
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
}

fn looks_like_permissions(token: &str) -> bool {
    if token.len() < 10 {
        return false;
    }
    let mut chars = token.chars();
    let first = chars.next().unwrap_or(' ');
    if !matches!(first, 'd' | '-' | 'l' | 'c' | 'b' | 's' | 'p') {
        return false;
    }
    chars
        .take(9)
        .all(|c| matches!(c, 'r' | 'w' | 'x' | 's' | 'S' | 't' | 'T' | '-'))
}

fn looks_like_date(token: &str) -> bool {
    let bytes = token.as_bytes();
    bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| matches!(i, 4 | 7) || b.is_ascii_digit())
}

/// Parses `df` output: the first data row after the header yields totals in
/// 1K blocks.
pub(crate) fn parse_disk_usage(text: &str) -> Option<DiskUsage> {
    let row = text.lines().skip(1).find(|line| !line.trim().is_empty())?;
    let columns: Vec<&str> = row.split_whitespace().collect();
    let total: u64 = columns.get(1)?.parse().ok()?;
    let used: u64 = columns.get(2)?.parse().ok()?;
    let available: u64 = columns.get(3)?.parse().ok()?;
    Some(DiskUsage {
        total_bytes: total * DF_BLOCK_BYTES,
        used_bytes: used * DF_BLOCK_BYTES,
        available_bytes: available * DF_BLOCK_BYTES,
    })
}

/// Parses `adb devices` output. The first line is a header; remaining lines
/// are `<serial>\t<status>`, and only status `device` counts as ready.
/// "adb missing" is detected at spawn time, never here.
pub(crate) fn parse_devices(text: &str) -> ConnectionStatus {
    for line in text.lines().skip(1) {
        let mut tokens = line.split_whitespace();
        let Some(serial) = tokens.next() else {
            continue;
        };
        if tokens.next() == Some("device") {
            return ConnectionStatus::Connected(serial.to_string());
        }
    }
    ConnectionStatus::NoDevice
}

/// Extracts the last "digits followed by `%`" token from a raw byte window.
/// The window is decoded lossily since adb interleaves `\r` frame rewrites
/// and occasional partial UTF-8.
pub(crate) fn parse_progress(window: &[u8]) -> Option<u8> {
    let text = String::from_utf8_lossy(window);
    let bytes = text.as_bytes();
    let mut best = None;
    for (i, b) in bytes.iter().enumerate() {
        if *b != b'%' {
            continue;
        }
        let mut start = i;
        while start > 0 && bytes[start - 1].is_ascii_digit() {
            start -= 1;
        }
        if start == i {
            continue;
        }
        if let Ok(value) = text[start..i].parse::<u16>() {
            best = Some(value.min(100) as u8);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_listing_round_trip() {
        let entries = parse_listing("dir1/\nfile1\n");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "dir1");
        assert_eq!(entries[0].kind, EntryKind::Directory);
        assert_eq!(entries[1].name, "file1");
        assert_eq!(entries[1].kind, EntryKind::File);
        assert_eq!(entries[1].size_bytes, None);
    }

    #[test]
    fn presentation_order_puts_directories_first() {
        let entries = parse_listing("zebra\nApps/\nnotes.txt\nbackup/\n");
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Apps", "backup", "notes.txt", "zebra"]);
    }

    #[test]
    fn detailed_listing_extracts_sizes() {
        let text = "total 24\n\
                    drwxrwx--x  4 root sdcard_rw    4096 2024-01-05 12:30 DCIM\n\
                    -rw-rw----  1 root sdcard_rw 1048576 2024-01-05 12:31 movie.mp4\n";
        let entries = parse_listing(text);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "DCIM");
        assert!(entries[0].is_dir());
        assert_eq!(entries[0].size_bytes, None);
        assert_eq!(entries[1].name, "movie.mp4");
        assert_eq!(entries[1].size_bytes, Some(1_048_576));
    }

    #[test]
    fn detailed_listing_keeps_embedded_spaces_in_names() {
        let text = "-rw-rw---- 1 root sdcard_rw 500 2024-01-05 12:31 My Holiday Notes.txt\n";
        let entries = parse_listing(text);
        assert_eq!(entries[0].name, "My Holiday Notes.txt");
        assert_eq!(entries[0].size_bytes, Some(500));
    }

    #[test]
    fn detailed_listing_cuts_symlink_targets() {
        let text = "lrwxrwxrwx 1 root root 11 2009-01-01 00:00 sdcard -> /storage/self/primary\n";
        let entries = parse_listing(text);
        assert_eq!(entries[0].name, "sdcard");
    }

    #[test]
    fn detailed_listing_without_date_falls_back_to_last_column() {
        let text = "-rw-rw---- 1 root sdcard_rw 500 Jan 5 notes.txt\n";
        let entries = parse_listing(text);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "notes.txt");
        assert_eq!(entries[0].size_bytes, None);
    }

    #[test]
    fn dot_entries_are_dropped() {
        let text = "drwxrwx--x 4 root root 4096 2024-01-05 12:30 .\n\
                    drwxrwx--x 4 root root 4096 2024-01-05 12:30 ..\n\
                    dir/\n";
        let entries = parse_listing(text);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "dir");
    }

    #[test]
    fn disk_usage_converts_blocks_to_bytes() {
        let text = "Filesystem 1K-blocks    Used Available Use% Mounted on\n\
                    /dev/fuse    1000000  600000    400000  60% /storage/emulated\n";
        let usage = parse_disk_usage(text).unwrap();
        assert_eq!(usage.total_bytes, 1_000_000 * 1024);
        assert_eq!(usage.used_bytes, 600_000 * 1024);
        assert_eq!(usage.available_bytes, 400_000 * 1024);
    }

    #[test]
    fn disk_usage_rejects_garbage() {
        assert_eq!(parse_disk_usage("df: no such file\n"), None);
        assert_eq!(parse_disk_usage(""), None);
    }

    #[test]
    fn devices_header_is_skipped() {
        let text = "List of devices attached\nemulator-5554\tdevice\n";
        assert_eq!(
            parse_devices(text),
            ConnectionStatus::Connected("emulator-5554".to_string())
        );
    }

    #[test]
    fn unauthorized_devices_do_not_count() {
        let text = "List of devices attached\n0123456789ABCDEF\tunauthorized\n";
        assert_eq!(parse_devices(text), ConnectionStatus::NoDevice);
        assert_eq!(parse_devices("List of devices attached\n\n"), ConnectionStatus::NoDevice);
    }

    #[test]
    fn first_ready_device_wins() {
        let text = "List of devices attached\nserial-a\tdevice\nserial-b\tdevice\n";
        assert_eq!(
            parse_devices(text),
            ConnectionStatus::Connected("serial-a".to_string())
        );
    }

    #[test]
    fn progress_takes_last_percent_token() {
        let window = b"...frame 1 of 3: [ 17%] foo\r[ 42%] bar";
        assert_eq!(parse_progress(window), Some(42));
    }

    #[test]
    fn progress_ignores_numbers_without_percent() {
        assert_eq!(parse_progress(b"listening on port 4200"), None);
        assert_eq!(parse_progress(b"100 files"), None);
        assert_eq!(parse_progress(b"% alone"), None);
    }

    #[test]
    fn progress_clamps_over_hundred() {
        assert_eq!(parse_progress(b"[105%]"), Some(100));
    }

    #[test]
    fn progress_survives_invalid_utf8() {
        let mut window = vec![0xff, 0xfe];
        window.extend_from_slice(b"[ 9%]");
        assert_eq!(parse_progress(&window), Some(9));
    }
}
