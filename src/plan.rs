//! Expands a user selection into a flat, byte-accounted work list.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::adb::AdbBackend;
use crate::model::{Entry, TransferPlan, WorkItem, join_remote};

/// Builds the work list for a push: selected entries live under `local_cwd`.
///
/// Files map to a single item with `dest_rel = basename`. Directories are
/// walked in full; every file yields an item whose `dest_rel` is relative to
/// the parent of the selected directory, so the top-level directory name
/// survives as a path component at the destination. Overlapping selections
/// (a directory plus one of its own descendants) are intentionally not
/// deduplicated; both are walked and both sets of items are emitted.
pub(crate) fn plan_push(selection: &[Entry], local_cwd: &Path) -> Result<TransferPlan> {
    let mut items = Vec::new();
    for entry in selection {
        let source = local_cwd.join(&entry.name);
        if entry.is_dir() {
            walk_local(&source, &entry.name, &mut items)?;
        } else {
            let size = fs::metadata(&source)
                .with_context(|| format!("stat {}", source.display()))?
                .len();
            items.push(WorkItem {
                source: source.to_string_lossy().into_owned(),
                dest_rel: entry.name.clone(),
                size_bytes: size,
            });
        }
    }
    Ok(finish(items))
}

/// Builds the work list for a pull: selected entries live under `remote_cwd`.
/// Directory subtrees are walked through the bridge's detailed listing, so
/// file sizes are known; an unknown size counts as zero.
pub(crate) fn plan_pull(
    selection: &[Entry],
    remote_cwd: &str,
    backend: &dyn AdbBackend,
) -> Result<TransferPlan> {
    let mut items = Vec::new();
    for entry in selection {
        let source = join_remote(remote_cwd, &entry.name);
        if entry.is_dir() {
            walk_remote(backend, &source, &entry.name, &mut items)?;
        } else {
            items.push(WorkItem {
                source,
                dest_rel: entry.name.clone(),
                size_bytes: entry.size_bytes.unwrap_or(0),
            });
        }
    }
    Ok(finish(items))
}

fn finish(items: Vec<WorkItem>) -> TransferPlan {
    let total: u64 = items.iter().map(|item| item.size_bytes).sum();
    TransferPlan {
        items,
        // Zero total would break the percentage math; 1 keeps it defined.
        total_bytes: total.max(1),
    }
}

fn walk_local(dir: &Path, rel: &str, items: &mut Vec<WorkItem>) -> Result<()> {
    let mut children: Vec<_> = fs::read_dir(dir)
        .with_context(|| format!("read dir {}", dir.display()))?
        .collect::<std::io::Result<_>>()
        .context("read dir entry")?;
    children.sort_by_key(|child| child.file_name());
    for child in children {
        let path = child.path();
        let name = child.file_name().to_string_lossy().into_owned();
        let child_rel = format!("{rel}/{name}");
        let meta = child.metadata().context("stat entry")?;
        if meta.is_dir() {
            walk_local(&path, &child_rel, items)?;
        } else {
            items.push(WorkItem {
                source: path.to_string_lossy().into_owned(),
                dest_rel: child_rel,
                size_bytes: meta.len(),
            });
        }
    }
    Ok(())
}

fn walk_remote(
    backend: &dyn AdbBackend,
    dir: &str,
    rel: &str,
    items: &mut Vec<WorkItem>,
) -> Result<()> {
    for entry in backend.list_dir(dir)? {
        let source = join_remote(dir, &entry.name);
        let child_rel = format!("{rel}/{}", entry.name);
        if entry.is_dir() {
            walk_remote(backend, &source, &child_rel, items)?;
        } else {
            items.push(WorkItem {
                source,
                dest_rel: child_rel,
                size_bytes: entry.size_bytes.unwrap_or(0),
            });
        }
    }
    Ok(())
}
