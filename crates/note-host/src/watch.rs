//! External change detection on the persisted note.
//!
//! Watches the note's parent directory (not the file itself — the
//! save path replaces the file by rename, which would orphan a
//! per-file watch) and forwards a unit tick for every event touching
//! the note. The synchronizer decides whether a tick was an external
//! edit or the echo of its own write, so ticks can be coalesced
//! freely: a full channel simply drops the duplicate.

use anyhow::Context;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::path::Path;
use tokio::sync::mpsc::Sender;
use tracing::{error, info};

/// Start watching `note_path`. The returned watcher must be kept
/// alive for the session; dropping it stops notifications.
pub fn spawn_note_watcher(note_path: &Path, tx: Sender<()>) -> anyhow::Result<RecommendedWatcher> {
    let parent = note_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .context("note path has no parent directory")?
        .to_path_buf();
    let target: OsString = note_path
        .file_name()
        .context("note path has no file name")?
        .to_os_string();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => {
            let relevant = matches!(
                event.kind,
                EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
            ) && event
                .paths
                .iter()
                .any(|p| p.file_name() == Some(target.as_os_str()));
            if relevant {
                let _ = tx.try_send(());
            }
        }
        Err(e) => error!(target: "watch", %e, "watch_error"),
    })?;
    watcher.watch(&parent, RecursiveMode::NonRecursive)?;
    info!(target: "watch", dir = %parent.display(), "note_watch_started");
    Ok(watcher)
}
