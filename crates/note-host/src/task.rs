//! Host task: message dispatch around the synchronizer and the
//! image store.
//!
//! One cooperative loop; suspension points are the two channels. The
//! watcher feeds plain ticks — interpretation (own write vs external
//! edit) happens here via the synchronizer so ordering with in-flight
//! saves cannot matter: whatever the file holds when the tick is
//! handled wins.

use crate::images::{ImageStore, StoredImage};
use crate::sync::DocumentSynchronizer;
use anyhow::Context;
use note_doc::DisplayResolver;
use note_protocol::{HostSender, HostToView, ViewReceiver, ViewToHost};
use std::path::PathBuf;
use tokio::sync::mpsc::Receiver;
use tracing::{debug, error, info};

/// Seam for the file-open dialog, which itself is out of scope. The
/// binary supplies a real implementation; tests use fixed paths.
pub trait FilePicker: Send {
    fn pick_image(&self) -> Option<PathBuf>;
}

/// Picker that never picks anything (headless sessions).
pub struct NoPicker;

impl FilePicker for NoPicker {
    fn pick_image(&self) -> Option<PathBuf> {
        None
    }
}

fn insert_push(sync: &DocumentSynchronizer, stored: &StoredImage) -> HostToView {
    HostToView::InsertImage {
        image_uri: sync.resolver().resolve(&stored.file_name),
        image_path: stored.file_name.clone(),
        relative_path: stored.relative_path(),
    }
}

/// Run the host half of a session until the view side goes away.
pub async fn run(
    note_path: PathBuf,
    picker: Box<dyn FilePicker>,
    tx: HostSender,
    mut rx: ViewReceiver,
    mut watch_rx: Receiver<()>,
) -> anyhow::Result<()> {
    let mut sync = DocumentSynchronizer::new(note_path.clone())?;
    let workspace = note_path
        .parent()
        .context("note path has no parent directory")?;
    let store = ImageStore::new(workspace);

    // Initial push; the ready handshake re-pushes for views that
    // attach later.
    let doc = sync.open()?;
    if tx.send(HostToView::Update { content: doc }).await.is_err() {
        return Ok(());
    }

    let mut watch_open = true;
    loop {
        tokio::select! {
            maybe = rx.recv() => {
                let Some(msg) = maybe else { break };
                let push = handle_view_message(&mut sync, &store, picker.as_ref(), msg);
                if let Some(push) = push {
                    if tx.send(push).await.is_err() {
                        break;
                    }
                }
            }
            maybe = watch_rx.recv(), if watch_open => {
                match maybe {
                    None => watch_open = false,
                    Some(()) => match sync.external_change() {
                        Ok(Some(doc)) => {
                            if tx.send(HostToView::Update { content: doc }).await.is_err() {
                                break;
                            }
                        }
                        Ok(None) => {}
                        Err(e) => error!(target: "sync", %e, "external_reload_failed"),
                    },
                }
            }
        }
    }
    info!(target: "sync", path = %note_path.display(), "host_session_ended");
    Ok(())
}

fn handle_view_message(
    sync: &mut DocumentSynchronizer,
    store: &ImageStore,
    picker: &dyn FilePicker,
    msg: ViewToHost,
) -> Option<HostToView> {
    match msg {
        ViewToHost::Ready => Some(HostToView::Update {
            content: sync.display_document(),
        }),
        ViewToHost::Save { content } => match sync.save(content) {
            Ok(ack) => Some(HostToView::Update { content: ack }),
            Err(e) => {
                // Storage failures are always user-visible.
                error!(target: "sync", %e, "save_failed");
                None
            }
        },
        ViewToHost::InsertImage => {
            let Some(source) = picker.pick_image() else {
                debug!(target: "images", "picker_cancelled");
                return None;
            };
            match store.import_file(&source) {
                Ok(stored) => Some(insert_push(sync, &stored)),
                Err(e) => {
                    error!(target: "images", %e, "image_copy_failed");
                    None
                }
            }
        }
        ViewToHost::PasteImage { image_data } => match store.write_pasted(&image_data) {
            Ok(stored) => Some(insert_push(sync, &stored)),
            Err(e) => {
                error!(target: "images", %e, "image_paste_failed");
                None
            }
        },
    }
}
