//! Session controller: the view-side event loop.
//!
//! Owns the editable tree, the clipboard slot, the status line, and
//! the autosave debounce. Exactly one pending deadline exists at a
//! time; every edit pushes it out, a manual save or an incoming host
//! update cancels it, and teardown flushes whatever is still dirty.
//! Host pushes always win over local state (last-write-wins): an
//! `update` replaces the tree wholesale and drops any pending save of
//! the content it just replaced.

use crate::clipboard::{self, ClipboardAction, ClipboardSlot, KeyOutcome};
use crate::status::StatusLine;
use chrono::Utc;
use note_doc::{path_codec, NoteDocument};
use note_protocol::{HostReceiver, HostToView, ViewSender, ViewToHost};
use note_tree::{EditableTree, Selection};
use std::time::Duration;
use tokio::sync::mpsc::Receiver;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// User interactions delivered by the surrounding UI layer.
#[derive(Debug, Clone)]
pub enum ViewEvent {
    /// Any text-level change to the document.
    Edited,
    /// Explicit save gesture.
    SaveRequested,
    /// File-picker insertion gesture; the host does the picking.
    InsertImageRequested,
    /// Raster data captured from the system clipboard.
    PasteData { image_data: String },
    Clipboard(ClipboardAction),
    SelectionChanged(Selection),
    Shutdown,
}

pub struct SessionController {
    tree: EditableTree,
    clipboard: ClipboardSlot,
    status: StatusLine,
    selection: Option<Selection>,
    dirty: bool,
    deadline: Option<Instant>,
    quiet: Duration,
    tx: ViewSender,
}

impl SessionController {
    pub fn new(tx: ViewSender, quiet: Duration, status_linger: Duration) -> Self {
        Self {
            tree: EditableTree::parse(note_doc::DEFAULT_CONTENT),
            clipboard: ClipboardSlot::default(),
            status: StatusLine::new(status_linger),
            selection: None,
            dirty: false,
            deadline: None,
            quiet,
            tx,
        }
    }

    pub fn tree(&self) -> &EditableTree {
        &self.tree
    }

    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Register an edit: mark dirty and push the autosave deadline out
    /// to one full quiet window from now.
    pub fn note_edit(&mut self) {
        self.dirty = true;
        self.deadline = Some(Instant::now() + self.quiet);
    }

    /// Adopt a host push wholesale, discarding local pending state.
    pub fn apply_update(&mut self, doc: NoteDocument) {
        if self.dirty {
            warn!(target: "session", "pending_local_edits_superseded");
        }
        self.tree = EditableTree::parse(&doc.content);
        self.selection = None;
        self.dirty = false;
        self.deadline = None;
        debug!(target: "session", blocks = self.tree.blocks().len(), "document_replaced");
    }

    /// Run the insertion procedure with the pieces the host resolved.
    pub fn apply_host_insert(&mut self, image_uri: &str, image_path: &str, relative_path: &str) {
        match self
            .tree
            .insert_image_at_cursor(self.selection, image_uri, image_path, relative_path)
        {
            Ok(pos) => {
                self.selection = Some(Selection::cursor(pos));
                self.note_edit();
            }
            Err(e) => {
                warn!(target: "session", %e, "image_insert_refused");
                self.status.show(format!("cannot insert image: {e}"));
            }
        }
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = Some(selection);
    }

    /// Keyboard clipboard dispatch. Refusals become status text, never
    /// errors; a pass-through outcome means native text handling runs.
    pub fn handle_clipboard(&mut self, action: ClipboardAction) -> KeyOutcome {
        let Some(selection) = self.selection else {
            return KeyOutcome::PassThrough;
        };
        match clipboard::handle_key(&mut self.tree, &mut self.clipboard, selection, action) {
            Ok(KeyOutcome::Handled) => {
                if !matches!(action, ClipboardAction::Copy) {
                    self.note_edit();
                }
                KeyOutcome::Handled
            }
            Ok(KeyOutcome::PassThrough) => KeyOutcome::PassThrough,
            Err(e) => {
                self.status.show(format!("clipboard action failed: {e}"));
                KeyOutcome::Handled
            }
        }
    }

    /// Full storage-form envelope of the current tree: content with
    /// canonical srcs, the recomputed manifest, a fresh stamp.
    pub fn snapshot_document(&self) -> NoteDocument {
        let content = path_codec::to_storage(&self.tree.to_html());
        let images = path_codec::recompute_manifest(&content);
        NoteDocument {
            content,
            images,
            last_modified: Some(Utc::now()),
        }
    }

    /// Send a save and clear the pending deadline. Returns false when
    /// the host side is gone.
    async fn send_save(&mut self, reason: &str) -> bool {
        let doc = self.snapshot_document();
        self.dirty = false;
        self.deadline = None;
        debug!(target: "session", reason, "save_sent");
        self.tx
            .send(ViewToHost::Save { content: doc })
            .await
            .is_ok()
    }

    async fn handle_event(&mut self, event: ViewEvent) -> bool {
        match event {
            ViewEvent::Edited => {
                self.note_edit();
                true
            }
            ViewEvent::SaveRequested => self.send_save("manual").await,
            ViewEvent::InsertImageRequested => {
                self.tx.send(ViewToHost::InsertImage).await.is_ok()
            }
            ViewEvent::PasteData { image_data } => self
                .tx
                .send(ViewToHost::PasteImage { image_data })
                .await
                .is_ok(),
            ViewEvent::Clipboard(action) => {
                self.handle_clipboard(action);
                true
            }
            ViewEvent::SelectionChanged(selection) => {
                self.set_selection(selection);
                true
            }
            ViewEvent::Shutdown => false,
        }
    }

    /// Teardown path: one final save if edits are still unsaved.
    async fn flush_pending(&mut self) {
        if self.dirty {
            let _ = self.send_save("flush").await;
        }
    }
}

/// Run the view half of a session until shutdown or until either
/// channel closes.
pub async fn run(
    tx: ViewSender,
    mut rx: HostReceiver,
    mut events_rx: Receiver<ViewEvent>,
    quiet: Duration,
    status_linger: Duration,
) -> anyhow::Result<()> {
    let mut ctrl = SessionController::new(tx, quiet, status_linger);

    // Handshake: ask the host for the current document.
    if ctrl.tx.send(ViewToHost::Ready).await.is_err() {
        return Ok(());
    }

    loop {
        let deadline = ctrl.deadline();
        tokio::select! {
            maybe = rx.recv() => {
                let Some(push) = maybe else { break };
                match push {
                    HostToView::Update { content } => ctrl.apply_update(content),
                    HostToView::InsertImage {
                        image_uri,
                        image_path,
                        relative_path,
                    } => ctrl.apply_host_insert(&image_uri, &image_path, &relative_path),
                }
            }
            maybe = events_rx.recv() => {
                match maybe {
                    None => break,
                    Some(event) => {
                        if !ctrl.handle_event(event).await {
                            break;
                        }
                    }
                }
            }
            _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)),
                if deadline.is_some() =>
            {
                if !ctrl.send_save("autosave").await {
                    break;
                }
            }
        }
    }

    ctrl.flush_pending().await;
    info!(target: "session", "view_session_ended");
    Ok(())
}
