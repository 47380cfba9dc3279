//! Document synchronizer: the host-side state machine.
//!
//! States: `Unloaded -> Loading -> Ready <-> Saving`. Loading is
//! lenient (malformed bytes degrade to the default envelope), saving
//! rewrites content to storage form, recomputes the manifest in
//! document order, stamps `lastModified`, and replaces the whole
//! persisted file atomically (temp file + rename in the same
//! directory). External changes re-enter Loading; last external
//! write wins, there is no merge.
//!
//! The synchronizer remembers the exact text of its own last write so
//! the file watcher's echo of that write is not misread as an
//! external edit.

use crate::HostError;
use note_doc::{path_codec, DisplayResolver, NoteDocument};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Unloaded,
    Loading,
    Ready,
    Saving,
}

/// Resolver bound to the note's image directory, producing `file://`
/// URIs the view can load directly.
#[derive(Debug, Clone)]
pub struct FileUriResolver {
    images_dir: PathBuf,
}

impl FileUriResolver {
    pub fn new(images_dir: PathBuf) -> Self {
        Self { images_dir }
    }
}

impl DisplayResolver for FileUriResolver {
    fn resolve(&self, file_name: &str) -> String {
        format!("file://{}", self.images_dir.join(file_name).display())
    }
}

#[derive(Debug)]
pub struct DocumentSynchronizer {
    note_path: PathBuf,
    state: SyncState,
    /// Authoritative persisted snapshot, storage form.
    snapshot: NoteDocument,
    /// Exact text of the last write this synchronizer made.
    last_written: Option<String>,
    resolver: FileUriResolver,
}

impl DocumentSynchronizer {
    pub fn new(note_path: PathBuf) -> Result<Self, HostError> {
        let workspace = note_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .ok_or_else(|| HostError::MissingWorkspace {
                path: note_path.clone(),
            })?;
        Ok(Self {
            resolver: FileUriResolver::new(workspace.join(note_doc::IMAGES_DIR)),
            note_path,
            state: SyncState::Unloaded,
            snapshot: NoteDocument::default(),
            last_written: None,
        })
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn note_path(&self) -> &Path {
        &self.note_path
    }

    pub fn resolver(&self) -> &FileUriResolver {
        &self.resolver
    }

    /// Seed a brand-new note file.
    pub fn create_note(path: &Path) -> Result<(), HostError> {
        let seed = NoteDocument::seed().to_pretty_json()?;
        fs::write(path, seed).map_err(HostError::NoteIo)?;
        info!(target: "sync", path = %path.display(), "note_created");
        Ok(())
    }

    fn read_persisted(&self) -> Result<String, HostError> {
        match fs::read_to_string(&self.note_path) {
            Ok(text) => Ok(text),
            // A missing file is an empty note, not a failure.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(HostError::NoteIo(e)),
        }
    }

    /// Display-form copy of the current snapshot, for pushing to the
    /// view.
    pub fn display_document(&self) -> NoteDocument {
        let mut doc = self.snapshot.clone();
        doc.content = path_codec::to_display(&doc.content, &self.resolver);
        doc
    }

    /// `Unloaded -> Loading -> Ready`: parse persisted bytes (lenient)
    /// and return the display-form document to push.
    pub fn open(&mut self) -> Result<NoteDocument, HostError> {
        self.state = SyncState::Loading;
        let text = self.read_persisted()?;
        self.snapshot = NoteDocument::parse(&text);
        self.state = SyncState::Ready;
        debug!(
            target: "sync",
            path = %self.note_path.display(),
            content_bytes = self.snapshot.content.len(),
            images = self.snapshot.images.len(),
            "document_opened"
        );
        Ok(self.display_document())
    }

    /// `Ready -> Saving -> Ready`: normalize, stamp, and atomically
    /// replace the persisted file. Returns the display-form document
    /// for the save-acknowledgment push.
    pub fn save(&mut self, incoming: NoteDocument) -> Result<NoteDocument, HostError> {
        self.state = SyncState::Saving;
        let mut doc = incoming;
        // Idempotent: the view already sends storage form.
        doc.content = path_codec::to_storage(&doc.content);
        doc.images = path_codec::recompute_manifest(&doc.content);
        doc.touch();

        let json = doc.to_pretty_json()?;
        let tmp = self.note_path.with_extension("note.tmp");
        let write = fs::write(&tmp, &json)
            .and_then(|_| fs::rename(&tmp, &self.note_path));
        if let Err(e) = write {
            let _ = fs::remove_file(&tmp);
            self.state = SyncState::Ready;
            return Err(HostError::NoteIo(e));
        }

        self.last_written = Some(json);
        self.snapshot = doc;
        self.state = SyncState::Ready;
        info!(
            target: "sync",
            path = %self.note_path.display(),
            images = self.snapshot.images.len(),
            "document_saved"
        );
        Ok(self.display_document())
    }

    /// Handle a watcher notification. Returns the display-form
    /// document to push when the change came from outside, `None`
    /// when it was the echo of this synchronizer's own write.
    pub fn external_change(&mut self) -> Result<Option<NoteDocument>, HostError> {
        let text = self.read_persisted()?;
        if self.last_written.as_deref() == Some(text.as_str()) {
            debug!(target: "sync", "own_write_echo_ignored");
            return Ok(None);
        }
        // Last external write wins; any unsaved view edits are
        // overwritten. Known gap: no merge strategy.
        warn!(
            target: "sync",
            path = %self.note_path.display(),
            "external_change_overwrites_view"
        );
        self.state = SyncState::Loading;
        self.snapshot = NoteDocument::parse(&text);
        self.last_written = None;
        self.state = SyncState::Ready;
        Ok(Some(self.display_document()))
    }
}
