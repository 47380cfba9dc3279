//! Host process half: owns the filesystem side of a note session.
//!
//! The host holds the authoritative persisted snapshot, stores images
//! next to the note, watches the note file for changes made by other
//! editors, and pushes full-document updates to the view. Everything
//! here suspends only at filesystem boundaries; no memory is shared
//! with the view half.

pub mod images;
pub mod sync;
pub mod task;
pub mod watch;

use std::path::PathBuf;
use thiserror::Error;

/// Host-side failures. Anything touching persistent storage is
/// user-visible by policy (logged as an error where it is handled);
/// the operation that hit it is aborted with no partial writes.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("no workspace root found for {path}")]
    MissingWorkspace { path: PathBuf },
    #[error("invalid image source path {path}")]
    BadSourcePath { path: PathBuf },
    #[error("pasted payload is not a base64 image data URI")]
    BadImageData,
    #[error("base64 decode failed: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("image file operation failed: {0}")]
    ImageIo(#[source] std::io::Error),
    #[error("note file operation failed: {0}")]
    NoteIo(#[source] std::io::Error),
    #[error(transparent)]
    Doc(#[from] note_doc::DocError),
}

pub use images::{ImageStore, StoredImage};
pub use sync::{DocumentSynchronizer, FileUriResolver, SyncState};
pub use task::{run, FilePicker, NoPicker};
pub use watch::spawn_note_watcher;
