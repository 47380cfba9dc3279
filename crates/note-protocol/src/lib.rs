//! Typed message protocol between the View and Host halves.
//!
//! One bounded mpsc channel per direction; FIFO within a direction,
//! no ordering guarantee across directions. Delivery is at-most-once:
//! a dropped receiver simply ends the sending task. No message
//! requires a correlated reply, so there are no request IDs — an
//! incoming `update` push is authoritative regardless of anything the
//! view has in flight (last-write-wins).
//!
//! The serde shapes mirror the wire contract: a `type` tag plus
//! camelCase payload fields.

use note_doc::NoteDocument;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Channel capacity for both directions. Message volume is tiny
/// (user-interaction scale); the bound exists for backpressure
/// hygiene, not throughput.
pub const CHANNEL_CAP: usize = 64;

/// Messages the view sends to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ViewToHost {
    /// View initialized; host must push the current document.
    Ready,
    /// Persist the full envelope. Content is already storage-form
    /// (the host re-applies the idempotent transform anyway).
    Save { content: NoteDocument },
    /// User requested file-picker based insertion.
    InsertImage,
    /// Inline-pasted raster image as a base64 data URI.
    #[serde(rename_all = "camelCase")]
    PasteImage { image_data: String },
}

/// Messages the host pushes to the view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostToView {
    /// Full document replace, content in display form. Sent on open,
    /// on external change, and as every save acknowledgment.
    Update { content: NoteDocument },
    /// A newly stored image, ready for insertion at the cursor.
    #[serde(rename_all = "camelCase")]
    InsertImage {
        /// Display-resolvable URI for immediate rendering.
        image_uri: String,
        /// Stored filename (becomes the alt text).
        image_path: String,
        /// Portable `images/<file>` path, the authoritative identity.
        relative_path: String,
    },
}

pub type ViewSender = mpsc::Sender<ViewToHost>;
pub type ViewReceiver = mpsc::Receiver<ViewToHost>;
pub type HostSender = mpsc::Sender<HostToView>;
pub type HostReceiver = mpsc::Receiver<HostToView>;

/// Build the paired channels for one session.
pub fn session_channels() -> ((ViewSender, ViewReceiver), (HostSender, HostReceiver)) {
    (
        mpsc::channel(CHANNEL_CAP),
        mpsc::channel(CHANNEL_CAP),
    )
}
