//! View process half: the editable tree, the image clipboard, and
//! the session controller with its debounced autosave.
//!
//! The view owns no files. It mirrors the document the host pushes,
//! mutates its tree on user interaction, and sends full envelopes
//! back on save. Failures on this side never block interaction; they
//! surface as transient status text only.

pub mod clipboard;
pub mod session;
pub mod status;

pub use clipboard::{ClipboardAction, ClipboardSlot, ImagePayload, KeyOutcome};
pub use session::{run, SessionController, ViewEvent};
pub use status::StatusLine;
