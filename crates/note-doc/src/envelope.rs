//! The persisted JSON envelope: `{content, images, lastModified}`.
//!
//! Loading is lenient by contract: a zero-length, whitespace-only, or
//! unparseable payload degrades to the empty-note default instead of
//! propagating an error. Malformed persisted state must never make a
//! note unopenable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Content of a freshly-defaulted (empty or unreadable) note.
pub const DEFAULT_CONTENT: &str = "<p></p>";
/// Content seeded into a note created through the note-creation action.
pub const SEED_CONTENT: &str = "<p>Start typing your note here...</p>";

#[derive(Debug, Error)]
pub enum DocError {
    #[error("envelope serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The full persisted document. `images` maps ordinal keys
/// (`image_0`, `image_1`, ...) to storage-relative paths
/// (`images/<file>`); it is recomputed from `content` on every save,
/// so it is derived state on disk rather than an independent source
/// of truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDocument {
    pub content: String,
    #[serde(default)]
    pub images: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
}

impl Default for NoteDocument {
    fn default() -> Self {
        Self {
            content: DEFAULT_CONTENT.to_string(),
            images: BTreeMap::new(),
            last_modified: None,
        }
    }
}

impl NoteDocument {
    /// Initial envelope for a newly created note.
    pub fn seed() -> Self {
        Self {
            content: SEED_CONTENT.to_string(),
            images: BTreeMap::new(),
            last_modified: None,
        }
    }

    /// Parse persisted bytes. Empty and non-JSON payloads both yield
    /// the default empty-note envelope.
    pub fn parse(text: &str) -> Self {
        if text.trim().is_empty() {
            return Self::default();
        }
        match serde_json::from_str::<Self>(text) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(
                    target: "doc",
                    %e,
                    size_bytes = text.len(),
                    "malformed_envelope_defaulted"
                );
                Self::default()
            }
        }
    }

    /// Serialize to the pretty-printed UTF-8 JSON form that replaces
    /// the persisted file wholesale on save.
    pub fn to_pretty_json(&self) -> Result<String, DocError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Stamp a new modification time (UTC, serialized as ISO-8601).
    pub fn touch(&mut self) {
        self.last_modified = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_defaults() {
        let doc = NoteDocument::parse("");
        assert_eq!(doc.content, DEFAULT_CONTENT);
        assert!(doc.images.is_empty());
        assert!(doc.last_modified.is_none());
    }

    #[test]
    fn whitespace_only_defaults() {
        let doc = NoteDocument::parse("  \n\t ");
        assert_eq!(doc, NoteDocument::default());
    }

    #[test]
    fn non_json_defaults_without_raising() {
        let doc = NoteDocument::parse("this is not json {");
        assert_eq!(doc.content, DEFAULT_CONTENT);
        assert!(doc.images.is_empty());
    }

    #[test]
    fn parses_full_envelope() {
        let text = r#"{
  "content": "<p>hi</p>",
  "images": { "image_0": "images/a.png" },
  "lastModified": "2024-06-01T12:00:00Z"
}"#;
        let doc = NoteDocument::parse(text);
        assert_eq!(doc.content, "<p>hi</p>");
        assert_eq!(doc.images.get("image_0").map(String::as_str), Some("images/a.png"));
        assert!(doc.last_modified.is_some());
    }

    #[test]
    fn missing_optional_fields_tolerated() {
        // Seeded notes carry no lastModified and may omit images.
        let doc = NoteDocument::parse(r#"{ "content": "<p></p>" }"#);
        assert_eq!(doc.content, "<p></p>");
        assert!(doc.images.is_empty());
    }

    #[test]
    fn pretty_json_uses_camel_case_and_omits_absent_stamp() {
        let doc = NoteDocument::seed();
        let json = doc.to_pretty_json().unwrap();
        assert!(json.contains("\"content\""));
        assert!(json.contains("\"images\""));
        assert!(!json.contains("lastModified"));
        assert!(!json.contains("last_modified"));
    }

    #[test]
    fn touch_round_trips_through_json() {
        let mut doc = NoteDocument::default();
        doc.touch();
        let json = doc.to_pretty_json().unwrap();
        assert!(json.contains("lastModified"));
        let back = NoteDocument::parse(&json);
        assert_eq!(back.last_modified, doc.last_modified);
    }
}
