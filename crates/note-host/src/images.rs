//! Image storage sibling to the note.
//!
//! The `images/` directory is shared by every note in the workspace:
//! creation is idempotent and filename collisions are avoided by
//! millisecond-timestamp prefixes rather than locking. Picker files
//! keep their original basename behind the prefix; pasted rasters are
//! always written as PNG.

use crate::HostError;
use base64::Engine;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::info;

fn data_uri_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^data:image/\w+;base64,").expect("static regex"))
}

/// An image that landed in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub file_name: String,
    pub path: PathBuf,
}

impl StoredImage {
    /// Portable `images/<file>` form used in the manifest and on the
    /// wire.
    pub fn relative_path(&self) -> String {
        format!("{}/{}", note_doc::IMAGES_DIR, self.file_name)
    }
}

#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    /// `workspace_root` is the directory holding the note file.
    pub fn new(workspace_root: &Path) -> Self {
        Self {
            root: workspace_root.join(note_doc::IMAGES_DIR),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Idempotent: already-existing directories are not an error.
    fn ensure_dir(&self) -> Result<(), HostError> {
        fs::create_dir_all(&self.root).map_err(HostError::ImageIo)
    }

    fn timestamp_millis() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    /// Copy a picker-selected file into the store as
    /// `<millis>-<basename>`, overwriting any same-named target.
    pub fn import_file(&self, source: &Path) -> Result<StoredImage, HostError> {
        self.ensure_dir()?;
        let base = source
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or_else(|| HostError::BadSourcePath {
                path: source.to_path_buf(),
            })?;
        let file_name = format!("{}-{}", Self::timestamp_millis(), base);
        let dest = self.root.join(&file_name);
        fs::copy(source, &dest).map_err(HostError::ImageIo)?;
        info!(target: "images", file = %file_name, "image_copied");
        Ok(StoredImage {
            file_name,
            path: dest,
        })
    }

    /// Decode an inline-pasted `data:image/*;base64,` payload and
    /// write it as `pasted-<millis>.png`.
    pub fn write_pasted(&self, data_uri: &str) -> Result<StoredImage, HostError> {
        let m = data_uri_prefix_re()
            .find(data_uri)
            .ok_or(HostError::BadImageData)?;
        let bytes = base64::engine::general_purpose::STANDARD.decode(&data_uri[m.end()..])?;
        self.ensure_dir()?;
        let file_name = format!("pasted-{}.png", Self::timestamp_millis());
        let dest = self.root.join(&file_name);
        fs::write(&dest, bytes).map_err(HostError::ImageIo)?;
        info!(target: "images", file = %file_name, size_bytes = data_uri.len(), "image_pasted");
        Ok(StoredImage {
            file_name,
            path: dest,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;

    #[test]
    fn import_prefixes_basename_and_copies() {
        let ws = tempfile::tempdir().unwrap();
        let src_dir = tempfile::tempdir().unwrap();
        let src = src_dir.path().join("cat.png");
        fs::write(&src, b"pngbytes").unwrap();

        let store = ImageStore::new(ws.path());
        let stored = store.import_file(&src).unwrap();
        assert!(stored.file_name.ends_with("-cat.png"));
        assert!(stored.relative_path().starts_with("images/"));
        assert_eq!(fs::read(&stored.path).unwrap(), b"pngbytes");
        assert!(ws.path().join("images").is_dir());
    }

    #[test]
    fn store_dir_creation_is_idempotent() {
        let ws = tempfile::tempdir().unwrap();
        let store = ImageStore::new(ws.path());
        store.ensure_dir().unwrap();
        // Second creation over an existing directory is swallowed.
        store.ensure_dir().unwrap();
    }

    #[test]
    fn pasted_payload_decodes_to_png_file() {
        let ws = tempfile::tempdir().unwrap();
        let store = ImageStore::new(ws.path());
        let payload = base64::engine::general_purpose::STANDARD.encode(b"rawpixels");
        let uri = format!("data:image/png;base64,{payload}");
        let stored = store.write_pasted(&uri).unwrap();
        assert!(stored.file_name.starts_with("pasted-"));
        assert!(stored.file_name.ends_with(".png"));
        assert_eq!(fs::read(&stored.path).unwrap(), b"rawpixels");
    }

    #[test]
    fn pasted_payload_without_data_uri_prefix_is_rejected() {
        let ws = tempfile::tempdir().unwrap();
        let store = ImageStore::new(ws.path());
        let err = store.write_pasted("not-a-data-uri").unwrap_err();
        assert!(matches!(err, HostError::BadImageData));
        // Nothing was written.
        assert!(!ws.path().join("images").exists());
    }

    #[test]
    fn garbage_base64_is_a_decode_error() {
        let ws = tempfile::tempdir().unwrap();
        let store = ImageStore::new(ws.path());
        let err = store
            .write_pasted("data:image/png;base64,!!!not-base64!!!")
            .unwrap_err();
        assert!(matches!(err, HostError::Decode(_)));
    }
}
