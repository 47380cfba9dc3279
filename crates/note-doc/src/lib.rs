//! Persisted note document model and the image path codec.
//!
//! This is the leaf crate of the workspace: pure data plus pure
//! transforms, no IO and no channels. The envelope (`NoteDocument`)
//! is the JSON shape that hits disk; the codec rewrites embedded
//! image `src` attributes between the portable storage-relative form
//! (`./images/<file>`, the only form allowed at rest) and whatever
//! display-resolvable URI the host environment serves images under.

pub mod envelope;
pub mod path_codec;

/// Fixed name of the image directory sibling to the note. Baked into
/// the at-rest `./images/<file>` contract, so not configurable.
pub const IMAGES_DIR: &str = "images";

pub use envelope::{DocError, NoteDocument, DEFAULT_CONTENT, SEED_CONTENT};
pub use path_codec::{
    recompute_manifest, storage_relative_from, to_display, to_storage, DisplayResolver,
};
