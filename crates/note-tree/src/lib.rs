//! Editable document tree owned by the view process.
//!
//! The tree abstracts the host platform's range/selection machinery
//! into three node kinds: opaque markup runs (text plus whatever
//! inline formatting the host text primitive produced — this crate
//! never interprets it), image nodes, and the `<br>` placeholder that
//! keeps an emptied block a valid cursor target. Positions count
//! units within a block: one unit per markup character, one per image
//! or line break.
//!
//! Mutations follow a build-then-commit pattern: the replacement
//! block list is constructed fully before it is swapped in, so a
//! failed insertion leaves the tree exactly as it was.

mod html;
mod model;
mod mutate;

pub use model::{Block, EditableTree, ImageNode, Inline, Position, Selection, TreeError};
