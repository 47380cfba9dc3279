//! Single-slot internal clipboard for image nodes.
//!
//! Explicit session state, not a global: the controller owns one slot
//! and passes it into these operations. A new copy or cut overwrites
//! whatever was there; the slot is never explicitly emptied. Keyboard
//! cut/copy/paste/delete engage this path only when the selection
//! resolves to an image node (or, for paste, when the slot holds
//! one); everything else reports pass-through so native text
//! clipboard behavior stays untouched.

use note_doc::path_codec;
use note_tree::{EditableTree, ImageNode, Position, Selection};
use tracing::debug;

/// Everything needed to reconstruct a cut or copied image node. The
/// storage-relative path is what keeps a pasted image resolvable
/// after reload; the display URI alone would go stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub display_src: String,
    pub alt_text: String,
    pub storage_relative_path: Option<String>,
    pub serialized_node: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ClipboardSlot {
    #[default]
    Empty,
    Image(ImagePayload),
}

/// Keyboard clipboard intents, already stripped of platform key
/// chords by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardAction {
    Cut,
    Copy,
    Paste,
    Delete,
}

/// Whether the image path consumed the key or native text handling
/// should proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Handled,
    PassThrough,
}

/// Capture a node into the slot. Does not touch the document. The
/// explicit storage path is authoritative; derivation from the
/// display URI is the last resort.
pub fn copy_image(slot: &mut ClipboardSlot, node: &ImageNode) {
    let storage_relative_path = node
        .storage_path
        .clone()
        .or_else(|| path_codec::storage_relative_from(&node.display_src));
    *slot = ClipboardSlot::Image(ImagePayload {
        display_src: node.display_src.clone(),
        alt_text: node.alt.clone(),
        storage_relative_path,
        serialized_node: node.to_html(),
    });
    debug!(target: "clipboard", "image_copied");
}

/// Copy followed by delete.
pub fn cut_image(
    tree: &mut EditableTree,
    slot: &mut ClipboardSlot,
    pos: Position,
    node: &ImageNode,
) -> Result<(), note_tree::TreeError> {
    copy_image(slot, node);
    tree.delete_image(pos)
}

/// Synthesize a fresh node from the slot and run the standard
/// insertion procedure. Empty or wrong-kind slot: silent no-op.
pub fn paste_image(
    tree: &mut EditableTree,
    slot: &ClipboardSlot,
    selection: Option<Selection>,
) -> Option<Result<Position, note_tree::TreeError>> {
    let ClipboardSlot::Image(payload) = slot else {
        return None;
    };
    let node = ImageNode::new(
        payload.display_src.clone(),
        payload.alt_text.clone(),
        payload.storage_relative_path.clone(),
    );
    Some(tree.insert_image(selection, node))
}

/// Dispatch a keyboard clipboard action against the current
/// selection.
pub fn handle_key(
    tree: &mut EditableTree,
    slot: &mut ClipboardSlot,
    selection: Selection,
    action: ClipboardAction,
) -> Result<KeyOutcome, note_tree::TreeError> {
    match action {
        ClipboardAction::Copy => match tree.image_at(selection) {
            Some((_, node)) => {
                let node = node.clone();
                copy_image(slot, &node);
                Ok(KeyOutcome::Handled)
            }
            None => Ok(KeyOutcome::PassThrough),
        },
        ClipboardAction::Cut => match tree.image_at(selection) {
            Some((pos, node)) => {
                let node = node.clone();
                cut_image(tree, slot, pos, &node)?;
                Ok(KeyOutcome::Handled)
            }
            None => Ok(KeyOutcome::PassThrough),
        },
        ClipboardAction::Delete => match tree.image_at(selection) {
            Some((pos, _)) => {
                tree.delete_image(pos)?;
                Ok(KeyOutcome::Handled)
            }
            None => Ok(KeyOutcome::PassThrough),
        },
        ClipboardAction::Paste => match paste_image(tree, slot, Some(selection)) {
            Some(result) => result.map(|_| KeyOutcome::Handled),
            // Nothing of ours on the clipboard: let the native text
            // paste happen.
            None => Ok(KeyOutcome::PassThrough),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with_image() -> EditableTree {
        EditableTree::parse(
            r#"<p>text</p><p><img src="file:///ws/images/a.png" alt="a.png" data-storage-path="images/a.png"></p>"#,
        )
    }

    fn image_selection() -> Selection {
        Selection::cursor(Position::new(1, 0))
    }

    #[test]
    fn copy_then_paste_preserves_storage_path() {
        let mut tree = tree_with_image();
        let mut slot = ClipboardSlot::default();
        let (_, node) = tree.image_at(image_selection()).unwrap();
        let node = node.clone();
        copy_image(&mut slot, &node);

        let pos = paste_image(&mut tree, &slot, None).unwrap().unwrap();
        // The pasted node carries the same storage-relative path even
        // though display URIs could differ between sessions.
        let html = tree.to_html();
        assert_eq!(html.matches(r#"data-storage-path="images/a.png""#).count(), 2);
        assert!(pos.block > 0);
    }

    #[test]
    fn copy_derives_storage_path_when_attribute_absent() {
        let tree = EditableTree::parse(r#"<p><img src="file:///ws/images/b.png" alt="b"></p>"#);
        let mut slot = ClipboardSlot::default();
        let (_, node) = tree.image_at(Selection::cursor(Position::new(0, 0))).unwrap();
        let node = node.clone();
        copy_image(&mut slot, &node);
        match slot {
            ClipboardSlot::Image(payload) => {
                assert_eq!(payload.storage_relative_path.as_deref(), Some("images/b.png"));
                assert!(payload.serialized_node.starts_with("<img "));
            }
            other => panic!("expected image slot, got {other:?}"),
        }
    }

    #[test]
    fn paste_on_empty_slot_is_silent_noop() {
        let mut tree = tree_with_image();
        let before = tree.clone();
        let slot = ClipboardSlot::default();
        assert!(paste_image(&mut tree, &slot, None).is_none());
        assert_eq!(tree, before);
    }

    #[test]
    fn cut_captures_then_removes_with_placeholder() {
        let mut tree = tree_with_image();
        let mut slot = ClipboardSlot::default();
        let (pos, node) = tree.image_at(image_selection()).unwrap();
        let node = node.clone();
        cut_image(&mut tree, &mut slot, pos, &node).unwrap();
        assert_eq!(tree.to_html(), "<p>text</p><p><br></p>");
        assert!(matches!(slot, ClipboardSlot::Image(_)));
    }

    #[test]
    fn new_copy_overwrites_prior_slot() {
        let mut slot = ClipboardSlot::default();
        copy_image(&mut slot, &ImageNode::new("file:///x/images/1.png", "1", None));
        copy_image(&mut slot, &ImageNode::new("file:///x/images/2.png", "2", None));
        match slot {
            ClipboardSlot::Image(payload) => assert_eq!(payload.alt_text, "2"),
            other => panic!("expected image slot, got {other:?}"),
        }
    }

    #[test]
    fn keyboard_falls_through_on_text_selection() {
        let mut tree = tree_with_image();
        let mut slot = ClipboardSlot::default();
        let text_sel = Selection::new(Position::new(0, 0), Position::new(0, 4));
        for action in [
            ClipboardAction::Cut,
            ClipboardAction::Copy,
            ClipboardAction::Delete,
        ] {
            let outcome = handle_key(&mut tree, &mut slot, text_sel, action).unwrap();
            assert_eq!(outcome, KeyOutcome::PassThrough);
        }
        // Paste with an empty slot also defers to native handling.
        let outcome =
            handle_key(&mut tree, &mut slot, text_sel, ClipboardAction::Paste).unwrap();
        assert_eq!(outcome, KeyOutcome::PassThrough);
        assert_eq!(tree, tree_with_image());
    }

    #[test]
    fn keyboard_engages_on_image_selection() {
        let mut tree = tree_with_image();
        let mut slot = ClipboardSlot::default();
        let outcome =
            handle_key(&mut tree, &mut slot, image_selection(), ClipboardAction::Copy).unwrap();
        assert_eq!(outcome, KeyOutcome::Handled);
        let outcome =
            handle_key(&mut tree, &mut slot, image_selection(), ClipboardAction::Delete).unwrap();
        assert_eq!(outcome, KeyOutcome::Handled);
        assert_eq!(tree.to_html(), "<p>text</p><p><br></p>");
    }
}
