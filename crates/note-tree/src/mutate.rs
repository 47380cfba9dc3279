//! Insertion and deletion of image nodes.
//!
//! `insert_image` implements the six-step insertion procedure:
//! resolve the insertion point (selection or end-of-document), build
//! the image node, replace any selected content with a block-level
//! wrapper holding only the image, insert a fresh empty block after
//! it, and report the cursor position inside that block. The new
//! block list is assembled completely before being swapped in; on any
//! validation failure the tree is untouched and the caller surfaces a
//! transient status instead of a hard error.

use crate::model::{Block, EditableTree, ImageNode, Inline, Position, Selection, TreeError};

impl EditableTree {
    fn validate(&self, pos: Position) -> Result<(), TreeError> {
        let err = TreeError::InvalidPosition {
            block: pos.block,
            unit: pos.unit,
        };
        match self.blocks.get(pos.block) {
            Some(block) if pos.unit <= block.unit_len() => Ok(()),
            _ => Err(err),
        }
    }

    /// Build an image node from the pieces the host supplies and run
    /// the insertion procedure.
    pub fn insert_image_at_cursor(
        &mut self,
        selection: Option<Selection>,
        display_uri: &str,
        file_name: &str,
        storage_relative_path: &str,
    ) -> Result<Position, TreeError> {
        let node = ImageNode::new(
            display_uri,
            file_name,
            Some(storage_relative_path.to_string()),
        );
        self.insert_image(selection, node)
    }

    /// Insert `node` at the selection (or end-of-document), wrapped in
    /// its own block, followed by a fresh empty block that receives
    /// the cursor.
    pub fn insert_image(
        &mut self,
        selection: Option<Selection>,
        node: ImageNode,
    ) -> Result<Position, TreeError> {
        let sel = match selection {
            Some(sel) => {
                self.validate(sel.start)?;
                self.validate(sel.end)?;
                Selection::new(sel.start, sel.end)
            }
            None => Selection::cursor(self.end_position()),
        };

        let mut work = self.blocks.clone();
        if !sel.is_cursor() {
            remove_range(&mut work, sel);
        }
        let cursor = sel.start;

        let mut rebuilt: Vec<Block> = Vec::with_capacity(work.len() + 2);
        let wrapper = Block::new(vec![Inline::Image(node)]);
        let wrapper_idx;
        if work.is_empty() {
            wrapper_idx = 0;
            rebuilt.push(wrapper);
            rebuilt.push(Block::placeholder());
        } else {
            let (before, after) = work[cursor.block].split_at(cursor.unit);
            rebuilt.extend(work[..cursor.block].iter().cloned());
            // Split fragments that end up empty are dropped; the fresh
            // placeholder block supplies the cursor target instead.
            if !before.is_empty() {
                rebuilt.push(Block::new(before));
            }
            wrapper_idx = rebuilt.len();
            rebuilt.push(wrapper);
            rebuilt.push(Block::placeholder());
            if !after.is_empty() {
                rebuilt.push(Block::new(after));
            }
            rebuilt.extend(work[cursor.block + 1..].iter().cloned());
        }

        // Commit.
        self.blocks = rebuilt;
        let pos = Position::new(wrapper_idx + 1, 0);
        tracing::debug!(
            target: "tree",
            block = pos.block,
            total_blocks = self.blocks.len(),
            "image_inserted"
        );
        Ok(pos)
    }

    /// Remove the image node at `pos`. An emptied wrapper is rewritten
    /// to the `<p><br></p>` placeholder, never removed, so the cursor
    /// keeps a valid target on the same line.
    pub fn delete_image(&mut self, pos: Position) -> Result<(), TreeError> {
        self.validate(pos)?;
        let block = &mut self.blocks[pos.block];
        let mut offset = pos.unit;
        let mut target = None;
        for (idx, inline) in block.children.iter().enumerate() {
            let len = inline.unit_len();
            if offset < len {
                if matches!(inline, Inline::Image(_)) && offset == 0 {
                    target = Some(idx);
                }
                break;
            }
            offset -= len;
        }
        let idx = target.ok_or(TreeError::NotAnImage)?;
        block.children.remove(idx);
        if block.is_content_empty() {
            *block = Block::placeholder();
        }
        tracing::debug!(target: "tree", block = pos.block, "image_deleted");
        Ok(())
    }
}

/// Remove the selected units, merging the boundary blocks.
fn remove_range(blocks: &mut Vec<Block>, sel: Selection) {
    let (start, end) = (sel.start, sel.end);
    if start.block == end.block {
        let (keep_start, _) = blocks[start.block].split_at(start.unit);
        let (_, keep_end) = blocks[start.block].split_at(end.unit);
        blocks[start.block] = Block::new([keep_start, keep_end].concat());
    } else {
        let (keep_start, _) = blocks[start.block].split_at(start.unit);
        let (_, keep_end) = blocks[end.block].split_at(end.unit);
        blocks[start.block] = Block::new([keep_start, keep_end].concat());
        blocks.drain(start.block + 1..=end.block);
    }
}
