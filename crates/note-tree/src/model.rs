//! Node kinds, positions, and selection normalization.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("position {block}:{unit} outside document")]
    InvalidPosition { block: usize, unit: usize },
    #[error("no image node at the target position")]
    NotAnImage,
}

/// An embedded image. `storage_path` is the authoritative
/// storage-relative path (`images/<file>`); once present it is never
/// re-derived from the display URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageNode {
    pub display_src: String,
    pub alt: String,
    pub storage_path: Option<String>,
}

impl ImageNode {
    pub fn new(
        display_src: impl Into<String>,
        alt: impl Into<String>,
        storage_path: Option<String>,
    ) -> Self {
        Self {
            display_src: display_src.into(),
            alt: alt.into(),
            storage_path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    /// Raw inline HTML carried through untouched (lossless round-trip
    /// for formatting this engine does not interpret).
    Markup(String),
    Image(ImageNode),
    /// `<br>`: the empty-line placeholder.
    LineBreak,
}

impl Inline {
    /// Position units this node occupies.
    pub fn unit_len(&self) -> usize {
        match self {
            Inline::Markup(text) => text.chars().count(),
            Inline::Image(_) | Inline::LineBreak => 1,
        }
    }
}

/// One block-level wrapper (`<p>`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    pub children: Vec<Inline>,
}

impl Block {
    pub fn new(children: Vec<Inline>) -> Self {
        Self { children }
    }

    /// A visually-empty-but-valid block: `<p><br></p>`.
    pub fn placeholder() -> Self {
        Self {
            children: vec![Inline::LineBreak],
        }
    }

    pub fn unit_len(&self) -> usize {
        self.children.iter().map(Inline::unit_len).sum()
    }

    pub fn is_content_empty(&self) -> bool {
        self.children.iter().all(|inline| match inline {
            Inline::Markup(text) => text.is_empty(),
            Inline::LineBreak => true,
            Inline::Image(_) => false,
        })
    }

    /// Split children at a unit offset, cutting markup runs on the
    /// character boundary. Offsets past the end clamp to the end.
    pub(crate) fn split_at(&self, unit: usize) -> (Vec<Inline>, Vec<Inline>) {
        let mut before = Vec::new();
        let mut after = Vec::new();
        let mut remaining = unit;
        for inline in &self.children {
            let len = inline.unit_len();
            if remaining >= len {
                remaining -= len;
                before.push(inline.clone());
            } else if remaining == 0 {
                after.push(inline.clone());
            } else {
                match inline {
                    Inline::Markup(text) => {
                        let byte = text
                            .char_indices()
                            .nth(remaining)
                            .map(|(i, _)| i)
                            .unwrap_or(text.len());
                        before.push(Inline::Markup(text[..byte].to_string()));
                        after.push(Inline::Markup(text[byte..].to_string()));
                    }
                    // Atomic nodes cannot be split; remaining is 0 for
                    // them by the arm above.
                    other => after.push(other.clone()),
                }
                remaining = 0;
            }
        }
        (before, after)
    }
}

/// A unit-granular location: block index plus unit offset inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub block: usize,
    pub unit: usize,
}

impl Position {
    pub fn new(block: usize, unit: usize) -> Self {
        Self { block, unit }
    }
}

/// Normalized selection span (`start <= end`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub start: Position,
    pub end: Position,
}

impl Selection {
    pub fn new(a: Position, b: Position) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    pub fn cursor(pos: Position) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    pub fn is_cursor(&self) -> bool {
        self.start == self.end
    }
}

/// The whole editable document: an ordered list of blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditableTree {
    pub(crate) blocks: Vec<Block>,
}

impl EditableTree {
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Position after the last unit of the last block; start of an
    /// empty document.
    pub fn end_position(&self) -> Position {
        match self.blocks.last() {
            Some(last) => Position::new(self.blocks.len() - 1, last.unit_len()),
            None => Position::new(0, 0),
        }
    }

    pub(crate) fn clamp(&self, pos: Position) -> Position {
        if self.blocks.is_empty() {
            return Position::new(0, 0);
        }
        let block = pos.block.min(self.blocks.len() - 1);
        let unit = pos.unit.min(self.blocks[block].unit_len());
        Position::new(block, unit)
    }

    /// The inline node a position falls on, with the unit offset into
    /// it. `None` at block end.
    pub fn inline_at(&self, pos: Position) -> Option<(&Inline, usize)> {
        let block = self.blocks.get(pos.block)?;
        let mut offset = pos.unit;
        for inline in &block.children {
            let len = inline.unit_len();
            if offset < len {
                return Some((inline, offset));
            }
            offset -= len;
        }
        None
    }

    /// Resolve a selection to an image node, per the image-clipboard
    /// engagement rule: a collapsed cursor sitting on an image, or a
    /// selection spanning exactly one unit that is an image. Anything
    /// else is not an image target and keyboard handling must fall
    /// through to native text behavior.
    pub fn image_at(&self, selection: Selection) -> Option<(Position, &ImageNode)> {
        let sel = Selection::new(self.clamp(selection.start), self.clamp(selection.end));
        if !sel.is_cursor() {
            let single_unit = sel.start.block == sel.end.block && sel.end.unit == sel.start.unit + 1;
            if !single_unit {
                return None;
            }
        }
        match self.inline_at(sel.start) {
            Some((Inline::Image(node), 0)) => Some((sel.start, node)),
            _ => None,
        }
    }
}
