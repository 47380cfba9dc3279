//! HTML fragment parsing and serialization.
//!
//! The on-wire content is a flat fragment of `<p>` blocks. Anything
//! inside a block that is not an `<img>` or `<br>` tag is kept as a
//! raw markup run, so inline formatting produced by the host text
//! primitive survives a parse/serialize round trip byte-for-byte.
//! Blocks we serialize never carry attributes of their own.

use crate::model::{Block, EditableTree, ImageNode, Inline};
use regex::Regex;
use std::sync::OnceLock;

/// Auxiliary attribute carrying the authoritative storage-relative
/// path on an image node.
pub const STORAGE_PATH_ATTR: &str = "data-storage-path";

fn block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<p\b[^>]*>(.*?)</p>").expect("static regex"))
}

fn inline_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<img\b[^>]*>|<br\s*/?>").expect("static regex"))
}

fn attr_re(name: &str) -> Regex {
    Regex::new(&format!(r#"(?i)\b{name}\s*=\s*"([^"]*)""#)).expect("static regex")
}

fn src_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| attr_re("src"))
}

fn alt_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| attr_re("alt"))
}

fn storage_path_attr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| attr_re(STORAGE_PATH_ATTR))
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn unescape_attr(value: &str) -> String {
    value
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

fn attr_value(re: &Regex, tag: &str) -> Option<String> {
    re.captures(tag).map(|caps| unescape_attr(&caps[1]))
}

fn parse_image_tag(tag: &str) -> ImageNode {
    ImageNode {
        display_src: attr_value(src_re(), tag).unwrap_or_default(),
        alt: attr_value(alt_re(), tag).unwrap_or_default(),
        storage_path: attr_value(storage_path_attr_re(), tag),
    }
}

fn parse_inline(inner: &str) -> Vec<Inline> {
    let mut children = Vec::new();
    let mut last = 0;
    for m in inline_token_re().find_iter(inner) {
        if m.start() > last {
            children.push(Inline::Markup(inner[last..m.start()].to_string()));
        }
        let tag = m.as_str();
        if tag[1..].trim_start().starts_with(['i', 'I']) {
            children.push(Inline::Image(parse_image_tag(tag)));
        } else {
            children.push(Inline::LineBreak);
        }
        last = m.end();
    }
    if last < inner.len() {
        children.push(Inline::Markup(inner[last..].to_string()));
    }
    children
}

impl ImageNode {
    /// Serialize a single image tag, alt first to match the insertion
    /// engine's construction order on the host platform.
    pub fn to_html(&self) -> String {
        let mut tag = format!(
            r#"<img src="{}" alt="{}""#,
            escape_attr(&self.display_src),
            escape_attr(&self.alt)
        );
        if let Some(path) = &self.storage_path {
            tag.push_str(&format!(r#" {STORAGE_PATH_ATTR}="{}""#, escape_attr(path)));
        }
        tag.push('>');
        tag
    }
}

impl EditableTree {
    /// Parse an HTML fragment into blocks. Content outside any `<p>`
    /// wrapper becomes its own block; an empty fragment yields one
    /// empty block so the cursor always has a target.
    pub fn parse(html: &str) -> Self {
        let mut blocks = Vec::new();
        let mut last = 0;
        for caps in block_re().captures_iter(html) {
            let whole = caps.get(0).expect("match group 0");
            let gap = &html[last..whole.start()];
            if !gap.trim().is_empty() {
                blocks.push(Block::new(parse_inline(gap)));
            }
            blocks.push(Block::new(parse_inline(&caps[1])));
            last = whole.end();
        }
        let tail = &html[last..];
        if !tail.trim().is_empty() {
            blocks.push(Block::new(parse_inline(tail)));
        }
        if blocks.is_empty() {
            blocks.push(Block::default());
        }
        Self { blocks }
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for block in &self.blocks {
            out.push_str("<p>");
            for inline in &block.children {
                match inline {
                    Inline::Markup(raw) => out.push_str(raw),
                    Inline::Image(node) => out.push_str(&node.to_html()),
                    Inline::LineBreak => out.push_str("<br>"),
                }
            }
            out.push_str("</p>");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Inline, Position};

    #[test]
    fn parses_blocks_and_images() {
        let html = r#"<p>before <strong>bold</strong></p><p><img src="file:///ws/images/a.png" alt="a.png" data-storage-path="images/a.png"></p><p><br></p>"#;
        let tree = EditableTree::parse(html);
        assert_eq!(tree.blocks().len(), 3);
        match &tree.blocks()[1].children[0] {
            Inline::Image(node) => {
                assert_eq!(node.display_src, "file:///ws/images/a.png");
                assert_eq!(node.alt, "a.png");
                assert_eq!(node.storage_path.as_deref(), Some("images/a.png"));
            }
            other => panic!("expected image, got {other:?}"),
        }
        assert_eq!(tree.blocks()[2].children, vec![Inline::LineBreak]);
    }

    #[test]
    fn round_trips_formatting_markup() {
        let html = r#"<p>a <em>b</em> c</p><p><img src="x" alt="y"></p>"#;
        assert_eq!(EditableTree::parse(html).to_html(), html);
    }

    #[test]
    fn empty_fragment_yields_single_empty_block() {
        let tree = EditableTree::parse("");
        assert_eq!(tree.blocks().len(), 1);
        assert!(tree.blocks()[0].children.is_empty());
        assert_eq!(tree.to_html(), "<p></p>");
        assert_eq!(tree.end_position(), Position::new(0, 0));
    }

    #[test]
    fn stray_content_outside_blocks_becomes_a_block() {
        let tree = EditableTree::parse("loose text<p>inner</p>");
        assert_eq!(tree.blocks().len(), 2);
        assert_eq!(
            tree.blocks()[0].children,
            vec![Inline::Markup("loose text".to_string())]
        );
    }

    #[test]
    fn image_without_storage_path_parses_as_none() {
        let tree = EditableTree::parse(r#"<p><img src="file:///z/images/q.png" alt="q"></p>"#);
        match &tree.blocks()[0].children[0] {
            Inline::Image(node) => assert!(node.storage_path.is_none()),
            other => panic!("expected image, got {other:?}"),
        }
    }

    #[test]
    fn attribute_values_escape_and_unescape() {
        let node = ImageNode::new("file:///a.png", r#"an "odd" <name>"#, None);
        let tag = node.to_html();
        assert!(tag.contains("&quot;odd&quot;"));
        let tree = EditableTree::parse(&format!("<p>{tag}</p>"));
        match &tree.blocks()[0].children[0] {
            Inline::Image(back) => assert_eq!(back.alt, node.alt),
            other => panic!("expected image, got {other:?}"),
        }
    }
}
