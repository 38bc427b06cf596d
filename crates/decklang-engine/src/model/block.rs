use super::attrs::AttrMap;

/// A node in the parsed content tree.
///
/// Every non-root block is owned by exactly one parent; the tree-builder
/// stack discipline guarantees `depth == parent.depth + 1` and rules out
/// cycles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    /// Type tag; empty until implicit-type resolution.
    pub block_type: String,
    /// True for unexpanded macro blocks (`::%for`).
    pub is_macro: bool,
    pub attributes: AttrMap,
    pub macro_attributes: AttrMap,
    /// Newline-joined content lines.
    pub content: String,
    pub children: Vec<Block>,
    /// Nesting level, root children at 1.
    pub depth: usize,
    /// 1-based source line of the opening marker.
    pub line: usize,
}

impl Block {
    pub fn id(&self) -> Option<&str> {
        self.attributes.get_text("id")
    }

    pub fn push_content_line(&mut self, text: &str) {
        append_content_line(&mut self.content, text);
    }

    pub fn push_blank_line(&mut self) {
        append_blank_line(&mut self.content);
    }
}

/// Joins a content line onto `buf`; the first line is not prefixed by a
/// newline.
pub(crate) fn append_content_line(buf: &mut String, text: &str) {
    if !buf.is_empty() {
        buf.push('\n');
    }
    buf.push_str(text);
}

/// A blank line becomes a single newline, but only once there is content
/// to separate; leading blanks are dropped.
pub(crate) fn append_blank_line(buf: &mut String) {
    if !buf.is_empty() {
        buf.push('\n');
    }
}
