use serde_json::Value;

use super::attrs::AttrMap;
use super::block::Block;
use super::phase::PhaseList;

/// One `key: value` header line, keeping its source line for error
/// reporting by the reveal resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct FrontmatterEntry {
    pub key: String,
    pub value: String,
    pub line: usize,
}

/// Ordered frontmatter header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frontmatter {
    entries: Vec<FrontmatterEntry>,
}

impl Frontmatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>, line: usize) {
        self.entries.push(FrontmatterEntry {
            key: key.into(),
            value: value.into(),
            line,
        });
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.value.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FrontmatterEntry> {
        self.entries.iter()
    }

    pub fn remove_keys(&mut self, keys: &[String]) {
        self.entries.retain(|e| !keys.contains(&e.key));
    }
}

/// Named content fragment collected from a `== content` aside.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentFragment {
    pub attributes: AttrMap,
    pub macro_attributes: AttrMap,
    pub content: String,
}

impl ContentFragment {
    pub fn id(&self) -> Option<&str> {
        self.attributes.get_text("id")
    }
}

/// Speaker-notes record collected from a `== notes` aside.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub source: String,
    pub content: String,
}

/// The root aggregate threaded through every compile stage: created once
/// per compile call, mutated by the expanders, handed to the emitter,
/// then discarded.
#[derive(Debug, Clone, Default)]
pub struct SlideIr {
    pub frontmatter: Frontmatter,
    pub contents: Vec<Block>,
    pub phases: Option<PhaseList>,
    pub notes: Vec<Note>,
    /// Content-aside fragments, addressable by id.
    pub content: Vec<ContentFragment>,
    /// Custom component data supplied by callers, passed through to the
    /// target untouched.
    pub custom: Option<Value>,
}

impl SlideIr {
    /// The phase arena, created on first use.
    pub fn phases_mut(&mut self) -> &mut PhaseList {
        self.phases.get_or_insert_with(PhaseList::default)
    }

    pub fn fragment_by_id(&self, id: &str) -> Option<&ContentFragment> {
        self.content.iter().find(|f| f.id() == Some(id))
    }

    /// Ids of the top-level content blocks, in document order.
    pub fn top_level_ids(&self) -> Vec<String> {
        self.contents
            .iter()
            .filter_map(|b| b.id().map(String::from))
            .collect()
    }
}
