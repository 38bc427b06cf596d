use serde::ser::{Serialize, SerializeSeq, Serializer};

/// A single attribute value.
///
/// Repeated assignments to one key escalate scalar -> pair -> list, so a
/// value is either one scalar or a flat run of scalars; `Many` never
/// nests.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Bare inline key with no value, e.g. `{centered}`.
    Flag(bool),
    Text(String),
    Many(Vec<AttrValue>),
}

impl AttrValue {
    pub fn text(value: impl Into<String>) -> Self {
        AttrValue::Text(value.into())
    }

    /// First textual scalar, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            AttrValue::Many(values) => values.iter().find_map(|v| v.as_text()),
            AttrValue::Flag(_) => None,
        }
    }

    /// The scalar values in order: the value itself, or the list items.
    pub fn scalars(&self) -> Vec<&AttrValue> {
        match self {
            AttrValue::Many(values) => values.iter().collect(),
            value => vec![value],
        }
    }
}

impl Serialize for AttrValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AttrValue::Flag(b) => serializer.serialize_bool(*b),
            AttrValue::Text(s) => serializer.serialize_str(s),
            AttrValue::Many(values) => {
                let mut seq = serializer.serialize_seq(Some(values.len()))?;
                for value in values {
                    seq.serialize_element(value)?;
                }
                seq.end()
            }
        }
    }
}

/// Insertion-ordered attribute map with the escalating merge rule: the
/// first value for a key is stored as a scalar, a second occurrence
/// converts the slot to a two-element list, later occurrences append.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttrMap {
    entries: Vec<(String, AttrValue)>,
}

impl AttrMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// First textual scalar stored under `key`.
    pub fn get_text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| v.as_text())
    }

    /// Escalating merge of `value` into the slot for `key`.
    pub fn merge(&mut self, key: &str, value: AttrValue) {
        match self.entries.iter().position(|(k, _)| k == key) {
            Some(idx) => {
                let slot = &mut self.entries[idx].1;
                match slot {
                    AttrValue::Many(items) => push_flat(items, value),
                    _ => {
                        let prev = std::mem::replace(slot, AttrValue::Flag(false));
                        let mut items = vec![prev];
                        push_flat(&mut items, value);
                        *slot = AttrValue::Many(items);
                    }
                }
            }
            None => self.entries.push((key.to_string(), value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<AttrValue> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

fn push_flat(items: &mut Vec<AttrValue>, value: AttrValue) {
    match value {
        AttrValue::Many(values) => items.extend(values),
        value => items.push(value),
    }
}
