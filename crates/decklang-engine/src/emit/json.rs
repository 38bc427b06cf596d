use serde_json::{Map, Value, json};

use crate::model::{AttrMap, AttrValue, Frontmatter, Note, Phase, StyleMap, parse_style};

use super::OutputTarget;

/// Concrete target producing the renderer's JSON document:
/// `{id, name, type, notes?, contents, steps?, custom?}`.
pub struct JsonTarget {
    id: String,
    name: String,
    slide_type: String,
    notes: Option<Value>,
    contents: Vec<Value>,
    /// In-progress block nodes, innermost last.
    stack: Vec<Map<String, Value>>,
    steps: Option<Vec<Value>>,
    custom: Option<Value>,
}

impl JsonTarget {
    pub fn new() -> Self {
        Self {
            id: "slide".to_string(),
            name: "Slide".to_string(),
            slide_type: "slide".to_string(),
            notes: None,
            contents: Vec::new(),
            stack: Vec::new(),
            steps: None,
            custom: None,
        }
    }
}

impl Default for JsonTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputTarget for JsonTarget {
    type Document = Value;

    fn set_meta(&mut self, frontmatter: &Frontmatter) {
        if let Some(name) = frontmatter.get("name").or_else(|| frontmatter.get("title")) {
            self.name = name.to_string();
        }
        self.id = frontmatter
            .get("id")
            .map(String::from)
            .unwrap_or_else(|| slug(&self.name));
        if let Some(slide_type) = frontmatter.get("type") {
            self.slide_type = slide_type.to_string();
        }
    }

    fn add_notes(&mut self, notes: &[Note]) {
        let notes: Vec<Value> = notes
            .iter()
            .map(|note| {
                json!({
                    "type": "text",
                    "source": note.source,
                    "content": note.content,
                })
            })
            .collect();
        self.notes = Some(Value::Array(notes));
    }

    fn open_block(&mut self, block_type: &str, attributes: &AttrMap) {
        let mut node = Map::new();
        node.insert("type".to_string(), Value::String(block_type.to_string()));
        for (key, value) in attributes.iter() {
            let (key, value) = remap_attribute(key, value);
            node.insert(key, value);
        }
        self.stack.push(node);
    }

    fn write_content(&mut self, text: &str) {
        if let Some(node) = self.stack.last_mut() {
            node.insert("content".to_string(), Value::String(text.to_string()));
        }
    }

    fn close_block(&mut self) {
        let Some(node) = self.stack.pop() else {
            return;
        };
        match self.stack.last_mut() {
            Some(parent) => {
                let children = parent
                    .entry("contents")
                    .or_insert_with(|| Value::Array(Vec::new()));
                if let Value::Array(items) = children {
                    items.push(Value::Object(node));
                }
            }
            None => self.contents.push(Value::Object(node)),
        }
    }

    fn open_phases(&mut self) {
        self.steps = Some(Vec::new());
    }

    fn add_phase(&mut self, phase: &Phase) {
        let mut step = Map::new();
        step.insert("id".to_string(), Value::String(phase.id.clone()));
        if !phase.transitions.is_empty() {
            let mut transitions = Map::new();
            for (target, transition) in phase.transitions.iter() {
                transitions.insert(
                    target.to_string(),
                    Value::Array(vec![
                        style_value(&transition.enter),
                        style_value(&transition.rewind),
                    ]),
                );
            }
            step.insert("transitions".to_string(), Value::Object(transitions));
        }
        if let Some(steps) = self.steps.as_mut() {
            steps.push(Value::Object(step));
        }
    }

    fn close_phases(&mut self) {}

    fn add_custom_components(&mut self, custom: &Value) {
        self.custom = Some(custom.clone());
    }

    fn done(self) -> Value {
        let mut doc = Map::new();
        doc.insert("id".to_string(), Value::String(self.id));
        doc.insert("name".to_string(), Value::String(self.name));
        doc.insert("type".to_string(), Value::String(self.slide_type));
        if let Some(notes) = self.notes {
            doc.insert("notes".to_string(), notes);
        }
        doc.insert("contents".to_string(), Value::Array(self.contents));
        if let Some(steps) = self.steps {
            doc.insert("steps".to_string(), Value::Array(steps));
        }
        if let Some(custom) = self.custom {
            doc.insert("custom".to_string(), custom);
        }
        Value::Object(doc)
    }
}

/// Renderer-facing attribute remaps: `src` becomes `source`, style text
/// is parsed into a map, `width` becomes an integer when it parses, and
/// everything else (including `html`) passes through.
fn remap_attribute(key: &str, value: &AttrValue) -> (String, Value) {
    match key {
        "src" => ("source".to_string(), attr_value(value)),
        "style" | "@style" => {
            // Escalated style values merge in order, later entries winning.
            let mut styles = StyleMap::new();
            for scalar in value.scalars() {
                if let AttrValue::Text(text) = scalar {
                    styles.merge(&parse_style(text));
                }
            }
            ("style".to_string(), style_value(&styles))
        }
        "width" => (
            "width".to_string(),
            match value {
                AttrValue::Text(text) => match text.parse::<i64>() {
                    Ok(width) => json!(width),
                    Err(_) => attr_value(value),
                },
                _ => attr_value(value),
            },
        ),
        _ => (key.to_string(), attr_value(value)),
    }
}

fn attr_value(value: &AttrValue) -> Value {
    match value {
        AttrValue::Flag(b) => Value::Bool(*b),
        AttrValue::Text(s) => Value::String(s.clone()),
        AttrValue::Many(values) => Value::Array(values.iter().map(attr_value).collect()),
    }
}

fn style_value(styles: &StyleMap) -> Value {
    let mut map = Map::new();
    for (key, value) in styles.iter() {
        map.insert(key.to_string(), Value::String(value.clone()));
    }
    Value::Object(map)
}

fn slug(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}
