pub mod json;

pub use json::JsonTarget;

use serde_json::Value;

use crate::model::{AttrMap, Block, Frontmatter, Note, Phase, SlideIr};

/// Abstract sink the emitter drives to produce a concrete document.
///
/// Targets receive the slide in document order: meta, notes, a
/// depth-first open/write/close walk over the blocks, the bracketed
/// phase list, custom data, then `done`.
pub trait OutputTarget {
    type Document;

    fn set_meta(&mut self, frontmatter: &Frontmatter);
    fn add_notes(&mut self, notes: &[Note]);
    fn open_block(&mut self, block_type: &str, attributes: &AttrMap);
    fn write_content(&mut self, text: &str);
    fn close_block(&mut self);
    fn open_phases(&mut self);
    fn add_phase(&mut self, phase: &Phase);
    fn close_phases(&mut self);
    fn add_custom_components(&mut self, custom: &Value);
    fn done(self) -> Self::Document;
}

/// Depth-first emission of a finished slide against a target.
pub fn emit<T: OutputTarget>(slide: &SlideIr, mut target: T) -> T::Document {
    if !slide.frontmatter.is_empty() {
        target.set_meta(&slide.frontmatter);
    }
    if !slide.notes.is_empty() {
        target.add_notes(&slide.notes);
    }
    for block in &slide.contents {
        emit_block(block, &mut target);
    }
    if let Some(phases) = &slide.phases {
        target.open_phases();
        for phase in phases.iter() {
            target.add_phase(phase);
        }
        target.close_phases();
    }
    if let Some(custom) = &slide.custom {
        target.add_custom_components(custom);
    }
    target.done()
}

fn emit_block<T: OutputTarget>(block: &Block, target: &mut T) {
    target.open_block(&block.block_type, &block.attributes);
    if block.children.is_empty() {
        if !block.content.is_empty() {
            target.write_content(&block.content);
        }
    } else {
        for child in &block.children {
            emit_block(child, target);
        }
    }
    target.close_block();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AttrValue;

    /// Records the call sequence so the walk order is testable on its
    /// own, independent of any concrete document shape.
    #[derive(Default)]
    struct TraceTarget {
        calls: Vec<String>,
    }

    impl OutputTarget for TraceTarget {
        type Document = Vec<String>;

        fn set_meta(&mut self, _: &Frontmatter) {
            self.calls.push("meta".into());
        }
        fn add_notes(&mut self, notes: &[Note]) {
            self.calls.push(format!("notes({})", notes.len()));
        }
        fn open_block(&mut self, block_type: &str, _: &AttrMap) {
            self.calls.push(format!("open({block_type})"));
        }
        fn write_content(&mut self, text: &str) {
            self.calls.push(format!("write({text})"));
        }
        fn close_block(&mut self) {
            self.calls.push("close".into());
        }
        fn open_phases(&mut self) {
            self.calls.push("phases[".into());
        }
        fn add_phase(&mut self, phase: &Phase) {
            self.calls.push(format!("phase({})", phase.id));
        }
        fn close_phases(&mut self) {
            self.calls.push("]phases".into());
        }
        fn add_custom_components(&mut self, _: &Value) {
            self.calls.push("custom".into());
        }
        fn done(self) -> Vec<String> {
            self.calls
        }
    }

    #[test]
    fn walk_order_is_depth_first_with_phases_last() {
        let mut child = Block {
            block_type: "column".to_string(),
            content: "inner".to_string(),
            depth: 2,
            ..Block::default()
        };
        child.attributes.merge("id", AttrValue::text("c"));
        let parent = Block {
            block_type: "column-layout".to_string(),
            // Content on a parent with children is not written.
            content: "ignored".to_string(),
            children: vec![child],
            depth: 1,
            ..Block::default()
        };

        let mut slide = SlideIr {
            contents: vec![parent],
            ..SlideIr::default()
        };
        slide.frontmatter.insert("name", "Demo", 2);
        slide.phases_mut().ensure_index(1);

        let calls = emit(&slide, TraceTarget::default());
        assert_eq!(
            calls,
            vec![
                "meta",
                "open(column-layout)",
                "open(column)",
                "write(inner)",
                "close",
                "close",
                "phases[",
                "phase(initial)",
                "phase(phase1)",
                "]phases",
            ]
        );
    }

    #[test]
    fn empty_slide_only_calls_done() {
        let calls = emit(&SlideIr::default(), TraceTarget::default());
        assert!(calls.is_empty());
    }
}
