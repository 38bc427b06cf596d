pub mod accumulate;
pub mod content_ref;
pub mod forloop;
pub mod phase;
pub mod reveal;

use crate::error::ParseError;
use crate::model::{Block, SlideIr};

use accumulate::AccumulateContext;

/// Per-block attribute macros, dispatched in the fixed order below at
/// every visited block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrMacro {
    Phase,
    Accumulate,
    ContentRef,
}

/// Ordering contract: accumulate must see the block's own content, so it
/// runs before the content-reference macro.
pub const ATTR_MACRO_PIPELINE: [AttrMacro; 3] =
    [AttrMacro::Phase, AttrMacro::Accumulate, AttrMacro::ContentRef];

/// Unrolls macro blocks, then runs the attribute-macro pipeline in one
/// pre-order, left-to-right traversal. Accumulation state is keyed by
/// traversal order, so siblings are visited strictly in document order.
pub fn expand_slide(slide: &mut SlideIr) -> Result<(), ParseError> {
    let contents = std::mem::take(&mut slide.contents);
    let mut contents = forloop::expand_macro_blocks(contents)?;

    let mut ctx = AccumulateContext::default();
    for block in &mut contents {
        visit(block, slide, &mut ctx)?;
    }
    slide.contents = contents;
    Ok(())
}

fn visit(
    block: &mut Block,
    slide: &mut SlideIr,
    ctx: &mut AccumulateContext,
) -> Result<(), ParseError> {
    for attr_macro in ATTR_MACRO_PIPELINE {
        match attr_macro {
            AttrMacro::Phase => phase::apply(block, slide)?,
            AttrMacro::Accumulate => accumulate::apply(block, ctx)?,
            AttrMacro::ContentRef => content_ref::apply(block, slide)?,
        }
    }
    for child in &mut block.children {
        visit(child, slide, ctx)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AttrValue, ContentFragment};

    #[test]
    fn accumulate_runs_before_content_reference() {
        // The referencing block contributes its own (original) content to
        // the group before the reference overwrites it.
        let mut fragment = ContentFragment {
            content: "referenced".to_string(),
            ..ContentFragment::default()
        };
        fragment.attributes.merge("id", AttrValue::text("frag"));

        let mut first = Block {
            block_type: "text".to_string(),
            content: "own words".to_string(),
            depth: 1,
            line: 1,
            ..Block::default()
        };
        first
            .macro_attributes
            .merge("accumulate.content", AttrValue::text("g"));
        first
            .macro_attributes
            .merge("content", AttrValue::text("content:frag"));

        let mut second = Block {
            block_type: "text".to_string(),
            content: "tail".to_string(),
            depth: 1,
            line: 2,
            ..Block::default()
        };
        second
            .macro_attributes
            .merge("accumulate.content", AttrValue::text("g"));

        let mut slide = SlideIr {
            contents: vec![first, second],
            content: vec![fragment],
            ..SlideIr::default()
        };
        expand_slide(&mut slide).unwrap();

        // First block ends up showing the referenced fragment...
        assert_eq!(slide.contents[0].content, "referenced");
        // ...but the group accumulated its pre-reference content.
        assert_eq!(slide.contents[1].content, "own words\ntail");
    }

    #[test]
    fn siblings_are_visited_in_document_order_across_depths() {
        let mut leading_child = Block {
            block_type: "text".to_string(),
            content: "one".to_string(),
            depth: 2,
            line: 2,
            ..Block::default()
        };
        leading_child
            .macro_attributes
            .merge("accumulate.content", AttrValue::text("g"));
        let parent = Block {
            block_type: "column-layout".to_string(),
            children: vec![leading_child],
            depth: 1,
            line: 1,
            ..Block::default()
        };
        let mut trailing = Block {
            block_type: "text".to_string(),
            content: "two".to_string(),
            depth: 1,
            line: 5,
            ..Block::default()
        };
        trailing
            .macro_attributes
            .merge("accumulate.content", AttrValue::text("g"));

        let mut slide = SlideIr {
            contents: vec![parent, trailing],
            ..SlideIr::default()
        };
        expand_slide(&mut slide).unwrap();
        assert_eq!(slide.contents[1].content, "one\ntwo");
    }

    #[test]
    fn loop_unrolling_feeds_phase_macros() {
        let mut for_block = Block {
            block_type: "for".to_string(),
            is_macro: true,
            content: "Step {n}".to_string(),
            depth: 1,
            line: 1,
            ..Block::default()
        };
        for (k, v) in [
            ("each", "n"),
            ("values", "1,2"),
            ("type", "text"),
            ("phase{n}.style", "opacity: 1 | 0"),
        ] {
            for_block.macro_attributes.merge(k, AttrValue::text(v));
        }
        for_block.attributes.merge("id", AttrValue::text("step{n}"));

        let mut slide = SlideIr {
            contents: vec![for_block],
            ..SlideIr::default()
        };
        expand_slide(&mut slide).unwrap();

        assert_eq!(slide.contents.len(), 2);
        let phases = slide.phases.as_ref().unwrap();
        let ids: Vec<&str> = phases.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["initial", "phase1", "phase2"]);
        assert!(phases.get(1).unwrap().transitions.get("step1").is_some());
        assert!(phases.get(2).unwrap().transitions.get("step2").is_some());
    }
}
