pub mod asides;
pub mod frontmatter;
pub mod tokenizer;
pub mod tokens;
pub mod tree;

use crate::error::ParseError;
use crate::model::SlideIr;

/// Runs the front half of the pipeline: frontmatter split, tokenization,
/// aside resolution and block-tree construction.
pub fn parse_slide(source: &str) -> Result<SlideIr, ParseError> {
    let (frontmatter, body, header_lines) = frontmatter::extract(source)?;
    let tokens = tokenizer::tokenize(body, header_lines)?;
    let (main, aside_blocks) = asides::split_asides(tokens)?;

    let mut slide = SlideIr {
        frontmatter,
        ..SlideIr::default()
    };
    asides::resolve_asides(aside_blocks, &mut slide)?;
    slide.contents = tree::build_tree(main)?;
    Ok(slide)
}
