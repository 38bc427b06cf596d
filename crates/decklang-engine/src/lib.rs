//! Compiler for the decklang slide-description format.
//!
//! The pipeline is pure and synchronous: raw text in, a JSON document
//! (or [`ParseError`]) out. Callers own all I/O.

pub mod emit;
pub mod error;
pub mod expand;
pub mod model;
pub mod parsing;

pub use emit::{JsonTarget, OutputTarget, emit};
pub use error::ParseError;
pub use model::SlideIr;

use serde_json::Value;

/// Compiles slide source text into the renderer's JSON document.
pub fn compile(source: &str) -> Result<Value, ParseError> {
    let slide = compile_ir(source)?;
    Ok(emit::emit(&slide, JsonTarget::new()))
}

/// Runs the pipeline up to (not including) emission, for callers that
/// attach custom component data or drive their own [`OutputTarget`].
pub fn compile_ir(source: &str) -> Result<SlideIr, ParseError> {
    run_pipeline(source).map_err(|e| e.with_excerpt(source))
}

fn run_pipeline(source: &str) -> Result<SlideIr, ParseError> {
    let mut slide = parsing::parse_slide(source)?;
    expand::expand_slide(&mut slide)?;
    expand::reveal::resolve_reveal(&mut slide)?;
    Ok(slide)
}
