use crate::error::ParseError;
use crate::model::{Block, SlideIr};

/// A `content` macro attribute of the form `content:<id>` replaces the
/// block's content with the matching collected fragment's content.
/// A dangling reference is fatal; values without the `content:` prefix
/// are not references and stay untouched.
pub fn apply(block: &mut Block, slide: &SlideIr) -> Result<(), ParseError> {
    let Some(value) = block.macro_attributes.get("content").and_then(|v| v.as_text()) else {
        return Ok(());
    };
    let Some(id) = value.strip_prefix("content:") else {
        return Ok(());
    };
    let id = id.trim().to_string();
    let Some(fragment) = slide.fragment_by_id(&id) else {
        return Err(ParseError::new(
            block.line,
            format!("unknown content fragment `{id}`"),
        ));
    };
    block.content = fragment.content.clone();
    block.macro_attributes.remove("content");
    Ok(())
}
