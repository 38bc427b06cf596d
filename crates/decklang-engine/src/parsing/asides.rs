use crate::error::ParseError;
use crate::model::block::{append_blank_line, append_content_line};
use crate::model::{AttrValue, ContentFragment, Note, Phase, PhaseList, SlideIr, parse_style};

use super::tokens::{Direction, Token};

/// Which side-channel grammar an aside uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsideKind {
    Content,
    Notes,
    Phases,
}

impl AsideKind {
    fn parse(name: &str, line: usize) -> Result<Self, ParseError> {
        match name {
            "content" => Ok(AsideKind::Content),
            "notes" => Ok(AsideKind::Notes),
            "phases" => Ok(AsideKind::Phases),
            other => Err(ParseError::new(line, format!("unknown aside type `{other}`"))),
        }
    }
}

/// Buffered aside section, consumed immediately by [`resolve_asides`].
#[derive(Debug, Clone, PartialEq)]
pub struct AsideBlock {
    pub kind: AsideKind,
    pub line: usize,
    pub tokens: Vec<Token>,
}

/// Pre-pass over the token stream: pulls aside token runs out of the
/// main stream so the tree builder only ever sees block grammar.
pub fn split_asides(tokens: Vec<Token>) -> Result<(Vec<Token>, Vec<AsideBlock>), ParseError> {
    let mut main = Vec::new();
    let mut asides = Vec::new();
    let mut current: Option<AsideBlock> = None;
    let mut nested = 0usize;

    for token in tokens {
        if current.is_none() {
            match token {
                Token::AsideStart { line, name } => {
                    current = Some(AsideBlock {
                        kind: AsideKind::parse(&name, line)?,
                        line,
                        tokens: Vec::new(),
                    });
                }
                other => main.push(other),
            }
            continue;
        }
        match token {
            Token::AsideStart { line, name } => {
                nested += 1;
                if let Some(aside) = current.as_mut() {
                    aside.tokens.push(Token::AsideStart { line, name });
                }
            }
            Token::AsideEnd { line } if nested > 0 => {
                nested -= 1;
                if let Some(aside) = current.as_mut() {
                    aside.tokens.push(Token::AsideEnd { line });
                }
            }
            Token::AsideEnd { .. } => {
                if let Some(done) = current.take() {
                    asides.push(done);
                }
            }
            other => {
                if let Some(aside) = current.as_mut() {
                    aside.tokens.push(other);
                }
            }
        }
    }

    Ok((main, asides))
}

/// Interprets the buffered asides into slide-level data: content
/// fragments, notes records and the legacy direct phase list.
pub fn resolve_asides(asides: Vec<AsideBlock>, slide: &mut SlideIr) -> Result<(), ParseError> {
    for aside in asides {
        match aside.kind {
            AsideKind::Content => {
                let fragment = resolve_fragment(aside.tokens);
                slide.content.push(fragment);
            }
            AsideKind::Notes => {
                let fragment = resolve_fragment(aside.tokens);
                let source = fragment
                    .attributes
                    .get_text("name")
                    .or_else(|| fragment.attributes.get_text("id"))
                    .unwrap_or("Slide")
                    .to_string();
                slide.notes.push(Note {
                    source,
                    content: fragment.content,
                });
            }
            AsideKind::Phases => {
                slide.phases = Some(resolve_phases(aside.tokens)?);
            }
        }
    }
    Ok(())
}

fn resolve_fragment(tokens: Vec<Token>) -> ContentFragment {
    let mut fragment = ContentFragment::default();
    for token in tokens {
        match token {
            Token::Attr { key, value, .. } => {
                fragment.attributes.merge(&key, AttrValue::Text(value));
            }
            Token::MacroAttr { key, value, .. } => {
                fragment.macro_attributes.merge(&key, AttrValue::Text(value));
            }
            Token::Content { text, .. } => append_content_line(&mut fragment.content, &text),
            Token::Blank { .. } => append_blank_line(&mut fragment.content),
            _ => {}
        }
    }
    fragment
}

/// Legacy direct phase syntax: `!! id` opens a phase, `#target --> ...`
/// and `#target <-- ...` merge style text into its transitions.
fn resolve_phases(tokens: Vec<Token>) -> Result<PhaseList, ParseError> {
    let mut list = PhaseList::default();
    let mut current: Option<Phase> = None;

    for token in tokens {
        match token {
            Token::PhaseStart { id, .. } => {
                if let Some(phase) = current.take() {
                    list.push(phase);
                }
                current = Some(Phase::new(id));
            }
            Token::Transition {
                line,
                target,
                direction,
                style_text,
            } => {
                let Some(phase) = current.as_mut() else {
                    let arrow = match direction {
                        Direction::Enter => "-->",
                        Direction::Rewind => "<--",
                    };
                    return Err(ParseError::new(
                        line,
                        format!("transition outside of a phase: `#{target} {arrow} {style_text}`"),
                    ));
                };
                let styles = parse_style(&style_text);
                let transition = phase.transition_mut(&target);
                match direction {
                    Direction::Enter => transition.enter.merge(&styles),
                    Direction::Rewind => transition.rewind.merge(&styles),
                }
            }
            _ => {}
        }
    }

    if let Some(phase) = current.take() {
        list.push(phase);
    }
    Ok(list)
}
