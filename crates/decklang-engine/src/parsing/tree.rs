use crate::error::ParseError;
use crate::model::{AttrMap, AttrValue, Block};

use super::tokens::Token;

/// Implicit child types, keyed by parent block type. An untyped block is
/// only legal where this table has an entry for its parent.
fn implicit_child_type(parent: &str) -> Option<&'static str> {
    match parent {
        "column-layout" => Some("column"),
        _ => None,
    }
}

struct OpenBlock {
    block: Block,
    opened_at: usize,
}

/// Stack-machine assembly of the block tree from the aside-free token
/// stream, seeded with a synthetic root frame.
pub struct TreeBuilder {
    root: Block,
    stack: Vec<OpenBlock>,
}

/// Builds the root children list from a token stream.
pub fn build_tree(tokens: Vec<Token>) -> Result<Vec<Block>, ParseError> {
    let mut builder = TreeBuilder::new();
    for token in tokens {
        builder.push(token)?;
    }
    builder.finish()
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self {
            root: Block::default(),
            stack: Vec::new(),
        }
    }

    pub fn push(&mut self, token: Token) -> Result<(), ParseError> {
        match token {
            Token::BlockStart {
                line,
                depth,
                type_name,
                attr_text,
            } => self.open_block(line, depth, type_name, attr_text.as_deref(), false),
            Token::MacroBlockStart {
                line,
                depth,
                type_name,
                attr_text,
            } => self.open_block(line, depth, type_name, attr_text.as_deref(), true),
            Token::Attr { line, key, value } => {
                let block = self.current_mut(line, "attribute")?;
                block.attributes.merge(&key, AttrValue::Text(value));
                Ok(())
            }
            Token::MacroAttr { line, key, value } => {
                let block = self.current_mut(line, "macro attribute")?;
                block.macro_attributes.merge(&key, AttrValue::Text(value));
                Ok(())
            }
            Token::Content { line, text } => {
                let block = self.current_mut(line, "content")?;
                block.push_content_line(&text);
                Ok(())
            }
            Token::Blank { .. } => {
                if let Some(open) = self.stack.last_mut() {
                    open.block.push_blank_line();
                }
                Ok(())
            }
            Token::BlockEnd { line } => self.close_block(line),
            // Aside tokens were split out by the pre-pass.
            _ => Ok(()),
        }
    }

    pub fn finish(self) -> Result<Vec<Block>, ParseError> {
        if let Some(open) = self.stack.first() {
            return Err(ParseError::new(
                open.opened_at,
                format!("{} unclosed block(s) at end of input", self.stack.len()),
            ));
        }
        Ok(self.root.children)
    }

    fn open_block(
        &mut self,
        line: usize,
        depth: usize,
        type_name: String,
        attr_text: Option<&str>,
        is_macro: bool,
    ) -> Result<(), ParseError> {
        let (attributes, macro_attributes) = parse_inline_attrs(attr_text.unwrap_or(""));
        let block_type = if type_name.is_empty() && !is_macro {
            match self.stack.last() {
                Some(open) => {
                    let parent = open.block.block_type.as_str();
                    implicit_child_type(parent)
                        .ok_or_else(|| {
                            ParseError::new(
                                line,
                                format!("untyped block not allowed under parent `{parent}`"),
                            )
                        })?
                        .to_string()
                }
                None => {
                    return Err(ParseError::new(
                        line,
                        "untyped block not allowed at the top level",
                    ));
                }
            }
        } else {
            type_name
        };
        self.stack.push(OpenBlock {
            block: Block {
                block_type,
                is_macro,
                attributes,
                macro_attributes,
                content: String::new(),
                children: Vec::new(),
                depth,
                line,
            },
            opened_at: line,
        });
        Ok(())
    }

    fn close_block(&mut self, line: usize) -> Result<(), ParseError> {
        let Some(open) = self.stack.pop() else {
            return Err(ParseError::new(line, "unexpected block end"));
        };
        match self.stack.last_mut() {
            Some(parent) if open.block.depth > parent.block.depth => {
                parent.block.children.push(open.block);
                Ok(())
            }
            Some(_) => Err(ParseError::new(line, "unexpected dedent or block end")),
            None => {
                self.root.children.push(open.block);
                Ok(())
            }
        }
    }

    fn current_mut(&mut self, line: usize, what: &str) -> Result<&mut Block, ParseError> {
        match self.stack.last_mut() {
            Some(open) => Ok(&mut open.block),
            None => Err(ParseError::new(line, format!("{what} outside of any block"))),
        }
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses a `{key: value; %macro: value; flag}` inline span into plain
/// and macro attribute maps. Surrounding double quotes on values are
/// stripped; a segment without a colon is a boolean flag.
fn parse_inline_attrs(text: &str) -> (AttrMap, AttrMap) {
    let mut attributes = AttrMap::new();
    let mut macro_attributes = AttrMap::new();
    for segment in text.split(';') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        let (raw_key, value) = match segment.split_once(':') {
            Some((key, value)) => (key.trim(), Some(value.trim())),
            None => (segment, None),
        };
        if raw_key.is_empty() {
            continue;
        }
        let (key, target) = match raw_key.strip_prefix('%') {
            Some(stripped) => (stripped, &mut macro_attributes),
            None => (raw_key, &mut attributes),
        };
        match value {
            Some(value) => target.merge(key, AttrValue::text(unquote(value))),
            None => target.merge(key, AttrValue::Flag(true)),
        }
    }
    (attributes, macro_attributes)
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(value)
}
