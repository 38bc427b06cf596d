use std::sync::OnceLock;

use regex::Regex;

use crate::error::ParseError;

use super::tokens::{Direction, Token};

/// `::` open marker: optional macro sigil, optional type name, optional
/// `{...}` inline attribute span.
fn block_open_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^::(%?)([A-Za-z0-9_-]*)\s*(?:\{(.*)\})?\s*$").expect("invalid block-open regex")
    })
}

/// `#target --> styles` / `#target <-- styles` inside a phases aside.
fn transition_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^#(\S+)\s*(-->|<--)\s*(.*)$").expect("invalid transition regex")
    })
}

/// An open construct on the context stack. The innermost frame decides
/// what a bare `--` closes and which column content indentation is
/// measured from.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Frame {
    Block { indent: usize },
    Aside { indent: usize, opened_at: usize },
}

impl Frame {
    fn indent(&self) -> usize {
        match self {
            Frame::Block { indent } | Frame::Aside { indent, .. } => *indent,
        }
    }
}

/// Line-by-line scanner for the post-frontmatter body.
pub struct Tokenizer {
    frames: Vec<Frame>,
    tokens: Vec<Token>,
    last_line: usize,
}

/// Tokenizes the body. `line_offset` is the number of source lines the
/// frontmatter consumed, so emitted line numbers are file coordinates.
pub fn tokenize(body: &str, line_offset: usize) -> Result<Vec<Token>, ParseError> {
    let mut tokenizer = Tokenizer::new();
    for (idx, raw) in body.lines().enumerate() {
        tokenizer.push_line(line_offset + idx + 1, raw)?;
    }
    Ok(tokenizer.finish())
}

impl Tokenizer {
    pub fn new() -> Self {
        Self {
            frames: Vec::new(),
            tokens: Vec::new(),
            last_line: 0,
        }
    }

    fn push_line(&mut self, line: usize, raw: &str) -> Result<(), ParseError> {
        self.last_line = line;
        let trimmed = raw.trim();
        let indent = leading_whitespace_len(raw);

        // Inside an aside the close marker, phase markers and transition
        // lines take priority over every other classification.
        if matches!(self.frames.last(), Some(Frame::Aside { .. })) {
            if trimmed == "--" {
                self.frames.pop();
                self.tokens.push(Token::AsideEnd { line });
                return Ok(());
            }
            if let Some(rest) = trimmed.strip_prefix("!!") {
                let id = rest.trim();
                if id.is_empty() {
                    return Err(ParseError::new(line, "phase marker is missing an id"));
                }
                self.tokens.push(Token::PhaseStart {
                    line,
                    id: id.to_string(),
                });
                return Ok(());
            }
            if let Some(caps) = transition_re().captures(trimmed) {
                let direction = match &caps[2] {
                    "-->" => Direction::Enter,
                    _ => Direction::Rewind,
                };
                self.tokens.push(Token::Transition {
                    line,
                    target: caps[1].to_string(),
                    direction,
                    style_text: caps[3].to_string(),
                });
                return Ok(());
            }
        }

        if let Some(rest) = trimmed.strip_prefix("==") {
            let name = rest.trim();
            if name.is_empty() {
                return Err(ParseError::new(line, "aside marker is missing a name"));
            }
            self.frames.push(Frame::Aside {
                indent,
                opened_at: line,
            });
            self.tokens.push(Token::AsideStart {
                line,
                name: name.to_string(),
            });
            return Ok(());
        }

        if trimmed.starts_with("::") {
            let caps = block_open_re().captures(trimmed).ok_or_else(|| {
                ParseError::new(line, format!("malformed block marker `{trimmed}`"))
            })?;
            let is_macro = &caps[1] == "%";
            let type_name = caps[2].to_string();
            let attr_text = caps.get(3).map(|m| m.as_str().to_string());
            self.frames.push(Frame::Block { indent });
            let depth = self.block_depth();
            self.tokens.push(if is_macro {
                Token::MacroBlockStart {
                    line,
                    depth,
                    type_name,
                    attr_text,
                }
            } else {
                Token::BlockStart {
                    line,
                    depth,
                    type_name,
                    attr_text,
                }
            });
            return Ok(());
        }

        if let Some(rest) = trimmed.strip_prefix('@') {
            let (key, value) = split_assignment(rest, line, trimmed)?;
            self.tokens.push(Token::Attr { line, key, value });
            return Ok(());
        }

        if let Some(rest) = trimmed.strip_prefix('%') {
            let (key, value) = split_assignment(rest, line, trimmed)?;
            self.tokens.push(Token::MacroAttr { line, key, value });
            return Ok(());
        }

        if trimmed == "--" {
            // A stray close with nothing open still becomes a BlockEnd;
            // the tree builder rejects it with full context.
            if matches!(self.frames.last(), Some(Frame::Block { .. })) {
                self.frames.pop();
            }
            self.tokens.push(Token::BlockEnd { line });
            return Ok(());
        }

        if trimmed.is_empty() {
            if !self.frames.is_empty() {
                self.tokens.push(Token::Blank { line });
            }
            return Ok(());
        }

        let text = match self.frames.last() {
            Some(frame) => strip_indent(raw, frame.indent()),
            None => raw,
        };
        self.tokens.push(Token::Content {
            line,
            text: text.to_string(),
        });
        Ok(())
    }

    /// Closes any aside left open at end of input best-effort; unclosed
    /// blocks stay for the tree builder to reject.
    pub fn finish(mut self) -> Vec<Token> {
        while let Some(frame) = self.frames.pop() {
            if let Frame::Aside { opened_at, .. } = frame {
                tracing::warn!(opened_at, "aside left unterminated at end of input");
                self.tokens.push(Token::AsideEnd {
                    line: self.last_line,
                });
            }
        }
        self.tokens
    }

    fn block_depth(&self) -> usize {
        self.frames
            .iter()
            .filter(|f| matches!(f, Frame::Block { .. }))
            .count()
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

/// `key=value` tail of an `@`/`%` line; the key may carry `[...]` or
/// `{...}` parameter suffixes, which later stages interpret.
fn split_assignment(
    rest: &str,
    line: usize,
    original: &str,
) -> Result<(String, String), ParseError> {
    let Some((key, value)) = rest.split_once('=') else {
        return Err(ParseError::new(
            line,
            format!("malformed attribute `{original}`: expected key=value"),
        ));
    };
    let key = key.trim();
    if key.is_empty() {
        return Err(ParseError::new(
            line,
            format!("malformed attribute `{original}`: empty key"),
        ));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

fn leading_whitespace_len(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Strips leading whitespace up to the opening construct's column,
/// preserving anything deeper verbatim.
fn strip_indent(line: &str, max_bytes: usize) -> &str {
    let mut strip = 0;
    for ch in line.chars() {
        if !ch.is_whitespace() {
            break;
        }
        let next = strip + ch.len_utf8();
        if next > max_bytes {
            break;
        }
        strip = next;
    }
    &line[strip..]
}
