use thiserror::Error;

/// The single error kind for the whole compile pipeline.
///
/// Every stage reports failures as a `ParseError` carrying the 1-based
/// source line. The top-level entry points fill in `excerpt` from the
/// original text so callers can show the offending line in context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at line {line}: {message}{excerpt}")]
pub struct ParseError {
    pub line: usize,
    pub message: String,
    excerpt: String,
}

impl ParseError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
            excerpt: String::new(),
        }
    }

    /// Renders the surrounding source lines (±2) with the offending line
    /// marked, and stores the result for display.
    pub fn with_excerpt(mut self, source: &str) -> Self {
        let lines: Vec<&str> = source.lines().collect();
        if lines.is_empty() || self.line == 0 {
            return self;
        }
        let anchor = self.line.min(lines.len());
        let first = anchor.saturating_sub(2).max(1);
        let last = (anchor + 2).min(lines.len());
        let mut out = String::new();
        for n in first..=last {
            let marker = if n == self.line { '>' } else { ' ' };
            out.push_str(&format!("\n{marker} {n:>4} | {}", lines[n - 1]));
        }
        self.excerpt = out;
        self
    }

    pub fn excerpt(&self) -> &str {
        &self.excerpt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_without_excerpt() {
        let err = ParseError::new(3, "bad marker");
        assert_eq!(err.to_string(), "parse error at line 3: bad marker");
    }

    #[test]
    fn excerpt_marks_offending_line() {
        let source = "one\ntwo\nthree\nfour\nfive\nsix";
        let err = ParseError::new(3, "bad marker").with_excerpt(source);
        let rendered = err.to_string();
        assert!(rendered.contains(">    3 | three"));
        assert!(rendered.contains("     1 | one"));
        assert!(rendered.contains("     5 | five"));
        assert!(!rendered.contains("six"));
    }

    #[test]
    fn excerpt_clamps_past_end_of_input() {
        let source = "only\ntwo lines";
        let err = ParseError::new(9, "unclosed").with_excerpt(source);
        assert!(err.excerpt().contains("two lines"));
    }
}
