use crate::error::ParseError;
use crate::model::Frontmatter;

/// Splits the dash-delimited header from the body.
///
/// Returns the parsed header, the body text, and the number of source
/// lines consumed before the body so downstream line numbers stay in
/// file coordinates. When the first non-empty line is not a run of
/// dashes there is no header and the whole input is the body.
pub fn extract(source: &str) -> Result<(Frontmatter, &str, usize), ParseError> {
    let mut frontmatter = Frontmatter::new();
    let mut offset = 0usize;
    let mut line_no = 0usize;
    let mut opened_at: Option<usize> = None;

    for raw in source.split_inclusive('\n') {
        line_no += 1;
        let trimmed = raw.trim();
        if opened_at.is_none() {
            if trimmed.is_empty() {
                offset += raw.len();
                continue;
            }
            if !is_dash_run(trimmed) {
                return Ok((Frontmatter::new(), source, 0));
            }
            opened_at = Some(line_no);
            offset += raw.len();
            continue;
        }
        offset += raw.len();
        if is_dash_run(trimmed) {
            return Ok((frontmatter, &source[offset..], line_no));
        }
        if trimmed.is_empty() {
            continue;
        }
        if let Some((key, value)) = trimmed.split_once(':') {
            frontmatter.insert(key.trim(), value.trim(), line_no);
        }
    }

    match opened_at {
        Some(line) => Err(ParseError::new(
            line,
            "unterminated frontmatter: no closing delimiter",
        )),
        // Blank input never reached a first non-empty line.
        None => Ok((Frontmatter::new(), source, 0)),
    }
}

fn is_dash_run(line: &str) -> bool {
    !line.is_empty() && line.bytes().all(|b| b == b'-')
}
