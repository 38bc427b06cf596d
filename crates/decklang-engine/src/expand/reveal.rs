use std::sync::OnceLock;

use regex::Regex;

use crate::error::ParseError;
use crate::model::{SlideIr, StyleMap, parse_style};

/// `%reveal`, `%reveal[<group>]`, `%reveal.<prop>`,
/// `%reveal[<group>].<prop>` frontmatter keys.
fn reveal_key_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^%reveal(?:\[(?<group>[^\]]+)\])?(?:\.(?<prop>.+))?$")
            .expect("invalid reveal-key regex")
    })
}

const DEFAULT_GROUP: &str = "__default";

#[derive(Debug, Default)]
struct RevealGroup {
    /// Block-reference expression plus the frontmatter line it came from.
    targets: Option<(String, usize)>,
    style: Option<(StyleMap, StyleMap)>,
}

/// Expands `%reveal` frontmatter directives into sequential phases over
/// the resolved top-level block ids, then deletes the consumed keys.
pub fn resolve_reveal(slide: &mut SlideIr) -> Result<(), ParseError> {
    let mut groups: Vec<(String, RevealGroup)> = Vec::new();
    let mut consumed: Vec<String> = Vec::new();

    for entry in slide.frontmatter.iter() {
        let Some(caps) = reveal_key_re().captures(&entry.key) else {
            continue;
        };
        consumed.push(entry.key.clone());
        let group_name = caps.name("group").map_or(DEFAULT_GROUP, |m| m.as_str());
        let prop = caps.name("prop").map_or("__targetBlocks", |m| m.as_str());

        let idx = match groups.iter().position(|(name, _)| name == group_name) {
            Some(idx) => idx,
            None => {
                groups.push((group_name.to_string(), RevealGroup::default()));
                groups.len() - 1
            }
        };
        let group = &mut groups[idx].1;
        match prop {
            "__targetBlocks" => group.targets = Some((entry.value.clone(), entry.line)),
            "style" => group.style = Some(parse_reveal_style(&entry.value)),
            other => {
                return Err(ParseError::new(
                    entry.line,
                    format!("unknown reveal property `{other}`"),
                ));
            }
        }
    }

    if groups.is_empty() {
        return Ok(());
    }

    let ids = slide.top_level_ids();
    for (_, group) in groups {
        let Some((expr, line)) = group.targets else {
            continue;
        };
        let targets = resolve_block_refs(&expr, &ids, line)?;
        let (enter, rewind) = group.style.unwrap_or_else(default_reveal_style);
        for (offset, target) in targets.iter().enumerate() {
            let phase = slide.phases_mut().ensure_index(offset + 1);
            let transition = phase.transition_mut(target);
            transition.enter.merge(&enter);
            transition.rewind.merge(&rewind);
        }
    }

    slide.frontmatter.remove_keys(&consumed);
    Ok(())
}

fn default_reveal_style() -> (StyleMap, StyleMap) {
    let mut enter = StyleMap::new();
    enter.insert("display", "block".to_string());
    let mut rewind = StyleMap::new();
    rewind.insert("display", "none".to_string());
    (enter, rewind)
}

/// `prop: enter | rewind; ...` into separate enter/rewind style maps.
fn parse_reveal_style(text: &str) -> (StyleMap, StyleMap) {
    let mut enter = StyleMap::new();
    let mut rewind = StyleMap::new();
    for (prop, value) in parse_style(text).iter() {
        match value.split_once('|') {
            Some((e, r)) => {
                let e = e.trim();
                let r = r.trim();
                if !e.is_empty() {
                    enter.insert(prop, e.to_string());
                }
                if !r.is_empty() {
                    rewind.insert(prop, r.to_string());
                }
            }
            None => {
                let v = value.trim();
                if !v.is_empty() {
                    enter.insert(prop, v.to_string());
                }
            }
        }
    }
    (enter, rewind)
}

/// Resolves a block-reference expression against the ordered top-level
/// ids: `all`, a comma list, `a..b`, `...b` or `a...`.
fn resolve_block_refs(expr: &str, ids: &[String], line: usize) -> Result<Vec<String>, ParseError> {
    let expr = expr.trim();
    if expr == "all" {
        return Ok(ids.to_vec());
    }
    if let Some(end) = expr.strip_prefix("...") {
        let end_idx = position(ids, end.trim(), 0).ok_or_else(|| unknown_id(end.trim(), line))?;
        return Ok(ids[..=end_idx].to_vec());
    }
    if let Some(start) = expr.strip_suffix("...") {
        let start_idx =
            position(ids, start.trim(), 0).ok_or_else(|| unknown_id(start.trim(), line))?;
        return Ok(ids[start_idx..].to_vec());
    }
    if let Some((start, end)) = expr.split_once("..") {
        let (start, end) = (start.trim(), end.trim());
        let start_idx = position(ids, start, 0).ok_or_else(|| unknown_id(start, line))?;
        let end_idx =
            position(ids, end, start_idx + 1).ok_or_else(|| unknown_id(end, line))?;
        return Ok(ids[start_idx..=end_idx].to_vec());
    }
    Ok(expr
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect())
}

/// First occurrence of `id` at or after `from`.
fn position(ids: &[String], id: &str, from: usize) -> Option<usize> {
    ids.iter().skip(from).position(|x| x == id).map(|i| i + from)
}

fn unknown_id(id: &str, line: usize) -> ParseError {
    ParseError::new(line, format!("unknown block id `{id}` in reveal expression"))
}
