use std::sync::OnceLock;

use regex::Regex;

use crate::error::ParseError;
use crate::model::{AttrMap, AttrValue, Block};

/// `name[var=value]` conditional-merge attribute keys.
fn bracket_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?<name>.+)\[(?<var>[^=\]]+)=(?<val>[^\]]*)\]$").expect("invalid bracket regex")
    })
}

/// `name{expr}suffix` template keys.
fn brace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?<name>[^{}]*)\{(?<expr>[^{}]+)\}(?<suffix>.*)$").expect("invalid brace regex")
    })
}

/// `each+1`-style arithmetic inside a brace template.
fn arith_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?<var>[A-Za-z_][A-Za-z0-9_]*)\s*(?<op>[+\-*/])\s*(?<amount>-?\d+)$")
            .expect("invalid arithmetic regex")
    })
}

/// Unrolls `for` macro blocks into concrete sibling blocks, recursing
/// into ordinary blocks so loops may appear at any depth.
pub fn expand_macro_blocks(blocks: Vec<Block>) -> Result<Vec<Block>, ParseError> {
    let mut out = Vec::with_capacity(blocks.len());
    for mut block in blocks {
        if block.is_macro {
            match block.block_type.as_str() {
                "for" => out.extend(expand_for(&block)?),
                other => {
                    return Err(ParseError::new(
                        block.line,
                        format!("unknown block macro `{other}`"),
                    ));
                }
            }
        } else {
            block.children = expand_macro_blocks(std::mem::take(&mut block.children))?;
            out.push(block);
        }
    }
    Ok(out)
}

fn expand_for(block: &Block) -> Result<Vec<Block>, ParseError> {
    let each = block
        .macro_attributes
        .get_text("each")
        .ok_or_else(|| ParseError::new(block.line, "`for` macro requires an `each` attribute"))?
        .to_string();
    let values = block
        .macro_attributes
        .get_text("values")
        .ok_or_else(|| ParseError::new(block.line, "`for` macro requires a `values` attribute"))?
        .to_string();
    let item_type = block
        .macro_attributes
        .get_text("type")
        .unwrap_or_default()
        .to_string();
    let placeholder = format!("{{{each}}}");

    let mut out = Vec::new();
    for item in values.split(',').map(str::trim) {
        let mut attributes = AttrMap::new();
        for (key, value) in block.attributes.iter() {
            let value = substitute_value(value, &placeholder, item);
            if let KeyRewrite::Keep(key) = rewrite_key(key, &each, item, block.line)? {
                attributes.merge(&key, value);
            }
        }

        let mut macro_attributes = AttrMap::new();
        for (key, value) in block.macro_attributes.iter() {
            if matches!(key, "each" | "values" | "type") {
                continue;
            }
            let value = substitute_value(value, &placeholder, item);
            if let KeyRewrite::Keep(key) = rewrite_key(key, &each, item, block.line)? {
                macro_attributes.merge(&key, value);
            }
        }

        out.push(Block {
            block_type: item_type.clone(),
            is_macro: false,
            attributes,
            macro_attributes,
            content: block.content.replace(&placeholder, item),
            children: Vec::new(),
            depth: block.depth,
            line: block.line,
        });
    }
    Ok(out)
}

enum KeyRewrite {
    Keep(String),
    /// Bracket key whose encoded value is not the current item.
    Skip,
}

/// Applies the loop-variable rewriting rules to one attribute key.
///
/// Brace templates keep their braces: `phase{n}.style` over item `2`
/// becomes `phase{2}.style`, so index-form macro keys still match after
/// unrolling.
fn rewrite_key(key: &str, each: &str, item: &str, line: usize) -> Result<KeyRewrite, ParseError> {
    if let Some(caps) = bracket_re().captures(key)
        && &caps["var"] == each
    {
        return Ok(if &caps["val"] == item {
            KeyRewrite::Keep(caps["name"].to_string())
        } else {
            KeyRewrite::Skip
        });
    }

    if let Some(caps) = brace_re().captures(key) {
        let expr = caps["expr"].trim();
        if !expr.is_empty() && expr.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(KeyRewrite::Keep(key.to_string()));
        }
        if expr == each {
            return Ok(KeyRewrite::Keep(format!(
                "{}{{{}}}{}",
                &caps["name"], item, &caps["suffix"]
            )));
        }
        if let Some(arith) = arith_re().captures(expr)
            && &arith["var"] == each
        {
            let result = eval_arith(item, &arith["op"], &arith["amount"], line)?;
            return Ok(KeyRewrite::Keep(format!(
                "{}{{{}}}{}",
                &caps["name"], result, &caps["suffix"]
            )));
        }
        return Ok(KeyRewrite::Keep(key.to_string()));
    }

    Ok(KeyRewrite::Keep(
        key.replace(&format!("{{{each}}}"), item),
    ))
}

fn eval_arith(item: &str, op: &str, amount: &str, line: usize) -> Result<i64, ParseError> {
    let lhs: i64 = item.trim().parse().map_err(|_| {
        ParseError::new(
            line,
            format!("loop item `{item}` is not numeric, cannot apply `{op}{amount}`"),
        )
    })?;
    let rhs: i64 = amount
        .parse()
        .map_err(|_| ParseError::new(line, format!("loop step `{amount}` is not numeric")))?;
    match op {
        "+" => Ok(lhs + rhs),
        "-" => Ok(lhs - rhs),
        "*" => Ok(lhs * rhs),
        "/" if rhs == 0 => Err(ParseError::new(line, "division by zero in loop key")),
        "/" => Ok(lhs / rhs),
        other => Err(ParseError::new(
            line,
            format!("unsupported loop operator `{other}`"),
        )),
    }
}

fn substitute_value(value: &AttrValue, placeholder: &str, item: &str) -> AttrValue {
    match value {
        AttrValue::Text(s) => AttrValue::Text(s.replace(placeholder, item)),
        AttrValue::Flag(b) => AttrValue::Flag(*b),
        AttrValue::Many(values) => AttrValue::Many(
            values
                .iter()
                .map(|v| substitute_value(v, placeholder, item))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn for_block(macro_attrs: &[(&str, &str)], attrs: &[(&str, &str)], content: &str) -> Block {
        let mut block = Block {
            block_type: "for".to_string(),
            is_macro: true,
            content: content.to_string(),
            depth: 1,
            line: 1,
            ..Block::default()
        };
        for (k, v) in macro_attrs {
            block.macro_attributes.merge(k, AttrValue::text(*v));
        }
        for (k, v) in attrs {
            block.attributes.merge(k, AttrValue::text(*v));
        }
        block
    }

    #[test]
    fn unrolls_items_with_substitution() {
        let block = for_block(
            &[("each", "n"), ("values", "1,2,3"), ("type", "text")],
            &[("id", "block{n}"), ("source", "image{n}.png")],
            "<h1>Bullet {n}</h1>",
        );
        let expanded = expand_macro_blocks(vec![block]).unwrap();
        assert_eq!(expanded.len(), 3);
        for (i, block) in expanded.iter().enumerate() {
            let n = i + 1;
            assert_eq!(block.block_type, "text");
            assert_eq!(block.id(), Some(format!("block{n}").as_str()));
            assert_eq!(
                block.attributes.get_text("source"),
                Some(format!("image{n}.png").as_str())
            );
            assert_eq!(block.content, format!("<h1>Bullet {n}</h1>"));
            assert!(block.macro_attributes.is_empty());
            assert!(!block.is_macro);
        }
    }

    #[test]
    fn bracket_keys_merge_only_on_matching_item() {
        let block = for_block(
            &[("each", "n"), ("values", "1,2"), ("type", "text")],
            &[("style[n=2]", "color: red")],
            "",
        );
        let expanded = expand_macro_blocks(vec![block]).unwrap();
        assert_eq!(expanded[0].attributes.get("style"), None);
        assert_eq!(expanded[1].attributes.get_text("style"), Some("color: red"));
    }

    #[test]
    fn brace_keys_keep_braces_for_later_macros() {
        let block = for_block(
            &[
                ("each", "n"),
                ("values", "1,2"),
                ("type", "text"),
                ("phase{n}.style", "opacity: {n}"),
            ],
            &[],
            "",
        );
        let expanded = expand_macro_blocks(vec![block]).unwrap();
        assert_eq!(
            expanded[0].macro_attributes.get_text("phase{1}.style"),
            Some("opacity: 1")
        );
        assert_eq!(
            expanded[1].macro_attributes.get_text("phase{2}.style"),
            Some("opacity: 2")
        );
    }

    #[test]
    fn brace_arithmetic_evaluates_per_item() {
        let block = for_block(
            &[
                ("each", "n"),
                ("values", "1,2"),
                ("type", "text"),
                ("phase{n+1}.style", "opacity: 1"),
            ],
            &[],
            "",
        );
        let expanded = expand_macro_blocks(vec![block]).unwrap();
        assert!(expanded[0].macro_attributes.get("phase{2}.style").is_some());
        assert!(expanded[1].macro_attributes.get("phase{3}.style").is_some());
    }

    #[test]
    fn digit_literal_brace_keys_are_untouched() {
        let block = for_block(
            &[
                ("each", "n"),
                ("values", "1,2"),
                ("type", "text"),
                ("phase{1}.style", "opacity: 1"),
            ],
            &[],
            "",
        );
        let expanded = expand_macro_blocks(vec![block]).unwrap();
        for b in &expanded {
            assert!(b.macro_attributes.get("phase{1}.style").is_some());
        }
    }

    #[test]
    fn non_numeric_item_with_arithmetic_is_fatal() {
        let block = for_block(
            &[
                ("each", "n"),
                ("values", "a,b"),
                ("type", "text"),
                ("phase{n+1}.style", "opacity: 1"),
            ],
            &[],
            "",
        );
        let err = expand_macro_blocks(vec![block]).unwrap_err();
        assert!(err.message.contains("not numeric"));
    }

    #[test]
    fn missing_each_or_values_is_fatal() {
        let block = for_block(&[("values", "1,2")], &[], "");
        let err = expand_macro_blocks(vec![block]).unwrap_err();
        assert!(err.message.contains("each"));

        let block = for_block(&[("each", "n")], &[], "");
        let err = expand_macro_blocks(vec![block]).unwrap_err();
        assert!(err.message.contains("values"));
    }

    #[test]
    fn unknown_macro_name_is_fatal() {
        let block = Block {
            block_type: "while".to_string(),
            is_macro: true,
            line: 7,
            ..Block::default()
        };
        let err = expand_macro_blocks(vec![block]).unwrap_err();
        assert_eq!(err.line, 7);
        assert!(err.message.contains("while"));
    }

    #[test]
    fn recurses_into_ordinary_children() {
        let inner = for_block(
            &[("each", "n"), ("values", "1,2"), ("type", "text")],
            &[],
            "{n}",
        );
        let parent = Block {
            block_type: "column-layout".to_string(),
            children: vec![inner],
            depth: 1,
            line: 1,
            ..Block::default()
        };
        let expanded = expand_macro_blocks(vec![parent]).unwrap();
        assert_eq!(expanded[0].children.len(), 2);
        assert_eq!(expanded[0].children[0].content, "1");
    }
}
