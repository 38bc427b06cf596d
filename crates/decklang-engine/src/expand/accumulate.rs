use std::collections::HashMap;

use crate::error::ParseError;
use crate::model::Block;

/// Running accumulation groups, threaded through the traversal so group
/// state follows document order, not tree structure.
#[derive(Debug, Default)]
pub struct AccumulateContext {
    groups: HashMap<String, String>,
}

/// `accumulate.content = <group>`: every block sharing a group ends up
/// with the newline-joined content of all prior group members up to and
/// including itself. Targets other than `content` are left untouched.
pub fn apply(block: &mut Block, ctx: &mut AccumulateContext) -> Result<(), ParseError> {
    let keys: Vec<String> = block
        .macro_attributes
        .keys()
        .filter(|k| k.starts_with("accumulate."))
        .map(String::from)
        .collect();

    for key in keys {
        let target = &key["accumulate.".len()..];
        if target != "content" {
            continue;
        }
        let Some(group_name) = block
            .macro_attributes
            .get(&key)
            .and_then(|v| v.as_text())
            .map(String::from)
        else {
            continue;
        };
        block.macro_attributes.remove(&key);

        let accumulated = ctx
            .groups
            .entry(group_name)
            .and_modify(|group| {
                group.push('\n');
                group.push_str(&block.content);
            })
            .or_insert_with(|| block.content.clone());
        block.content = accumulated.clone();
    }
    Ok(())
}
