use std::sync::OnceLock;

use regex::Regex;

use crate::error::ParseError;
use crate::model::{AttrValue, Block, SlideIr, parse_style};

/// `phase{<index>}.<prop>` / `phase[<id>].<prop>` macro-attribute keys.
fn phase_key_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^phase(?:\{(?<index>\d+)\}|\[(?<id>[^\]]+)\])(?:\.(?<prop>.+))?$")
            .expect("invalid phase-key regex")
    })
}

enum PhaseRef {
    Index(usize),
    Id(String),
}

/// Applies phase directives found in the block's macro attributes,
/// growing the slide's phase list as needed. Consumed keys are removed.
pub fn apply(block: &mut Block, slide: &mut SlideIr) -> Result<(), ParseError> {
    let keys: Vec<String> = block
        .macro_attributes
        .keys()
        .filter(|k| phase_key_re().is_match(k))
        .map(String::from)
        .collect();
    if keys.is_empty() {
        return Ok(());
    }

    let target = block.id().unwrap_or_default().to_string();
    for key in keys {
        let Some(value) = block.macro_attributes.remove(&key) else {
            continue;
        };
        let Some(caps) = phase_key_re().captures(&key) else {
            continue;
        };
        let phase_ref = match caps.name("index") {
            Some(m) => PhaseRef::Index(m.as_str().parse().map_err(|_| {
                ParseError::new(
                    block.line,
                    format!("phase index `{}` is out of range", m.as_str()),
                )
            })?),
            None => PhaseRef::Id(caps["id"].to_string()),
        };
        let prop = caps.name("prop").map(|m| m.as_str().to_string());

        for scalar in value.scalars() {
            let AttrValue::Text(text) = scalar else {
                continue;
            };
            apply_directives(&phase_ref, prop.as_deref(), text, &target, slide);
        }
    }
    Ok(())
}

/// One directive is a `(property, value)` pair whose value splits once on
/// `|` into enter/rewind components.
fn apply_directives(
    phase_ref: &PhaseRef,
    prop: Option<&str>,
    value: &str,
    target: &str,
    slide: &mut SlideIr,
) {
    let directives: Vec<(Option<String>, String)> = match prop {
        Some("style") => parse_style(value)
            .iter()
            .map(|(name, v)| (Some(name.to_string()), v.clone()))
            .collect(),
        _ => vec![(None, value.to_string())],
    };

    for (property, directive) in directives {
        let (enter_raw, rewind_raw) = match directive.split_once('|') {
            Some((enter, rewind)) => (enter.trim(), rewind.trim()),
            None => (directive.trim(), ""),
        };
        let enter = parse_style(&prefix_component(property.as_deref(), enter_raw));
        let rewind = parse_style(&prefix_component(property.as_deref(), rewind_raw));

        let phases = slide.phases_mut();
        let phase = match phase_ref {
            PhaseRef::Index(index) => phases.ensure_index(*index),
            PhaseRef::Id(id) => phases.ensure_id(id),
        };
        let transition = phase.transition_mut(target);
        transition.enter.merge(&enter);
        transition.rewind.merge(&rewind);
    }
}

fn prefix_component(property: Option<&str>, component: &str) -> String {
    match property {
        _ if component.is_empty() => String::new(),
        Some(property) => format!("{property}: {component}"),
        None => component.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_with(id: Option<&str>, macro_attrs: &[(&str, &str)]) -> Block {
        let mut block = Block {
            block_type: "text".to_string(),
            line: 1,
            depth: 1,
            ..Block::default()
        };
        if let Some(id) = id {
            block.attributes.merge("id", AttrValue::text(id));
        }
        for (k, v) in macro_attrs {
            block.macro_attributes.merge(k, AttrValue::text(*v));
        }
        block
    }

    #[test]
    fn index_directives_seed_initial_and_grow() {
        let mut slide = SlideIr::default();
        let mut b1 = block_with(Some("b1"), &[("phase{1}.style", "opacity: 1 | 0")]);
        let mut b2 = block_with(Some("b2"), &[("phase{2}.style", "opacity: 1 | 0")]);
        apply(&mut b1, &mut slide).unwrap();
        apply(&mut b2, &mut slide).unwrap();

        let phases = slide.phases.unwrap();
        let ids: Vec<&str> = phases.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["initial", "phase1", "phase2"]);
        assert!(phases.get(0).unwrap().transitions.is_empty());
        let t = phases.get(1).unwrap().transitions.get("b1").unwrap();
        assert_eq!(t.enter.get("opacity"), Some(&"1".to_string()));
        assert_eq!(t.rewind.get("opacity"), Some(&"0".to_string()));
    }

    #[test]
    fn style_prop_fans_out_per_style_entry() {
        let mut slide = SlideIr::default();
        let mut block = block_with(
            Some("b1"),
            &[("phase{1}.style", "opacity: 1 | 0; transform: none | scale(0)")],
        );
        apply(&mut block, &mut slide).unwrap();
        let phases = slide.phases.unwrap();
        let t = phases.get(1).unwrap().transitions.get("b1").unwrap();
        assert_eq!(t.enter.get("opacity"), Some(&"1".to_string()));
        assert_eq!(t.enter.get("transform"), Some(&"none".to_string()));
        assert_eq!(t.rewind.get("transform"), Some(&"scale(0)".to_string()));
    }

    #[test]
    fn bare_directive_value_is_raw_style_text() {
        let mut slide = SlideIr::default();
        let mut block = block_with(Some("b1"), &[("phase{1}", "opacity: 1 | opacity: 0")]);
        apply(&mut block, &mut slide).unwrap();
        let phases = slide.phases.unwrap();
        let t = phases.get(1).unwrap().transitions.get("b1").unwrap();
        assert_eq!(t.enter.get("opacity"), Some(&"1".to_string()));
        assert_eq!(t.rewind.get("opacity"), Some(&"0".to_string()));
    }

    #[test]
    fn id_directives_look_up_or_append() {
        let mut slide = SlideIr::default();
        let mut b1 = block_with(Some("b1"), &[("phase[outro].style", "opacity: 1")]);
        let mut b2 = block_with(Some("b2"), &[("phase[outro].style", "opacity: 1")]);
        apply(&mut b1, &mut slide).unwrap();
        apply(&mut b2, &mut slide).unwrap();
        let phases = slide.phases.unwrap();
        let ids: Vec<&str> = phases.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["initial", "outro"]);
        assert_eq!(phases.get(1).unwrap().transitions.len(), 2);
    }

    #[test]
    fn missing_rewind_component_leaves_rewind_empty() {
        let mut slide = SlideIr::default();
        let mut block = block_with(Some("b1"), &[("phase{1}.style", "opacity: 1")]);
        apply(&mut block, &mut slide).unwrap();
        let phases = slide.phases.unwrap();
        let t = phases.get(1).unwrap().transitions.get("b1").unwrap();
        assert_eq!(t.enter.get("opacity"), Some(&"1".to_string()));
        assert!(t.rewind.is_empty());
    }

    #[test]
    fn blocks_without_id_target_the_empty_string() {
        let mut slide = SlideIr::default();
        let mut block = block_with(None, &[("phase{1}.style", "opacity: 1")]);
        apply(&mut block, &mut slide).unwrap();
        let phases = slide.phases.unwrap();
        assert!(phases.get(1).unwrap().transitions.get("").is_some());
    }

    #[test]
    fn consumed_keys_are_removed() {
        let mut slide = SlideIr::default();
        let mut block = block_with(
            Some("b1"),
            &[("phase{1}.style", "opacity: 1"), ("accumulate.content", "g")],
        );
        apply(&mut block, &mut slide).unwrap();
        assert!(block.macro_attributes.get("phase{1}.style").is_none());
        assert!(block.macro_attributes.get("accumulate.content").is_some());
    }
}
