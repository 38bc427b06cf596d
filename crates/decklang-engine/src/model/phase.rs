use std::collections::HashMap;

use super::ordered::OrderedMap;
use super::style::StyleMap;

/// Enter/rewind style pair for one transition target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transition {
    pub enter: StyleMap,
    pub rewind: StyleMap,
}

/// A named step in the slide's reveal sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Phase {
    pub id: String,
    /// Per-target-block transitions, in first-reference order.
    pub transitions: OrderedMap<Transition>,
}

impl Phase {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            transitions: OrderedMap::new(),
        }
    }

    /// Transition slot for `target`, created empty if absent.
    pub fn transition_mut(&mut self, target: &str) -> &mut Transition {
        self.transitions
            .entry_or_insert_with(target, Transition::default)
    }
}

/// Append-only phase arena with an id lookup table.
///
/// The ensure operations hand back the stored phase by stable position,
/// so repeated macro application cannot create duplicates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhaseList {
    phases: Vec<Phase>,
    by_id: HashMap<String, usize>,
}

impl PhaseList {
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn push(&mut self, phase: Phase) {
        self.by_id
            .entry(phase.id.clone())
            .or_insert(self.phases.len());
        self.phases.push(phase);
    }

    pub fn get(&self, index: usize) -> Option<&Phase> {
        self.phases.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Phase> {
        self.phases.iter()
    }

    /// Seeds the implicit `initial` phase at index 0 if the list is still
    /// empty.
    pub fn ensure_seeded(&mut self) {
        if self.phases.is_empty() {
            self.push(Phase::new("initial"));
        }
    }

    /// Grows the list with synthetic `phase<n>` entries until `index` is
    /// valid, then returns the phase at that index.
    pub fn ensure_index(&mut self, index: usize) -> &mut Phase {
        self.ensure_seeded();
        while self.phases.len() <= index {
            let id = format!("phase{}", self.phases.len());
            self.push(Phase::new(id));
        }
        &mut self.phases[index]
    }

    /// Phase with the given id, appended empty if absent.
    pub fn ensure_id(&mut self, id: &str) -> &mut Phase {
        self.ensure_seeded();
        if let Some(&idx) = self.by_id.get(id) {
            return &mut self.phases[idx];
        }
        let idx = self.phases.len();
        self.push(Phase::new(id));
        &mut self.phases[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_index_seeds_initial_and_grows() {
        let mut list = PhaseList::default();
        list.ensure_index(2);
        let ids: Vec<&str> = list.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["initial", "phase1", "phase2"]);
    }

    #[test]
    fn ensure_index_zero_is_initial() {
        let mut list = PhaseList::default();
        assert_eq!(list.ensure_index(0).id, "initial");
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn ensure_id_is_idempotent() {
        let mut list = PhaseList::default();
        list.ensure_id("outro").transitions.insert(
            "b1",
            Transition {
                enter: StyleMap::new(),
                rewind: StyleMap::new(),
            },
        );
        list.ensure_id("outro");
        assert_eq!(list.len(), 2);
        assert_eq!(list.get(1).map(|p| p.transitions.len()), Some(1));
    }

    #[test]
    fn ensure_id_of_initial_does_not_duplicate() {
        let mut list = PhaseList::default();
        list.ensure_id("initial");
        list.ensure_id("initial");
        assert_eq!(list.len(), 1);
    }
}
