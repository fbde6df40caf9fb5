//! # Compiled state machine
//!
//! [`StateMachine::build`] turns an ordered rule list into two lookup maps:
//!
//! | Map | Key | Filled from |
//! |-----|-----|-------------|
//! | keyed | `(from, input)` | every rule whose input is not [`DEFAULT_INPUT`] |
//! | default | `from` | rules whose input is [`DEFAULT_INPUT`] (`"0"`) |
//!
//! State names (from both `from` and `to`) get a [`StateId`] in first-seen
//! order; input symbols live in their own id space ([`InputId`]).
//!
//! ## Stepping policy
//!
//! [`StateMachine::step`] tries the keyed map, then the default map, and
//! otherwise stays in the current state. A current state the table never
//! mentions also stays put. Stepping never fails.

use std::collections::HashMap;

use crate::table::{Rule, TransitionTable};

/// Input symbol meaning "no specific input".
pub const DEFAULT_INPUT: &str = "0";

/// Dense id of a state name, assigned in first-seen order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(u32);

impl StateId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Dense id of an input symbol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InputId(u32);

/// Errors raised while compiling a transition table.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("rule {index} has an empty {field} name")]
    EmptyName { index: usize, field: &'static str },
    #[error("conflicting rules for state `{from}` on input `{input}`: `{first}` and `{second}`")]
    Conflict {
        from: String,
        input: String,
        first: String,
        second: String,
    },
    #[error("invalid transition table: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Immutable `(state, input) → state` lookup.
#[derive(Clone, Debug, Default)]
pub struct StateMachine {
    states: Vec<String>,
    state_ids: HashMap<String, StateId>,
    input_ids: HashMap<String, InputId>,
    keyed: HashMap<(StateId, InputId), StateId>,
    defaults: HashMap<StateId, StateId>,
}

impl StateMachine {
    /// Compile an ordered rule list.
    ///
    /// Repeating a `(from, input)` pair with the same target is accepted;
    /// repeating it with a different target is a [`BuildError::Conflict`].
    pub fn build<I, R>(rules: I) -> Result<Self, BuildError>
    where
        I: IntoIterator<Item = R>,
        R: Into<Rule>,
    {
        let mut machine = StateMachine::default();

        for (index, rule) in rules.into_iter().map(Into::into).enumerate() {
            for (field, name) in [("from", &rule.from), ("input", &rule.input), ("to", &rule.to)] {
                if name.is_empty() {
                    return Err(BuildError::EmptyName { index, field });
                }
            }

            let from = machine.intern_state(&rule.from);
            let to = machine.intern_state(&rule.to);

            let existing = if rule.input == DEFAULT_INPUT {
                *machine.defaults.entry(from).or_insert(to)
            } else {
                let input = machine.intern_input(&rule.input);
                *machine.keyed.entry((from, input)).or_insert(to)
            };

            if existing != to {
                return Err(BuildError::Conflict {
                    first: machine.states[existing.index()].clone(),
                    from: rule.from,
                    input: rule.input,
                    second: rule.to,
                });
            }
        }

        Ok(machine)
    }

    pub fn from_table(table: &TransitionTable) -> Result<Self, BuildError> {
        Self::build(table.rules.iter().cloned())
    }

    /// Parse a TOML [`TransitionTable`] and compile it.
    pub fn from_toml(s: &str) -> Result<Self, BuildError> {
        Self::from_table(&TransitionTable::from_toml(s)?)
    }

    /// Next state name for `current` on `input`.
    pub fn step<'a>(&'a self, current: &'a str, input: &str) -> &'a str {
        match self.state_id(current) {
            Some(id) => self.state_name(self.step_id(id, input)).unwrap_or(current),
            None => current,
        }
    }

    /// Id-level [`step`](Self::step).
    pub fn step_id(&self, current: StateId, input: &str) -> StateId {
        if input != DEFAULT_INPUT {
            let keyed = self
                .input_ids
                .get(input)
                .and_then(|input| self.keyed.get(&(current, *input)));
            if let Some(next) = keyed {
                return *next;
            }
        }
        self.defaults.get(&current).copied().unwrap_or(current)
    }

    pub fn state_id(&self, name: &str) -> Option<StateId> {
        self.state_ids.get(name).copied()
    }

    pub fn state_name(&self, id: StateId) -> Option<&str> {
        self.states.get(id.index()).map(String::as_str)
    }

    /// State names in id order.
    pub fn states(&self) -> impl Iterator<Item = &str> {
        self.states.iter().map(String::as_str)
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    fn intern_state(&mut self, name: &str) -> StateId {
        if let Some(id) = self.state_ids.get(name) {
            return *id;
        }
        let id = StateId(self.states.len() as u32);
        self.states.push(name.to_string());
        self.state_ids.insert(name.to_string(), id);
        id
    }

    fn intern_input(&mut self, symbol: &str) -> InputId {
        let next = InputId(self.input_ids.len() as u32);
        *self.input_ids.entry(symbol.to_string()).or_insert(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyed_default_and_noop() {
        let fsm = StateMachine::build([("A", "1", "B"), ("B", "0", "A")]).unwrap();

        assert_eq!(fsm.step("A", "1"), "B");
        assert_eq!(fsm.step("B", "0"), "A");
        assert_eq!(fsm.step("A", "9"), "A");
    }

    #[test]
    fn test_default_applies_to_unmatched_input() {
        let fsm = StateMachine::build([("B", "0", "A")]).unwrap();
        assert_eq!(fsm.step("B", "anything"), "A");
    }

    #[test]
    fn test_keyed_rule_wins_over_default() {
        let fsm = StateMachine::build([("A", "0", "C"), ("A", "go", "B")]).unwrap();
        assert_eq!(fsm.step("A", "go"), "B");
        assert_eq!(fsm.step("A", "stop"), "C");
    }

    #[test]
    fn test_ids_in_first_seen_order() {
        let fsm = StateMachine::build([("x", "1", "y"), ("z", "1", "x")]).unwrap();
        let names: Vec<&str> = fsm.states().collect();
        assert_eq!(names, vec!["x", "y", "z"]);
        assert_eq!(fsm.state_id("z").map(StateId::index), Some(2));
        // inputs are not states
        assert_eq!(fsm.state_id("1"), None);
    }

    #[test]
    fn test_unknown_current_state_stays() {
        let fsm = StateMachine::build([("A", "1", "B")]).unwrap();
        assert_eq!(fsm.step("Q", "1"), "Q");
    }

    #[test]
    fn test_duplicate_rule_is_accepted() {
        let fsm = StateMachine::build([("A", "1", "B"), ("A", "1", "B")]).unwrap();
        assert_eq!(fsm.state_count(), 2);
    }

    #[test]
    fn test_conflicting_rules_are_rejected() {
        let err = StateMachine::build([("A", "1", "B"), ("A", "1", "C")]).unwrap_err();
        match err {
            BuildError::Conflict { from, first, second, .. } => {
                assert_eq!(from, "A");
                assert_eq!(first, "B");
                assert_eq!(second, "C");
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = StateMachine::build([("A", "0", "B"), ("A", "0", "C")]).unwrap_err();
        assert!(matches!(err, BuildError::Conflict { .. }));
    }

    #[test]
    fn test_empty_names_are_rejected() {
        let err = StateMachine::build([("A", "", "B")]).unwrap_err();
        assert!(matches!(err, BuildError::EmptyName { index: 0, field: "input" }));
    }

    #[test]
    fn test_step_id_matches_step() {
        let fsm = StateMachine::build([("A", "1", "B")]).unwrap();
        let a = fsm.state_id("A").unwrap();
        let b = fsm.step_id(a, "1");
        assert_eq!(fsm.state_name(b), Some("B"));
    }

    #[test]
    fn test_from_toml() {
        let fsm = StateMachine::from_toml(
            r#"
            [[rule]]
            from = "login"
            input = "user"
            to = "home"
            "#,
        )
        .unwrap();
        assert_eq!(fsm.step("login", "user"), "home");

        let err = StateMachine::from_toml("[[rule]]\nfrom = 1").unwrap_err();
        assert!(matches!(err, BuildError::Parse(_)));
    }
}
