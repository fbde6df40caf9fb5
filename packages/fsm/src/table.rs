//! # Transition tables as data
//!
//! A [`TransitionTable`] is the ordered rule list a [`StateMachine`](crate::StateMachine)
//! is compiled from. It round-trips through TOML so tables can live next to the
//! code that uses them:
//!
//! ```toml
//! [[rule]]
//! from = "login"
//! input = "admin:login"
//! to = "dashboard"
//!
//! [[rule]]
//! from = "dashboard"
//! input = "0"        # default: taken when no keyed rule matches
//! to = "login"
//! ```
//!
//! Rule order matters only for id assignment: state ids are handed out in the
//! order names first appear.

use serde::{Deserialize, Serialize};

/// One `(from, input) → to` transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub from: String,
    pub input: String,
    pub to: String,
}

impl Rule {
    pub fn new(from: impl Into<String>, input: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            input: input.into(),
            to: to.into(),
        }
    }
}

impl<F, I, T> From<(F, I, T)> for Rule
where
    F: Into<String>,
    I: Into<String>,
    T: Into<String>,
{
    fn from((from, input, to): (F, I, T)) -> Self {
        Rule::new(from, input, to)
    }
}

/// Ordered list of transition rules.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionTable {
    #[serde(rename = "rule", default)]
    pub rules: Vec<Rule>,
}

impl TransitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method appending a rule.
    pub fn with_rule(mut self, from: &str, input: &str, to: &str) -> Self {
        self.rules.push(Rule::new(from, input, to));
        self
    }

    /// Parse from TOML string.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Serialize to TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl<R: Into<Rule>> FromIterator<R> for TransitionTable {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().map(Into::into).collect(),
        }
    }
}
