//! # fsm — table-driven finite state machine
//!
//! A small, reusable `(state, input) → next state` engine. Transition rules are
//! written once (in code or as a TOML [`TransitionTable`]), compiled into a
//! [`StateMachine`], and never mutated afterwards.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`machine`] | [`StateMachine`] compilation and stepping, [`BuildError`]. |
//! | [`table`] | Serialisable rule list ([`Rule`], [`TransitionTable`]). |

pub mod machine;
pub mod table;

pub use machine::{BuildError, InputId, StateId, StateMachine, DEFAULT_INPUT};
pub use table::{Rule, TransitionTable};
