//! `org-behavior`: per-agent behavioral state machines.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                      |
//! |---------------|---------------------------------------------------------------|
//! | [`state`]     | `BenignState` nodes of the employee state machine             |
//! | [`attack`]    | `AttackChain`, `AttackStep`, `BypassTechnique`                |
//! | [`intent`]    | `Intent`, `Action`, `BypassMeta`                              |
//! | [`markov`]    | `TransitionTable` (built-in defaults + CSV loader)            |
//! | [`context`]   | `StepContext<'a>`: read-only inputs of one decision           |
//! | [`benign`]    | `BenignAgent`, `BenignTuning`                                 |
//! | [`adversary`] | `AdversarialAgent`, `AdversaryTuning`                         |
//! | [`model`]     | `AgentBehavior` trait, `Agent` dispatch enum                  |
//! | [`error`]     | `BehaviorError`, `BehaviorResult<T>`                          |
//!
//! # Design notes
//!
//! Agents are plain owned values.  The scheduler (stepped mode) or the
//! agent's dedicated worker (real-time mode) is the only code that ever
//! holds `&mut Agent`, so no agent state is behind a lock.

pub mod adversary;
pub mod attack;
pub mod benign;
pub mod context;
pub mod error;
pub mod intent;
pub mod markov;
pub mod model;
pub mod state;

#[cfg(test)]
mod tests;

pub use adversary::{AdversarialAgent, AdversaryTuning};
pub use attack::{AttackChain, AttackStep, BypassTechnique};
pub use benign::{BenignAgent, BenignTuning};
pub use context::StepContext;
pub use error::{BehaviorError, BehaviorResult};
pub use intent::{Action, BypassMeta, Intent};
pub use markov::{load_transitions_csv, load_transitions_reader, merge_tables, TransitionRow, TransitionTable};
pub use model::{Agent, AgentBehavior};
pub use state::BenignState;
