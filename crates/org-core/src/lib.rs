//! `org-core`: foundational types for the `orgsim` workforce simulator.
//!
//! This crate is a dependency of every other `org-*` crate.  It has no
//! `org-*` dependencies and few external ones (`rand`, `chrono`, `thiserror`,
//! plus optional `serde`).
//!
//! # What lives here
//!
//! | Module    | Contents                                                      |
//! |-----------|---------------------------------------------------------------|
//! | [`ids`]   | `AgentId`, `SessionId`                                        |
//! | [`role`]  | `Role` tag (benign roles + `Adversary`)                       |
//! | [`time`]  | `SimTime`, `SimClock`, `VirtualClock`, `SteppedClock`, `WorkHours`, `SimConfig` |
//! | [`rng`]   | `AgentRng` (per-agent, deterministic)                         |
//! | [`error`] | `OrgError`, `OrgResult`                                       |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod error;
pub mod ids;
pub mod rng;
pub mod role;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{OrgError, OrgResult};
pub use ids::{AgentId, SessionId};
pub use rng::AgentRng;
pub use role::Role;
pub use time::{hour_of, is_weekend, SimClock, SimConfig, SimTime, SteppedClock, VirtualClock, WorkHours};

// Calendar types used throughout the public API.
pub use chrono::{NaiveDate, TimeDelta};
