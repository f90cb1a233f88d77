//! `org-sim`: drives the simulated workforce.
//!
//! # Two drivers
//!
//! ```text
//! Stepped (Scheduler<C>, deterministic for a seed):
//!   for each tick:
//!     ① Decide:  every agent off cooldown and admitted by the gate steps
//!                once (parallel with the `parallel` feature).
//!     ② Apply:   in ascending AgentId order, start cooldowns and emit intents.
//!     ③ Advance: move the clock one tick.
//!
//! Real-time (SimRuntime, one tokio task per agent):
//!   each worker: gate → step → assess → translate → execute → ingest →
//!                react → cancellable sleep for its cooldown
//! ```
//!
//! # Crate layout
//!
//! | Module        | Contents                                                   |
//! |---------------|------------------------------------------------------------|
//! | [`scheduler`] | `Scheduler<C>` and its tick loop                           |
//! | [`builder`]   | `SchedulerBuilder` (validates population and policies)     |
//! | [`observer`]  | `SimObserver`, `NoopObserver`, `LogObserver`               |
//! | [`pipeline`]  | `Translator`, `Executor`, `Dispatcher`                     |
//! | [`context`]   | `ContextAssembler`: decision → `QueryContext`              |
//! | [`runtime`]   | `SimRuntime`, `RuntimeHandle`, `RuntimeConfig`             |
//! | [`stats`]     | `SimStats` atomics, serializable `StatsSnapshot`           |
//! | [`error`]     | `SimError`, `SimResult<T>`                                 |
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | Runs the decision phase on Rayon's thread pool.        |
//! | `fx-hash`  | FxHash for the cooldown table.                         |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use org_agent::PopulationBuilder;
//! use org_core::{Role, SimConfig};
//! use org_sim::{NoopObserver, SchedulerBuilder};
//!
//! let config = SimConfig::default();
//! let (profiles, rngs) = PopulationBuilder::new(config.seed)
//!     .with_role(Role::Sales, 20)
//!     .with_adversaries(1)
//!     .build();
//! let mut scheduler = SchedulerBuilder::new(config.make_stepped_clock(), profiles, rngs).build()?;
//! scheduler.run_ticks(config.total_ticks, config.tick_minutes, &mut NoopObserver);
//! ```

pub mod builder;
pub mod context;
pub mod error;
pub mod observer;
pub mod pipeline;
pub mod runtime;
pub mod scheduler;
pub mod stats;

#[cfg(test)]
mod tests;

pub use builder::SchedulerBuilder;
pub use context::{temporal_context, workflow_for, ContextAssembler};
pub use error::{SimError, SimResult};
pub use observer::{LogObserver, NoopObserver, SimObserver};
pub use pipeline::{Dispatcher, Executor, Translator};
pub use runtime::{RuntimeConfig, RuntimeHandle, RuntimeReport, SimRuntime};
pub use scheduler::Scheduler;
pub use stats::{ResourceSummary, SimStats, StatsSnapshot};
