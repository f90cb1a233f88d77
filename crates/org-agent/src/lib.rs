//! `org-agent`: who the simulated workforce is and what it may touch.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                     |
//! |---------------|--------------------------------------------------------------|
//! | [`profile`]   | `AgentProfile`, `SkillLevel`, `ExpertiseLevel`               |
//! | [`catalog`]   | `RoleCatalog` (shift windows, permitted resources), CSV load |
//! | [`loader`]    | Population CSV loader                                        |
//! | [`builder`]   | `PopulationBuilder` (synthetic populations + per-agent RNGs) |
//! | [`error`]     | `AgentError`, `AgentResult`                                  |
//!
//! Profile types always derive `Serialize`/`Deserialize`; the CSV loaders
//! need `serde` regardless.

pub mod builder;
pub mod catalog;
pub mod error;
pub mod loader;
pub mod profile;


pub use builder::PopulationBuilder;
pub use catalog::{load_permissions_csv, load_permissions_reader, RoleCatalog, RoleSpec, DEFAULT_HOURS};
pub use error::{AgentError, AgentResult};
pub use loader::{load_population_csv, load_population_reader};
pub use profile::{AgentProfile, ExpertiseLevel, SkillLevel};
