//! `org-feedback`: execution outcomes and the live database model.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                      |
//! |--------------|---------------------------------------------------------------|
//! | [`feedback`] | `ExecutionFeedback`, `ErrorClass`, `ConstraintKind`           |
//! | [`shape`]    | `StatementShape::classify` (leading keyword + table)          |
//! | [`state`]    | `DatabaseState`, `DatabaseStateStore` (copy-on-read)          |
//! | [`sync`]     | `DatabaseStateSynchronizer`, `SyncHandle`, `SyncConfig`       |
//! | [`error`]    | `SyncError`, `SyncResult<T>`                                  |
//!
//! # Consistency
//!
//! Readers see a snapshot that may lag the newest feedback by whatever is
//! still queued.  Nothing downstream depends on exact counts.

pub mod error;
pub mod feedback;
pub mod shape;
pub mod state;
pub mod sync;

#[cfg(test)]
mod tests;

pub use error::{SyncError, SyncResult};
pub use feedback::{ConstraintKind, ErrorClass, ExecutionFeedback};
pub use shape::StatementShape;
pub use state::{DatabaseState, DatabaseStateStore, ErrorRecord, ViolationRecord};
pub use sync::{DatabaseStateSynchronizer, SyncConfig, SyncHandle, SyncReport};
