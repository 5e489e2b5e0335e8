//! Backup and restore orchestration
//!
//! Each workflow runs its steps in a fixed order and reports through an
//! outcome value instead of an error: failures are logged, intermediate
//! artifacts are removed, and compensating actions (resuming suspended
//! Actions) run on every exit path.

pub mod backup;
pub mod restore;

pub use backup::{BackupOutcome, BackupWorkflow};
pub use restore::{RestoreOutcome, RestoreWorkflow};
