//! Local storage helpers
//!
//! Atomic JSON persistence for crash-surviving state, and cleanup of the
//! intermediate artifacts a run leaves in its work directory.

pub mod artifacts;
pub mod file_io;

pub use artifacts::remove_artifacts;
pub use file_io::{read_json_optional, write_json_atomic};
