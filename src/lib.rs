//! gitshield - Encrypted offsite backup and restore for git repositories
//!
//! This library mirrors a repository into a compressed, password-encrypted
//! archive, uploads it to a remote vault, and restores it again once the
//! operator confirms a one-time password.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Inputs, settings, runner context and artifact paths
//! - `error`: Custom error types
//! - `crypto`: Password hashing and the salted AES envelope
//! - `archive`: tar bundling and zstd compression
//! - `git`: Mirror clones, history filtering and pushes
//! - `github`: Actions permissions API and suspension
//! - `remote`: Vault API client
//! - `otp`: One-time-password verification flow
//! - `workflow`: The backup and restore pipelines
//! - `storage`: Atomic JSON files and artifact cleanup
//! - `cli`: Command handlers
//!
//! # Example
//!
//! ```rust,ignore
//! use gitshield::workflow::BackupWorkflow;
//!
//! let outcome = BackupWorkflow::new(&config, &git, &remote).execute();
//! println!("{}", outcome.summary());
//! ```

pub mod archive;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod error;
pub mod git;
pub mod github;
pub mod logging;
pub mod otp;
pub mod remote;
pub mod storage;
pub mod validation;
pub mod workflow;

pub use error::{ShieldError, ShieldResult};
