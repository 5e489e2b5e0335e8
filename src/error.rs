//! Custom error types for gitshield
//!
//! Low-level services fail fast with a `ShieldError`; the workflow
//! orchestrators catch these at their top level and turn them into
//! structured outcomes.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for gitshield operations
#[derive(Error, Debug)]
pub enum ShieldError {
    /// Bad input shape (fatal, never retried)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// HTTP/API failure, with whatever status and body the server gave us
    #[error("{context}: {}", format_remote_detail(.status, .body))]
    Remote {
        context: String,
        status: Option<u16>,
        body: String,
    },

    /// Encryption failures
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Decryption failures (wrong password and corrupted data look the same)
    #[error("Decryption error: {0}")]
    Decryption(String),

    /// Archive source is not a directory
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// Tar creation or extraction errors
    #[error("Archive error: {0}")]
    Archive(String),

    /// Input was not produced by the matching compressor
    #[error("Decompression error: {0}")]
    Decompression(String),

    /// git subprocess failures
    #[error("Git command `{command}` failed: {message}")]
    Git { command: String, message: String },

    /// OTP request or verification failures
    #[error("OTP error: {0}")]
    Otp(String),

    /// Suspending or resuming GitHub Actions failed
    #[error("Actions suspension error: {0}")]
    Suspension(String),
}

fn format_remote_detail(status: &Option<u16>, body: &str) -> String {
    match status {
        Some(code) => format!("HTTP {} - {}", code, body),
        None => body.to_string(),
    }
}

impl ShieldError {
    /// Create a remote error with HTTP status context
    pub fn remote(context: impl Into<String>, status: Option<u16>, body: impl Into<String>) -> Self {
        Self::Remote {
            context: context.into(),
            status,
            body: body.into(),
        }
    }

    /// Create a git error for a failed command
    pub fn git(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Git {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a crypto error (either direction)
    pub fn is_crypto(&self) -> bool {
        matches!(self, Self::Encryption(_) | Self::Decryption(_))
    }

    /// Check if this is a remote API error
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }

    /// Check if this is a git error
    pub fn is_git(&self) -> bool {
        matches!(self, Self::Git { .. })
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for ShieldError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ShieldError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<reqwest::Error> for ShieldError {
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16());
        // reqwest errors can embed the request URL; drop it so tokens never leak
        Self::remote("HTTP request failed", status, err.without_url().to_string())
    }
}

/// Result type alias for gitshield operations
pub type ShieldResult<T> = Result<T, ShieldError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ShieldError::Config("test error".into());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_remote_error_with_status() {
        let err = ShieldError::remote("Failed to upload backup", Some(413), "{\"error\":\"too large\"}");
        assert_eq!(
            err.to_string(),
            "Failed to upload backup: HTTP 413 - {\"error\":\"too large\"}"
        );
        assert!(err.is_remote());
    }

    #[test]
    fn test_remote_error_without_status() {
        let err = ShieldError::remote("Authentication failed", None, "invalid activation code");
        assert_eq!(err.to_string(), "Authentication failed: invalid activation code");
    }

    #[test]
    fn test_git_error() {
        let err = ShieldError::git("git clone --mirror . repo-mirror", "exit status 128");
        assert_eq!(
            err.to_string(),
            "Git command `git clone --mirror . repo-mirror` failed: exit status 128"
        );
        assert!(err.is_git());
    }

    #[test]
    fn test_crypto_classification() {
        assert!(ShieldError::Decryption("bad".into()).is_crypto());
        assert!(ShieldError::Encryption("bad".into()).is_crypto());
        assert!(!ShieldError::Validation("bad".into()).is_crypto());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let shield_err: ShieldError = io_err.into();
        assert!(matches!(shield_err, ShieldError::Io(_)));
    }
}
