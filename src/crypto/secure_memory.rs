//! Secret string wrapper
//!
//! Passwords, activation codes and tokens travel through the crate as
//! [`SecureString`]. The buffer is wiped when the value is dropped and
//! formatting never reveals the contents.

use std::fmt;
use std::ops::Deref;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// Secret text, wiped on drop
#[derive(Clone, Default, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecureString(String);

impl SecureString {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Borrow the secret for the call that needs it
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Deref for SecureString {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SecureString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for SecureString {
    fn from(secret: String) -> Self {
        Self(secret)
    }
}

impl From<&str> for SecureString {
    fn from(secret: &str) -> Self {
        Self(secret.to_owned())
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecureString(*** {} chars)", self.0.chars().count())
    }
}

impl fmt::Display for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contents_are_reachable_through_deref() {
        let token = SecureString::new("ghs_abc");
        assert_eq!(token.as_str(), "ghs_abc");
        assert!(token.starts_with("ghs_"));
        assert_eq!(token.len(), 7);
    }

    #[test]
    fn test_formatting_hides_secret() {
        let password = SecureString::from("Secret123!");
        let debug = format!("{:?}", password);
        assert!(!debug.contains("Secret123!"));
        assert!(debug.contains("10 chars"));
        assert_eq!(password.to_string(), "***");
    }

    #[test]
    fn test_zeroize_clears_buffer() {
        let mut code = SecureString::from(String::from("ACT-1234"));
        code.zeroize();
        assert!(code.is_empty());
    }

    #[test]
    fn test_inputs_debug_does_not_leak_secrets() {
        let inputs = crate::config::inputs::test_inputs(crate::config::Action::Restore);
        let debug = format!("{:?}", inputs);
        assert!(!debug.contains("Secret123!"));
        assert!(!debug.contains("ACT-1234"));
        assert!(!debug.contains("ghs_default"));
    }
}
