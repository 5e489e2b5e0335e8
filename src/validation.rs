//! Input validation
//!
//! All checks fail with `ShieldError::Validation`; none are retried.

use crate::error::{ShieldError, ShieldResult};

/// Punctuation allowed (and one of which is required) in encryption passwords
pub const PASSWORD_SPECIAL_CHARS: &str = "!@#$%^&*(),.?\":{}|<>";

/// Validate an encryption password
///
/// Requires at least 8 characters drawn only from ASCII letters, digits and
/// [`PASSWORD_SPECIAL_CHARS`], with at least one of each class.
pub fn validate_password(password: &str) -> ShieldResult<()> {
    if password.is_empty() {
        return Err(ShieldError::Validation(
            "Encryption password is required".to_string(),
        ));
    }

    let length = password.chars().count();
    if length < 8 {
        return Err(ShieldError::Validation(format!(
            "Encryption password must be at least 8 characters (got {})",
            length
        )));
    }

    let is_special = |c: char| PASSWORD_SPECIAL_CHARS.contains(c);

    if !password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || is_special(c))
    {
        return Err(ShieldError::Validation(format!(
            "Encryption password can only contain alphanumeric characters and the following special characters: {}. \
             Emojis, unicode characters, and other symbols are not allowed.",
            PASSWORD_SPECIAL_CHARS
        )));
    }

    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(ShieldError::Validation(
            "Encryption password must contain at least one uppercase letter".to_string(),
        ));
    }

    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(ShieldError::Validation(
            "Encryption password must contain at least one lowercase letter".to_string(),
        ));
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ShieldError::Validation(
            "Encryption password must contain at least one digit".to_string(),
        ));
    }

    if !password.chars().any(is_special) {
        return Err(ShieldError::Validation(format!(
            "Encryption password must contain at least one special character ({})",
            PASSWORD_SPECIAL_CHARS
        )));
    }

    Ok(())
}

/// Validate the action name
pub fn validate_action(action: &str) -> ShieldResult<()> {
    match action {
        "" => Err(ShieldError::Validation("Action type is required".to_string())),
        "backup" | "restore" => Ok(()),
        _ => Err(ShieldError::Validation(
            "Invalid action type. Must be 'backup' or 'restore'".to_string(),
        )),
    }
}

/// Validate the OTP delivery method
pub fn validate_otp_method(method: &str) -> ShieldResult<()> {
    match method {
        "" => Err(ShieldError::Validation(
            "OTP delivery method is required".to_string(),
        )),
        "MAIL" | "AUTHENTICATOR" => Ok(()),
        _ => Err(ShieldError::Validation(
            "Invalid otp_delivery_method. Must be 'MAIL' or 'AUTHENTICATOR'".to_string(),
        )),
    }
}

/// Validate the inputs only a restore needs
pub fn validate_restore_inputs(file_version_id: Option<&str>) -> ShieldResult<()> {
    match file_version_id {
        Some(id) if !id.trim().is_empty() => Ok(()),
        _ => Err(ShieldError::Validation(
            "Input 'file_version_id' is required when action is 'restore'".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(result: ShieldResult<()>) -> String {
        result.unwrap_err().to_string()
    }

    #[test]
    fn test_valid_password() {
        assert!(validate_password("ValidPass123!").is_ok());
        assert!(validate_password("Aa1{}|<>\"").is_ok());
    }

    #[test]
    fn test_empty_password() {
        assert!(message(validate_password("")).contains("required"));
    }

    #[test]
    fn test_short_password() {
        let msg = message(validate_password("Aa1!"));
        assert!(msg.contains("at least 8 characters (got 4)"));
    }

    #[test]
    fn test_missing_uppercase() {
        assert!(message(validate_password("lowercase123!")).contains("uppercase"));
    }

    #[test]
    fn test_missing_lowercase() {
        assert!(message(validate_password("UPPERCASE123!")).contains("lowercase"));
    }

    #[test]
    fn test_missing_digit() {
        assert!(message(validate_password("NoDigitsHere!")).contains("digit"));
    }

    #[test]
    fn test_missing_special() {
        assert!(message(validate_password("NoSpecial123")).contains("special character"));
    }

    #[test]
    fn test_forbidden_characters() {
        assert!(message(validate_password("Password123!🔒")).contains("can only contain"));
        assert!(message(validate_password("Pass word123!")).contains("can only contain"));
        assert!(message(validate_password("Password123!~")).contains("can only contain"));
    }

    #[test]
    fn test_validate_action() {
        assert!(validate_action("backup").is_ok());
        assert!(validate_action("restore").is_ok());
        assert!(message(validate_action("")).contains("required"));
        assert!(message(validate_action("delete")).contains("Invalid action"));
    }

    #[test]
    fn test_validate_otp_method() {
        assert!(validate_otp_method("MAIL").is_ok());
        assert!(validate_otp_method("AUTHENTICATOR").is_ok());
        assert!(validate_otp_method("mail").is_err());
        assert!(message(validate_otp_method("")).contains("required"));
    }

    #[test]
    fn test_validate_restore_inputs() {
        assert!(validate_restore_inputs(Some("abc-123")).is_ok());
        assert!(validate_restore_inputs(Some("  ")).is_err());
        assert!(validate_restore_inputs(None).unwrap_err().is_validation());
    }
}
