//! Error types for the platform-access crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `ConfigurationError`: invalid or missing login options, fatal at startup
//! - `ValidationError`: rejected login callbacks (bad token, CSRF mismatch)
//! - `SessionError`: failures of the session issuer and of session verification

use std::fmt;

/// Errors from validating login options.
///
/// Raised once while building [`LoginSettings`](crate::LoginSettings), never
/// at request time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// A required option was not provided.
    Missing { field: &'static str },
    /// An option was provided but is not acceptable.
    Invalid { field: &'static str, reason: String },
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { field } => {
                write!(f, "must provide a valid {field}")
            }
            Self::Invalid { field, reason } => {
                write!(f, "the provided {field} is invalid: {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigurationError {}

/// Errors from validating a login callback.
///
/// The display text is what the user sees, so it never carries token or
/// cookie values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// The identity token could not be decoded.
    InvalidToken,
    /// A nonce cookie does not match the identity token's nonce claim.
    NonceMismatch,
    /// A state cookie does not match the submitted state.
    StateMismatch,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidToken => write!(f, "Login failed. Invalid token."),
            Self::NonceMismatch => write!(f, "Login failed. Nonce mismatch."),
            Self::StateMismatch => write!(f, "Login failed. State mismatch."),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors from issuing or verifying session tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The identity provider's signing keys could not be obtained.
    KeySetUnavailable { reason: String },
    /// A token was rejected during verification.
    InvalidToken { token: &'static str, reason: String },
    /// An access token is required but none was submitted.
    MissingAccessToken,
    /// The session token could not be signed.
    SigningFailed { reason: String },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeySetUnavailable { reason } => {
                write!(f, "signing keys unavailable: {reason}")
            }
            Self::InvalidToken { token, reason } => {
                write!(f, "invalid {token}: {reason}")
            }
            Self::MissingAccessToken => {
                write!(f, "access token is required")
            }
            Self::SigningFailed { reason } => {
                write!(f, "failed to sign session token: {reason}")
            }
        }
    }
}

impl std::error::Error for SessionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_missing_display() {
        let err = ConfigurationError::Missing { field: "secret" };
        assert_eq!(err.to_string(), "must provide a valid secret");
    }

    #[test]
    fn configuration_error_invalid_display() {
        let err = ConfigurationError::Invalid {
            field: "storage_type",
            reason: "expected sessionStorage or localStorage, got cookie".to_string(),
        };
        assert!(err.to_string().contains("storage_type"));
        assert!(err.to_string().contains("got cookie"));
    }

    #[test]
    fn validation_error_messages() {
        assert_eq!(
            ValidationError::InvalidToken.to_string(),
            "Login failed. Invalid token."
        );
        assert_eq!(
            ValidationError::NonceMismatch.to_string(),
            "Login failed. Nonce mismatch."
        );
        assert_eq!(
            ValidationError::StateMismatch.to_string(),
            "Login failed. State mismatch."
        );
    }

    #[test]
    fn session_error_invalid_token_display() {
        let err = SessionError::InvalidToken {
            token: "id_token",
            reason: "InvalidAudience".to_string(),
        };
        assert!(err.to_string().contains("id_token"));
        assert!(err.to_string().contains("InvalidAudience"));
    }

    #[test]
    fn session_error_key_set_display() {
        let err = SessionError::KeySetUnavailable {
            reason: "HTTP 503".to_string(),
        };
        assert!(err.to_string().contains("HTTP 503"));
    }
}
