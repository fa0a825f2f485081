//! Error types for the addressing crate.

use std::fmt;

/// Errors from address resolution.
///
/// Both variants point at a deployment defect rather than a bad request:
/// the routing layer handed us metadata we cannot interpret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// The routing context carries an addressing scheme tag we do not know.
    UnsupportedScheme { url_format: u8 },
    /// A route normalization pattern could not be compiled.
    InvalidPattern { reason: String },
}

impl fmt::Display for AddressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedScheme { url_format } => {
                write!(f, "unsupported sandbox URL format: {url_format}")
            }
            Self::InvalidPattern { reason } => {
                write!(f, "invalid route normalization pattern: {reason}")
            }
        }
    }
}

impl std::error::Error for AddressError {}
