//! Unverified decoding of identity tokens.
//!
//! The login callback only needs the nonce claim to check CSRF cookies; the
//! token's signature is verified later by the session issuer.

use crate::error::ValidationError;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rootcause::prelude::Report;
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

/// Claims of an identity token, read without verifying its signature.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IdentityTokenClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub iss: Option<String>,
    /// Raw nonce claim. Use [`IdentityTokenClaims::nonce`] to compare it.
    #[serde(default)]
    pub nonce: Option<JsonValue>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
    /// Everything else in the payload.
    #[serde(flatten)]
    pub other: Map<String, JsonValue>,
}

impl IdentityTokenClaims {
    /// Returns the nonce claim when it is a string.
    ///
    /// A nonce of any other type never equals a cookie value.
    #[must_use]
    pub fn nonce(&self) -> Option<&str> {
        self.nonce.as_ref().and_then(JsonValue::as_str)
    }
}

/// Decodes the payload of a compact JWS without verifying it.
///
/// # Errors
///
/// Returns `ValidationError::InvalidToken` if the token is not three
/// dot-separated segments, or if the payload is not base64url-encoded JSON
/// with the expected claim types.
pub fn decode_unverified(token: &str) -> Result<IdentityTokenClaims, Report<ValidationError>> {
    // JWT is base64url(header).base64url(payload).signature
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 || parts[1].is_empty() {
        return Err(ValidationError::InvalidToken.into());
    }

    let payload = URL_SAFE_NO_PAD
        .decode(parts[1].trim_end_matches('='))
        .map_err(|_| ValidationError::InvalidToken)?;

    let claims = serde_json::from_slice::<IdentityTokenClaims>(&payload)
        .map_err(|_| ValidationError::InvalidToken)?;

    Ok(claims)
}
