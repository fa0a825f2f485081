//! Session token extractors for Axum.
//!
//! The session token minted by the login callback is presented as
//! `Authorization: Bearer <token>`. Verification is delegated to
//! [`verify_session`].

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use console_gate_platform_access::{SessionClaims, decode_unverified, verify_session};
use std::sync::Arc;

use super::AppState;
use crate::error::AppError;

/// Extractor honouring the `credentials_required` login option.
///
/// A bearer token is always verified. Without one the request passes as
/// anonymous only when credentials are not required.
pub struct SessionUser(pub Option<SessionClaims>);

impl<S> FromRequestParts<S> for SessionUser
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = Arc::<AppState>::from_ref(state);

        match bearer_token(&parts.headers) {
            Some(token) => Ok(SessionUser(Some(verify_session(
                token,
                &app_state.settings,
            )?))),
            None if app_state.settings.credentials_required() => Err(AppError::Unauthenticated),
            None => Ok(SessionUser(None)),
        }
    }
}

/// Extractor for routes that also serve anonymous callers.
///
/// Only a bearer token whose unverified issuer is this console is checked,
/// and a failed check rejects the request. Anything else, including a
/// missing token, passes as anonymous.
pub struct OptionalSessionUser(pub Option<SessionClaims>);

impl<S> FromRequestParts<S> for OptionalSessionUser
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = Arc::<AppState>::from_ref(state);
        let settings = &app_state.settings;

        let Some(token) = bearer_token(&parts.headers) else {
            return Ok(OptionalSessionUser(None));
        };

        let issuer = decode_unverified(token).ok().and_then(|claims| claims.iss);
        if issuer.as_deref() != Some(settings.base_url()) {
            tracing::debug!(?issuer, "passing through token from another issuer");
            return Ok(OptionalSessionUser(None));
        }

        Ok(OptionalSessionUser(Some(verify_session(token, settings)?)))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
