//! Session token issuance and verification.
//!
//! After a successful login callback the identity token (and, unless
//! disabled, the access token) are exchanged for a session token signed with
//! the console's own secret. The browser keeps it in client-side storage and
//! presents it as a bearer token.

use crate::claims::IdentityTokenClaims;
use crate::error::SessionError;
use crate::options::LoginSettings;
use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, decode_header, encode};
use moka::sync::Cache;
use reqwest::Client;
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// HTTP timeout for fetching the identity provider's signing keys.
const JWKS_FETCH_TIMEOUT_SECS: u64 = 10;

/// How long a fetched key set is reused before it is fetched again.
const JWKS_CACHE_TTL_SECS: u64 = 600;

/// Key sets held at once. One per provider in practice.
const JWKS_CACHE_MAX_CAPACITY: u64 = 4;

/// Clock skew tolerated when checking token expiry.
const LEEWAY_SECS: u64 = 60;

/// Tokens submitted to the login callback.
#[derive(Debug, Clone, Copy)]
pub struct SessionRequest<'a> {
    pub id_token: &'a str,
    pub access_token: Option<&'a str>,
    /// Issue the session without an access token.
    pub no_access_token: bool,
}

/// Exchanges provider tokens for a console session token.
#[async_trait]
pub trait SessionIssuer: Send + Sync {
    /// Creates a session token for a login callback.
    ///
    /// # Errors
    ///
    /// Returns an error if a token is rejected, the provider's keys cannot be
    /// fetched, or signing fails. Failures are not retried.
    async fn issue(&self, request: SessionRequest<'_>) -> Result<String, Report<SessionError>>;
}

/// Claims of a console session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// Verifies a session token presented as a bearer token.
///
/// The token must be HS256-signed with the console secret, issued by the
/// configured base URL for the configured audience, and unexpired.
///
/// # Errors
///
/// Returns `SessionError::InvalidToken` if any check fails.
pub fn verify_session(
    token: &str,
    settings: &LoginSettings,
) -> Result<SessionClaims, Report<SessionError>> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[settings.base_url()]);
    validation.set_audience(&[settings.audience()]);
    validation.leeway = LEEWAY_SECS;

    let data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(settings.secret().as_bytes()),
        &validation,
    )
    .map_err(|e| SessionError::InvalidToken {
        token: "session token",
        reason: e.to_string(),
    })?;

    Ok(data.claims)
}

/// Key set served by the identity provider.
#[derive(Debug, Clone, Deserialize)]
struct JwkSet {
    keys: Vec<Jwk>,
}

/// The parts of an RSA JWK needed for verification.
#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    #[serde(default)]
    kid: Option<String>,
    kty: String,
    #[serde(default)]
    n: Option<String>,
    #[serde(default)]
    e: Option<String>,
}

impl JwkSet {
    /// Picks the RSA key named by `kid`, or the first RSA key if the token
    /// names none.
    fn find(&self, kid: Option<&str>) -> Option<&Jwk> {
        let mut rsa = self.keys.iter().filter(|k| k.kty == "RSA");
        match kid {
            Some(kid) => rsa.find(|k| k.kid.as_deref() == Some(kid)),
            None => rsa.next(),
        }
    }

    /// Returns true unless `token` names a key this set lacks. Tokens whose
    /// header cannot be read are left for verification to reject.
    fn covers(&self, token: &str) -> bool {
        decode_header(token).map_or(true, |header| self.find(header.kid.as_deref()).is_some())
    }
}

/// Session issuer that verifies provider tokens against the provider's
/// published key set and signs sessions with the console secret.
///
/// The key set is cached for ten minutes and fetched again early when a
/// token names a key the cached set lacks.
#[derive(Clone)]
pub struct JwksSessionIssuer {
    http_client: Client,
    keys: Cache<String, JwkSet>,
    jwks_uri: String,
    identity_issuer: String,
    client_id: String,
    management_audience: String,
    session_issuer: String,
    session_audience: String,
    secret: String,
}

impl std::fmt::Debug for JwksSessionIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwksSessionIssuer")
            .field("jwks_uri", &self.jwks_uri)
            .field("identity_issuer", &self.identity_issuer)
            .field("client_id", &self.client_id)
            .field("session_audience", &self.session_audience)
            .finish_non_exhaustive()
    }
}

impl JwksSessionIssuer {
    /// Creates an issuer for the given settings.
    #[must_use]
    pub fn new(settings: &LoginSettings) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(JWKS_FETCH_TIMEOUT_SECS))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap_or_else(|_| Client::new());

        let keys = Cache::builder()
            .max_capacity(JWKS_CACHE_MAX_CAPACITY)
            .time_to_live(Duration::from_secs(JWKS_CACHE_TTL_SECS))
            .build();

        Self {
            http_client,
            keys,
            jwks_uri: settings.jwks_uri(),
            identity_issuer: settings.identity_issuer(),
            client_id: settings.base_url().to_string(),
            management_audience: settings.management_audience(),
            session_issuer: settings.base_url().to_string(),
            session_audience: settings.audience().to_string(),
            secret: settings.secret().to_string(),
        }
    }

    /// Returns a key set covering every token, from the cache when possible.
    async fn signing_keys(&self, tokens: &[&str]) -> Result<JwkSet, Report<SessionError>> {
        if let Some(cached) = self.keys.get(&self.jwks_uri) {
            if tokens.iter().all(|token| cached.covers(token)) {
                return Ok(cached);
            }
            info!(jwks_uri = %self.jwks_uri, "signing key not cached, refreshing for key rotation");
            self.keys.invalidate(&self.jwks_uri);
        }

        let keys = self.fetch_keys().await?;
        debug!(keys = keys.keys.len(), "fetched signing keys");
        self.keys.insert(self.jwks_uri.clone(), keys.clone());
        Ok(keys)
    }

    async fn fetch_keys(&self) -> Result<JwkSet, Report<SessionError>> {
        let response = self
            .http_client
            .get(&self.jwks_uri)
            .send()
            .await
            .map_err(|e| SessionError::KeySetUnavailable {
                reason: format!("request failed: {e}"),
            })?;

        if !response.status().is_success() {
            return Err(SessionError::KeySetUnavailable {
                reason: format!("HTTP {}", response.status()),
            }
            .into());
        }

        let keys = response
            .json::<JwkSet>()
            .await
            .map_err(|e| SessionError::KeySetUnavailable {
                reason: format!("invalid key set: {e}"),
            })?;

        Ok(keys)
    }

    fn verify_provider_token<T>(
        keys: &JwkSet,
        token: &str,
        token_name: &'static str,
        issuer: &str,
        audience: &str,
    ) -> Result<T, Report<SessionError>>
    where
        T: serde::de::DeserializeOwned,
    {
        let invalid = |reason: String| SessionError::InvalidToken {
            token: token_name,
            reason,
        };

        let header = decode_header(token).map_err(|e| invalid(e.to_string()))?;
        if header.alg != Algorithm::RS256 {
            return Err(invalid(format!("unexpected algorithm {:?}", header.alg)).into());
        }

        let jwk = keys
            .find(header.kid.as_deref())
            .ok_or_else(|| invalid("no matching signing key".to_string()))?;
        let (Some(n), Some(e)) = (jwk.n.as_deref(), jwk.e.as_deref()) else {
            return Err(invalid("signing key lacks RSA components".to_string()).into());
        };
        let key = DecodingKey::from_rsa_components(n, e).map_err(|e| invalid(e.to_string()))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[issuer]);
        validation.set_audience(&[audience]);
        validation.leeway = LEEWAY_SECS;

        let data = decode::<T>(token, &key, &validation).map_err(|e| invalid(e.to_string()))?;
        Ok(data.claims)
    }
}

#[async_trait]
impl SessionIssuer for JwksSessionIssuer {
    #[instrument(skip_all, fields(no_access_token = request.no_access_token))]
    async fn issue(&self, request: SessionRequest<'_>) -> Result<String, Report<SessionError>> {
        let access_token = match request.access_token.filter(|t| !t.is_empty()) {
            Some(token) => Some(token),
            None if request.no_access_token => None,
            None => return Err(SessionError::MissingAccessToken.into()),
        };

        let tokens: Vec<&str> = std::iter::once(request.id_token)
            .chain(access_token.filter(|_| !request.no_access_token))
            .collect();
        let keys = self.signing_keys(&tokens).await?;

        let identity: IdentityTokenClaims = Self::verify_provider_token(
            &keys,
            request.id_token,
            "id_token",
            &self.identity_issuer,
            &self.client_id,
        )?;

        let access_token = if request.no_access_token {
            None
        } else if let Some(token) = access_token {
            let _: JsonValue = Self::verify_provider_token(
                &keys,
                token,
                "access_token",
                &self.identity_issuer,
                &self.management_audience,
            )?;
            Some(token.to_string())
        } else {
            None
        };

        let sub = identity.sub.ok_or_else(|| SessionError::InvalidToken {
            token: "id_token",
            reason: "missing sub claim".to_string(),
        })?;
        let now = chrono::Utc::now().timestamp();

        let claims = SessionClaims {
            sub,
            email: identity.email,
            name: identity.name,
            access_token,
            iss: self.session_issuer.clone(),
            aud: self.session_audience.clone(),
            iat: now,
            exp: identity.exp.unwrap_or(now),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| SessionError::SigningFailed {
            reason: e.to_string(),
        })?;

        info!(sub = %claims.sub, "issued console session");
        Ok(token)
    }
}
