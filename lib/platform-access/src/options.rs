//! Login options and their validated form.
//!
//! `LoginOptions` is what deployment configuration deserializes into; every
//! field is optional so that a missing value can be reported by name.
//! `LoginSettings` is the validated, immutable result shared by all requests.

use crate::csrf::CsrfKeys;
use crate::error::ConfigurationError;
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Raw login options as loaded from configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginOptions {
    /// Key the session token is signed with.
    pub secret: Option<String>,
    /// Audience of the session token.
    pub audience: Option<String>,
    /// Host name of the identity provider.
    pub rta: Option<String>,
    /// Tenant domain whose management API the access token targets.
    pub domain: Option<String>,
    /// Public URL of the console, used as client id and session issuer.
    pub base_url: Option<String>,
    /// Display name in the discovery document.
    pub client_name: Option<String>,
    /// Space separated scopes requested at the identity provider.
    pub scopes: Option<String>,
    /// Requested access token lifetime in seconds.
    pub expiration: Option<u64>,
    /// `sessionStorage` or `localStorage`.
    pub storage_type: Option<String>,
    /// Client-side storage key for the session token.
    pub storage_key: Option<String>,
    /// Older name of `storage_key`, consulted when it is unset.
    pub session_storage_key: Option<String>,
    /// Base name of the state cookies.
    pub state_key: Option<String>,
    /// Base name of the nonce cookies.
    pub nonce_key: Option<String>,
    /// Path prefix in front of the login routes.
    pub url_prefix: Option<String>,
    /// Issue sessions without an access token.
    pub no_access_token: Option<bool>,
    /// Reject requests to protected routes that carry no session token.
    pub credentials_required: Option<bool>,
    /// Overrides where the identity provider's signing keys are fetched from.
    pub jwks_uri: Option<String>,
}

/// Client-side storage the session token is written to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StorageType {
    /// Cleared when the browser tab closes.
    #[default]
    SessionStorage,
    /// Survives browser restarts.
    LocalStorage,
}

impl StorageType {
    /// Returns the name of the browser storage object.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SessionStorage => "sessionStorage",
            Self::LocalStorage => "localStorage",
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageType {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sessionStorage" => Ok(Self::SessionStorage),
            "localStorage" => Ok(Self::LocalStorage),
            other => Err(ConfigurationError::Invalid {
                field: "storage_type",
                reason: format!(
                    "the storage type must be either \"sessionStorage\" or \"localStorage\", got {other:?}"
                ),
            }),
        }
    }
}

fn default_scopes() -> String {
    "openid name email".to_string()
}

fn default_expiration() -> u64 {
    36000
}

fn default_storage_key() -> String {
    "apiToken".to_string()
}

/// Validated login settings.
///
/// Built once at startup and treated as immutable afterwards.
#[derive(Clone)]
pub struct LoginSettings {
    secret: String,
    audience: String,
    rta: String,
    domain: String,
    base_url: String,
    client_name: String,
    scopes: String,
    expiration: u64,
    storage_type: StorageType,
    storage_key: String,
    csrf_keys: CsrfKeys,
    url_prefix: String,
    no_access_token: bool,
    credentials_required: bool,
    jwks_uri: Option<String>,
}

impl fmt::Debug for LoginSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginSettings")
            .field("secret", &"<redacted>")
            .field("audience", &self.audience)
            .field("rta", &self.rta)
            .field("domain", &self.domain)
            .field("base_url", &self.base_url)
            .field("client_name", &self.client_name)
            .field("scopes", &self.scopes)
            .field("expiration", &self.expiration)
            .field("storage_type", &self.storage_type)
            .field("storage_key", &self.storage_key)
            .field("csrf_keys", &self.csrf_keys)
            .field("url_prefix", &self.url_prefix)
            .field("no_access_token", &self.no_access_token)
            .field("credentials_required", &self.credentials_required)
            .field("jwks_uri", &self.jwks_uri)
            .finish()
    }
}

fn required(field: &'static str, value: Option<String>) -> Result<String, ConfigurationError> {
    match value {
        None => Err(ConfigurationError::Missing { field }),
        Some(v) if v.is_empty() => Err(ConfigurationError::Invalid {
            field,
            reason: "must not be empty".to_string(),
        }),
        Some(v) => Ok(v),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Routes are `{prefix}/login` etc., so the prefix gets a leading slash and
/// loses any trailing one.
fn normalize_prefix(prefix: Option<String>) -> String {
    let prefix = prefix.unwrap_or_default();
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.is_empty() || trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

impl LoginSettings {
    /// Validates raw options.
    ///
    /// Required options are checked in a fixed order (secret, audience, rta,
    /// domain, base_url, client_name) followed by the storage type, and the
    /// first failure is reported.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::Missing` for an absent required option and
    /// `ConfigurationError::Invalid` for an empty one or an unknown storage type.
    pub fn from_options(options: LoginOptions) -> Result<Self, Report<ConfigurationError>> {
        let secret = required("secret", options.secret)?;
        let audience = required("audience", options.audience)?;
        let rta = required("rta", options.rta)?;
        let domain = required("domain", options.domain)?;
        let base_url = required("base_url", options.base_url)?;
        let client_name = required("client_name", options.client_name)?;

        let storage_type = match options.storage_type {
            Some(raw) => raw.parse::<StorageType>()?,
            None => StorageType::default(),
        };

        let storage_key = non_empty(options.storage_key)
            .or_else(|| non_empty(options.session_storage_key))
            .unwrap_or_else(default_storage_key);

        let csrf_keys = CsrfKeys::new(
            non_empty(options.state_key).unwrap_or_else(|| "state".to_string()),
            non_empty(options.nonce_key).unwrap_or_else(|| "nonce".to_string()),
        );

        Ok(Self {
            secret,
            audience,
            rta,
            domain,
            base_url,
            client_name,
            scopes: non_empty(options.scopes).unwrap_or_else(default_scopes),
            expiration: options.expiration.unwrap_or_else(default_expiration),
            storage_type,
            storage_key,
            csrf_keys,
            url_prefix: normalize_prefix(options.url_prefix),
            no_access_token: options.no_access_token.unwrap_or(false),
            credentials_required: options.credentials_required.unwrap_or(true),
            jwks_uri: non_empty(options.jwks_uri),
        })
    }

    /// Creates a settings builder from the required options.
    #[must_use]
    pub fn builder(
        secret: impl Into<String>,
        audience: impl Into<String>,
        rta: impl Into<String>,
        domain: impl Into<String>,
        base_url: impl Into<String>,
        client_name: impl Into<String>,
    ) -> LoginSettingsBuilder {
        LoginSettingsBuilder::new(secret, audience, rta, domain, base_url, client_name)
    }

    /// Returns the session signing key.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Returns the session token audience.
    #[must_use]
    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// Returns the identity provider host.
    #[must_use]
    pub fn rta(&self) -> &str {
        &self.rta
    }

    /// Returns the tenant domain.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Returns the configured console URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the client name for the discovery document.
    #[must_use]
    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    /// Returns the requested scopes.
    #[must_use]
    pub fn scopes(&self) -> &str {
        &self.scopes
    }

    /// Returns the requested access token lifetime in seconds.
    #[must_use]
    pub fn expiration(&self) -> u64 {
        self.expiration
    }

    #[must_use]
    pub fn storage_type(&self) -> StorageType {
        self.storage_type
    }

    #[must_use]
    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Returns the CSRF cookie base names.
    #[must_use]
    pub fn csrf_keys(&self) -> &CsrfKeys {
        &self.csrf_keys
    }

    #[must_use]
    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    #[must_use]
    pub fn no_access_token(&self) -> bool {
        self.no_access_token
    }

    #[must_use]
    pub fn credentials_required(&self) -> bool {
        self.credentials_required
    }

    /// Returns the issuer expected in identity tokens, `https://{rta}/`.
    #[must_use]
    pub fn identity_issuer(&self) -> String {
        format!("https://{}/", self.rta)
    }

    /// Returns the management API audience, `https://{domain}/api/v2/`.
    #[must_use]
    pub fn management_audience(&self) -> String {
        format!("https://{}/api/v2/", self.domain)
    }

    /// Returns where signing keys are fetched from.
    #[must_use]
    pub fn jwks_uri(&self) -> String {
        self.jwks_uri
            .clone()
            .unwrap_or_else(|| format!("https://{}/.well-known/jwks.json", self.rta))
    }

    /// Returns the login route, including the prefix.
    #[must_use]
    pub fn login_route(&self) -> String {
        format!("{}/login", self.url_prefix)
    }

    /// Returns the callback route, including the prefix.
    #[must_use]
    pub fn callback_route(&self) -> String {
        format!("{}/login/callback", self.url_prefix)
    }

    /// Returns the logout route, including the prefix.
    #[must_use]
    pub fn logout_route(&self) -> String {
        format!("{}/logout", self.url_prefix)
    }
}

/// Builder for `LoginSettings`.
#[derive(Debug)]
pub struct LoginSettingsBuilder {
    options: LoginOptions,
}

impl LoginSettingsBuilder {
    /// Creates a new builder with the required options.
    #[must_use]
    pub fn new(
        secret: impl Into<String>,
        audience: impl Into<String>,
        rta: impl Into<String>,
        domain: impl Into<String>,
        base_url: impl Into<String>,
        client_name: impl Into<String>,
    ) -> Self {
        Self {
            options: LoginOptions {
                secret: Some(secret.into()),
                audience: Some(audience.into()),
                rta: Some(rta.into()),
                domain: Some(domain.into()),
                base_url: Some(base_url.into()),
                client_name: Some(client_name.into()),
                ..LoginOptions::default()
            },
        }
    }

    #[must_use]
    pub fn scopes(mut self, scopes: impl Into<String>) -> Self {
        self.options.scopes = Some(scopes.into());
        self
    }

    #[must_use]
    pub fn expiration(mut self, seconds: u64) -> Self {
        self.options.expiration = Some(seconds);
        self
    }

    #[must_use]
    pub fn storage_type(mut self, storage_type: StorageType) -> Self {
        self.options.storage_type = Some(storage_type.as_str().to_string());
        self
    }

    #[must_use]
    pub fn storage_key(mut self, key: impl Into<String>) -> Self {
        self.options.storage_key = Some(key.into());
        self
    }

    /// Sets the base names of the state and nonce cookies.
    #[must_use]
    pub fn csrf_keys(mut self, state_key: impl Into<String>, nonce_key: impl Into<String>) -> Self {
        self.options.state_key = Some(state_key.into());
        self.options.nonce_key = Some(nonce_key.into());
        self
    }

    #[must_use]
    pub fn url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.options.url_prefix = Some(prefix.into());
        self
    }

    #[must_use]
    pub fn no_access_token(mut self, no_access_token: bool) -> Self {
        self.options.no_access_token = Some(no_access_token);
        self
    }

    #[must_use]
    pub fn credentials_required(mut self, required: bool) -> Self {
        self.options.credentials_required = Some(required);
        self
    }

    #[must_use]
    pub fn jwks_uri(mut self, uri: impl Into<String>) -> Self {
        self.options.jwks_uri = Some(uri.into());
        self
    }

    /// Validates and builds the settings.
    ///
    /// # Errors
    ///
    /// Same as [`LoginSettings::from_options`].
    pub fn build(self) -> Result<LoginSettings, Report<ConfigurationError>> {
        LoginSettings::from_options(self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> LoginOptions {
        LoginOptions {
            secret: Some("s3cr3t".to_string()),
            audience: Some("urn:console".to_string()),
            rta: Some("auth.example.com".to_string()),
            domain: Some("tenant.example.com".to_string()),
            base_url: Some("https://console.example.com".to_string()),
            client_name: Some("Console".to_string()),
            ..LoginOptions::default()
        }
    }

    fn error_of(options: LoginOptions) -> ConfigurationError {
        LoginSettings::from_options(options)
            .expect_err("invalid options")
            .current_context()
            .clone()
    }

    #[test]
    fn complete_options_get_defaults() {
        let settings = LoginSettings::from_options(complete()).expect("valid options");

        assert_eq!(settings.scopes(), "openid name email");
        assert_eq!(settings.expiration(), 36000);
        assert_eq!(settings.storage_type(), StorageType::SessionStorage);
        assert_eq!(settings.storage_key(), "apiToken");
        assert_eq!(settings.csrf_keys().state_key(), "state");
        assert_eq!(settings.csrf_keys().nonce_key(), "nonce");
        assert_eq!(settings.url_prefix(), "");
        assert!(!settings.no_access_token());
        assert!(settings.credentials_required());
        assert_eq!(settings.login_route(), "/login");
        assert_eq!(settings.callback_route(), "/login/callback");
        assert_eq!(settings.logout_route(), "/logout");
        assert_eq!(settings.identity_issuer(), "https://auth.example.com/");
        assert_eq!(
            settings.management_audience(),
            "https://tenant.example.com/api/v2/"
        );
        assert_eq!(
            settings.jwks_uri(),
            "https://auth.example.com/.well-known/jwks.json"
        );
    }

    #[test]
    fn each_required_option_is_reported_in_order() {
        let mut options = LoginOptions::default();
        let order = ["secret", "audience", "rta", "domain", "base_url", "client_name"];
        let values = complete();
        let fill: [fn(&mut LoginOptions, &LoginOptions); 6] = [
            |o, v| o.secret = v.secret.clone(),
            |o, v| o.audience = v.audience.clone(),
            |o, v| o.rta = v.rta.clone(),
            |o, v| o.domain = v.domain.clone(),
            |o, v| o.base_url = v.base_url.clone(),
            |o, v| o.client_name = v.client_name.clone(),
        ];

        for (field, fill) in order.iter().zip(fill) {
            assert_eq!(
                error_of(options.clone()),
                ConfigurationError::Missing { field: *field }
            );
            fill(&mut options, &values);
        }
        assert!(LoginSettings::from_options(options).is_ok());
    }

    #[test]
    fn empty_required_option_is_invalid() {
        let options = LoginOptions {
            rta: Some(String::new()),
            ..complete()
        };
        assert!(matches!(
            error_of(options),
            ConfigurationError::Invalid { field: "rta", .. }
        ));
    }

    #[test]
    fn unknown_storage_type_is_invalid() {
        let options = LoginOptions {
            storage_type: Some("cookieStorage".to_string()),
            ..complete()
        };
        assert!(matches!(
            error_of(options),
            ConfigurationError::Invalid {
                field: "storage_type",
                ..
            }
        ));
    }

    #[test]
    fn missing_secret_wins_over_bad_storage_type() {
        let options = LoginOptions {
            secret: None,
            storage_type: Some("cookieStorage".to_string()),
            ..complete()
        };
        assert_eq!(
            error_of(options),
            ConfigurationError::Missing { field: "secret" }
        );
    }

    #[test]
    fn storage_key_falls_back_to_session_storage_key() {
        let options = LoginOptions {
            session_storage_key: Some("legacyToken".to_string()),
            ..complete()
        };
        let settings = LoginSettings::from_options(options).expect("valid");
        assert_eq!(settings.storage_key(), "legacyToken");

        let options = LoginOptions {
            storage_key: Some("token".to_string()),
            session_storage_key: Some("legacyToken".to_string()),
            ..complete()
        };
        let settings = LoginSettings::from_options(options).expect("valid");
        assert_eq!(settings.storage_key(), "token");
    }

    #[test]
    fn builder_allows_customization() {
        let settings = LoginSettings::builder(
            "s3cr3t",
            "urn:console",
            "auth.example.com",
            "tenant.example.com",
            "https://console.example.com",
            "Console",
        )
        .storage_type(StorageType::LocalStorage)
        .storage_key("consoleToken")
        .csrf_keys("console_state", "console_nonce")
        .url_prefix("/admins")
        .no_access_token(true)
        .jwks_uri("http://127.0.0.1:9999/jwks.json")
        .build()
        .expect("valid");

        assert_eq!(settings.storage_type(), StorageType::LocalStorage);
        assert_eq!(settings.storage_key(), "consoleToken");
        assert_eq!(settings.csrf_keys().state_key(), "console_state");
        assert_eq!(settings.callback_route(), "/admins/login/callback");
        assert!(settings.no_access_token());
        assert_eq!(settings.jwks_uri(), "http://127.0.0.1:9999/jwks.json");
    }

    #[test]
    fn url_prefix_is_normalized() {
        let options = LoginOptions {
            url_prefix: Some("admins/".to_string()),
            ..complete()
        };
        let settings = LoginSettings::from_options(options).expect("valid");

        assert_eq!(settings.url_prefix(), "/admins");
        assert_eq!(settings.login_route(), "/admins/login");
    }

    #[test]
    fn options_deserialize_with_missing_fields() {
        let json = r#"{"secret": "s", "storage_type": "localStorage", "expiration": 60}"#;
        let options: LoginOptions = serde_json::from_str(json).expect("deserialize");

        assert_eq!(options.secret.as_deref(), Some("s"));
        assert_eq!(options.expiration, Some(60));
        assert!(options.audience.is_none());
    }

    #[test]
    fn debug_output_redacts_secret() {
        let settings = LoginSettings::from_options(complete()).expect("valid");
        let debug = format!("{settings:?}");
        assert!(!debug.contains("s3cr3t"));
        assert!(debug.contains("redacted"));
    }
}
