//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables.
//!
//! The login options are validated separately by
//! [`LoginSettings::from_options`](console_gate_platform_access::LoginSettings::from_options)
//! so that every missing field is reported by name.

use console_gate_addressing::SandboxDomains;
use console_gate_core::RuntimeMode;
use console_gate_platform_access::LoginOptions;
use serde::Deserialize;

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address the listener binds to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Runtime mode. Development switches default URLs to plain http.
    #[serde(default)]
    pub environment: RuntimeMode,

    /// Raw console login options.
    #[serde(default)]
    pub login: LoginOptions,

    /// Tenant routing layer integration.
    #[serde(default)]
    pub routing: RoutingConfig,
}

/// Headers and host names of the tenant routing layer.
///
/// Both headers are only honoured when configured, since anything a client
/// sends in them ends up in cookie paths and redirect targets.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoutingConfig {
    /// Header carrying the JSON-encoded sandbox routing context.
    #[serde(default)]
    pub context_header: Option<String>,

    /// Header carrying the request URL before the routing layer rewrote it.
    #[serde(default)]
    pub original_url_header: Option<String>,

    /// Host name conventions of the routing layer.
    #[serde(default)]
    pub domains: SandboxDomains,
}

fn default_bind_address() -> String {
    "0.0.0.0:3000".to_string()
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is present but malformed.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::load(config::Environment::default())
    }

    fn load(environment: config::Environment) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(environment.separator("__").try_parsing(true))
            .build()?
            .try_deserialize()
    }
}
