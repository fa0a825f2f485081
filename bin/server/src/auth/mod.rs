//! Console login for the console-gate server.
//!
//! This module provides:
//! - The login, callback, logout and discovery routes
//! - The cookie codec that carries the CSRF tokens between login and callback
//! - The request extractor that resolves the externally visible address
//! - Session token extractors for protected routes
//!
//! No login state is kept on the server. Everything the callback needs comes
//! back from the browser: the CSRF tokens in cookies, the identity token and
//! state in the posted form.

pub mod csrf;
pub mod middleware;
pub mod request;
pub mod routes;

use crate::config::RoutingConfig;
use console_gate_addressing::AddressResolver;
use console_gate_platform_access::{LoginSettings, SessionIssuer};
use std::sync::Arc;

pub use middleware::{OptionalSessionUser, SessionUser};
pub use request::InboundRequest;
pub use routes::{callback, discovery, login, logout};

/// Shared application state.
pub struct AppState {
    /// Validated login settings.
    pub settings: LoginSettings,
    /// Resolves base paths and URLs of inbound requests.
    pub resolver: AddressResolver,
    /// Exchanges provider tokens for session tokens.
    pub issuer: Arc<dyn SessionIssuer>,
    /// Trusted headers of the tenant routing layer.
    pub routing: RoutingConfig,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        settings: LoginSettings,
        resolver: AddressResolver,
        issuer: Arc<dyn SessionIssuer>,
        routing: RoutingConfig,
    ) -> Self {
        Self {
            settings,
            resolver,
            issuer,
            routing,
        }
    }
}
