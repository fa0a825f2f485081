//! Address resolver facade used by the web layer.

use crate::base;
use crate::error::AddressError;
use crate::request::RequestContext;
use crate::sandbox::{self, SandboxDomains};
use console_gate_core::RuntimeMode;
use rootcause::prelude::Report;
use serde::Serialize;

/// Resolves the externally visible addresses of inbound requests.
///
/// Holds only process-wide settings and is shared across requests.
#[derive(Debug, Clone, Default)]
pub struct AddressResolver {
    mode: RuntimeMode,
    domains: SandboxDomains,
}

/// Base path and base URL of one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressComponents {
    pub base_path: String,
    pub base_url: String,
}

impl AddressResolver {
    /// Creates a resolver for the given runtime mode with the default sandbox domains.
    #[must_use]
    pub fn new(mode: RuntimeMode) -> Self {
        Self {
            mode,
            domains: SandboxDomains::default(),
        }
    }

    /// Replaces the sandbox host name conventions.
    #[must_use]
    pub fn with_domains(mut self, domains: SandboxDomains) -> Self {
        self.domains = domains;
        self
    }

    #[must_use]
    pub fn mode(&self) -> RuntimeMode {
        self.mode
    }

    #[must_use]
    pub fn domains(&self) -> &SandboxDomains {
        &self.domains
    }

    /// See [`base::base_path`].
    #[must_use]
    pub fn base_path(&self, request: &RequestContext) -> String {
        base::base_path(request)
    }

    /// Returns the base URL using the runtime mode's default scheme.
    #[must_use]
    pub fn base_url(&self, request: &RequestContext) -> String {
        self.base_url_with_scheme(request, None)
    }

    /// Returns the base URL, using `scheme` when given and the runtime
    /// mode's default scheme otherwise.
    #[must_use]
    pub fn base_url_with_scheme(&self, request: &RequestContext, scheme: Option<&str>) -> String {
        let scheme = scheme
            .filter(|s| !s.is_empty())
            .unwrap_or(self.mode.default_scheme());
        base::base_url(request, scheme)
    }

    /// See [`sandbox::sandbox_routing_url`].
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::UnsupportedScheme`] for an unknown scheme tag.
    pub fn sandbox_routing_url(
        &self,
        request: &RequestContext,
    ) -> Result<String, Report<AddressError>> {
        sandbox::sandbox_routing_url(request, &self.domains)
    }

    /// Resolves base path and base URL together.
    #[must_use]
    pub fn components(&self, request: &RequestContext) -> AddressComponents {
        AddressComponents {
            base_path: self.base_path(request),
            base_url: self.base_url(request),
        }
    }
}
