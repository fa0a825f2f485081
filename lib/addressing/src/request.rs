//! Read-only view of an inbound request.

use crate::error::AddressError;
use http::HeaderMap;
use http::header::{HOST, HeaderValue};
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The parts of an inbound request that address resolution looks at.
///
/// Built once per request by the web layer and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Path of the matched route, relative to wherever the router is mounted.
    path: String,
    /// URL of the request before any rewriting by routers or the routing layer.
    original_url: String,
    /// Request headers as received.
    headers: HeaderMap,
    /// Routing metadata from the tenant routing layer, when present.
    sandbox: Option<SandboxContext>,
}

impl RequestContext {
    /// Creates a context from the route path and the original URL.
    #[must_use]
    pub fn new(path: impl Into<String>, original_url: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            original_url: original_url.into(),
            headers: HeaderMap::new(),
            sandbox: None,
        }
    }

    /// Replaces the request headers.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the `Host` header. Values that are not valid header values are ignored.
    #[must_use]
    pub fn with_host(mut self, host: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(host) {
            self.headers.insert(HOST, value);
        }
        self
    }

    /// Attaches the routing layer's metadata.
    #[must_use]
    pub fn with_sandbox(mut self, sandbox: SandboxContext) -> Self {
        self.sandbox = Some(sandbox);
        self
    }

    /// Returns the matched route path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the original URL.
    #[must_use]
    pub fn original_url(&self) -> &str {
        &self.original_url
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the host the request was received on.
    ///
    /// Always the `Host` header; forwarding headers are not consulted because
    /// the result ends up in redirect targets.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.headers.get(HOST).and_then(|v| v.to_str().ok())
    }

    /// Returns the routing layer's metadata, if any.
    #[must_use]
    pub fn sandbox(&self) -> Option<&SandboxContext> {
        self.sandbox.as_ref()
    }
}

/// Addressing scheme the routing layer used to expose a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlFormat {
    /// Shared domain, tenant in the path: `/api/run/{container}/{name}`.
    SharedDomain,
    /// Custom domain, tenant in the path: `/{container}/{name}`.
    CustomDomain,
    /// Wildcard domain, tenant in the host: `/{name}`.
    WildcardDomain,
}

impl UrlFormat {
    /// Maps the wire tag to a format. Unknown tags yield `None`.
    #[must_use]
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::SharedDomain),
            2 => Some(Self::CustomDomain),
            3 => Some(Self::WildcardDomain),
            _ => None,
        }
    }

    /// Returns the wire tag.
    #[must_use]
    pub fn tag(&self) -> u8 {
        match self {
            Self::SharedDomain => 1,
            Self::CustomDomain => 2,
            Self::WildcardDomain => 3,
        }
    }
}

impl fmt::Display for UrlFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SharedDomain => f.write_str("shared-domain"),
            Self::CustomDomain => f.write_str("custom-domain"),
            Self::WildcardDomain => f.write_str("wildcard-domain"),
        }
    }
}

/// Routing metadata describing how the tenant routing layer rewrote a request.
///
/// Deserialized from the JSON the routing layer forwards, for example
/// `{"container":"acme","name":"console","url_format":1,"isolated_domain":true}`.
/// The scheme tag is kept raw so that an unknown tag surfaces as an
/// addressing error instead of a parse failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxContext {
    /// Tenant container the request was routed to.
    #[serde(default)]
    container: Option<String>,
    /// Name of the deployed service within the container.
    #[serde(default, alias = "jtn")]
    name: Option<String>,
    /// Addressing scheme tag, see [`UrlFormat`].
    url_format: u8,
    /// Whether the request entered through an isolated per-tenant domain.
    #[serde(default, alias = "ISOLATED_DOMAIN")]
    isolated_domain: bool,
}

impl SandboxContext {
    /// Creates a context with the given scheme tag and nothing else.
    #[must_use]
    pub fn new(url_format: u8) -> Self {
        Self {
            container: None,
            name: None,
            url_format,
            isolated_domain: false,
        }
    }

    /// Sets the tenant container.
    #[must_use]
    pub fn with_container(mut self, container: impl Into<String>) -> Self {
        self.container = Some(container.into());
        self
    }

    /// Sets the service name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Marks the request as arriving through an isolated domain.
    #[must_use]
    pub fn with_isolated_domain(mut self, isolated: bool) -> Self {
        self.isolated_domain = isolated;
        self
    }

    /// Returns the tenant container, treating an empty string as absent.
    #[must_use]
    pub fn container(&self) -> Option<&str> {
        self.container.as_deref().filter(|c| !c.is_empty())
    }

    /// Returns the service name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the raw scheme tag.
    #[must_use]
    pub fn url_format_tag(&self) -> u8 {
        self.url_format
    }

    /// Returns the decoded scheme, if the tag is known.
    #[must_use]
    pub fn url_format(&self) -> Option<UrlFormat> {
        UrlFormat::from_tag(self.url_format)
    }

    /// Returns true if the request came in through an isolated domain.
    #[must_use]
    pub fn is_isolated_domain(&self) -> bool {
        self.isolated_domain
    }

    /// Checks that the context can be interpreted.
    ///
    /// A context without a container is never rewritten, so its scheme tag
    /// is not looked at.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::UnsupportedScheme`] when a container is named
    /// together with an unknown scheme tag.
    pub fn validate(&self) -> Result<(), Report<AddressError>> {
        if self.container().is_some() && self.url_format().is_none() {
            return Err(AddressError::UnsupportedScheme {
                url_format: self.url_format,
            }
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_comes_from_host_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-host", HeaderValue::from_static("evil.example"));
        headers.insert(HOST, HeaderValue::from_static("console.example.com"));

        let request = RequestContext::new("/login", "/login").with_headers(headers);

        assert_eq!(request.host(), Some("console.example.com"));
    }

    #[test]
    fn missing_host_is_none() {
        let request = RequestContext::new("/login", "/login");
        assert_eq!(request.host(), None);
    }

    #[test]
    fn url_format_tags_roundtrip() {
        for format in [
            UrlFormat::SharedDomain,
            UrlFormat::CustomDomain,
            UrlFormat::WildcardDomain,
        ] {
            assert_eq!(UrlFormat::from_tag(format.tag()), Some(format));
        }
        assert_eq!(UrlFormat::from_tag(0), None);
        assert_eq!(UrlFormat::from_tag(4), None);
    }

    #[test]
    fn sandbox_context_deserializes_routing_layer_names() {
        let json = r#"{"container":"acme","jtn":"console","url_format":1,"ISOLATED_DOMAIN":true}"#;
        let sandbox: SandboxContext = serde_json::from_str(json).expect("deserialize");

        assert_eq!(sandbox.container(), Some("acme"));
        assert_eq!(sandbox.name(), Some("console"));
        assert_eq!(sandbox.url_format(), Some(UrlFormat::SharedDomain));
        assert!(sandbox.is_isolated_domain());
    }

    #[test]
    fn sandbox_context_keeps_unknown_tag() {
        let json = r#"{"container":"acme","url_format":9}"#;
        let sandbox: SandboxContext = serde_json::from_str(json).expect("deserialize");

        assert_eq!(sandbox.url_format_tag(), 9);
        assert_eq!(sandbox.url_format(), None);
        assert!(!sandbox.is_isolated_domain());
    }

    #[test]
    fn unknown_tag_with_container_fails_validation() {
        let sandbox = SandboxContext::new(9).with_container("acme");
        let err = sandbox.validate().expect_err("unknown scheme");
        assert_eq!(
            err.current_context(),
            &AddressError::UnsupportedScheme { url_format: 9 }
        );

        assert!(SandboxContext::new(9).validate().is_ok());
        assert!(SandboxContext::new(3).with_container("acme").validate().is_ok());
    }

    #[test]
    fn empty_container_is_absent() {
        let sandbox = SandboxContext::new(1).with_container("");
        assert_eq!(sandbox.container(), None);
    }
}
