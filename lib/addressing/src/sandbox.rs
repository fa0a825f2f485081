//! Sandbox routing URL resolution.
//!
//! A multi-tenant routing layer exposes each tenant under one of three
//! addressing schemes and rewrites the path before it reaches us. When a
//! request arrives through an isolated per-tenant domain the externally
//! visible URL is additionally rewritten from the shared ingress host to the
//! tenant's regional canonical host.

use crate::error::AddressError;
use crate::pattern::{format_url, pathname};
use crate::request::{RequestContext, SandboxContext, UrlFormat};
use regex::Regex;
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};

/// Host name conventions of the routing layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxDomains {
    /// Suffix of the shared ingress host, e.g. `.it.auth0.com`.
    ingress_suffix: String,
    /// Domain regional canonical hosts live under, e.g. `webtask.io`.
    regional_domain: String,
    /// Substring of the ingress URL that marks the newer runtime.
    version_marker: String,
    /// Tag appended to the region for the newer runtime.
    version_tag: String,
    /// Region used when the ingress host names none.
    default_region: String,
}

impl Default for SandboxDomains {
    fn default() -> Self {
        Self {
            ingress_suffix: ".it.auth0.com".to_string(),
            regional_domain: "webtask.io".to_string(),
            version_marker: "sandbox8".to_string(),
            version_tag: "8".to_string(),
            default_region: "us".to_string(),
        }
    }
}

impl SandboxDomains {
    /// Sets the shared ingress host suffix.
    #[must_use]
    pub fn with_ingress_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.ingress_suffix = suffix.into();
        self
    }

    /// Sets the regional domain.
    #[must_use]
    pub fn with_regional_domain(mut self, domain: impl Into<String>) -> Self {
        self.regional_domain = domain.into();
        self
    }

    /// Returns the shared ingress host suffix.
    #[must_use]
    pub fn ingress_suffix(&self) -> &str {
        &self.ingress_suffix
    }

    /// Returns the regional domain.
    #[must_use]
    pub fn regional_domain(&self) -> &str {
        &self.regional_domain
    }

    /// Returns the regional canonical URL for `container`, derived from an
    /// ingress URL such as `https://sandbox8-eu.it.auth0.com/...`.
    ///
    /// The region is the second `-` separated part of everything before the
    /// ingress suffix; the version tag is added when the URL carries the
    /// version marker.
    #[must_use]
    pub fn regional_url(&self, ingress_url: &str, container: &str) -> String {
        let version = if ingress_url.contains(&self.version_marker) {
            self.version_tag.as_str()
        } else {
            ""
        };

        let head = ingress_url
            .split(self.ingress_suffix.as_str())
            .next()
            .unwrap_or_default();
        let region = head
            .split('-')
            .nth(1)
            .filter(|r| !r.is_empty())
            .unwrap_or(self.default_region.as_str());

        format!(
            "https://{container}.{region}{version}.{}/",
            self.regional_domain
        )
    }
}

/// Builds the pattern that removes the tenant prefix from a request path.
///
/// Returns `None` when the routing context names no container.
pub(crate) fn route_normalization(
    sandbox: &SandboxContext,
) -> Result<Option<Regex>, Report<AddressError>> {
    let Some(container) = sandbox.container() else {
        return Ok(None);
    };

    let container = regex::escape(container);
    let name = sandbox.name().map(regex::escape).unwrap_or_default();

    let pattern = match sandbox.url_format() {
        Some(UrlFormat::SharedDomain) => format!("^/api/run/{container}/(?:{name}/?)?"),
        Some(UrlFormat::CustomDomain) => format!("^/{container}/(?:{name}/?)?"),
        Some(UrlFormat::WildcardDomain) => format!("^/(?:{name}/?)?"),
        None => {
            return Err(AddressError::UnsupportedScheme {
                url_format: sandbox.url_format_tag(),
            }
            .into());
        }
    };

    let rx = Regex::new(&pattern).map_err(|e| AddressError::InvalidPattern {
        reason: e.to_string(),
    })?;
    Ok(Some(rx))
}

/// Returns the externally visible URL of the request as seen through the
/// tenant routing layer.
///
/// Without routing metadata, or when the request did not enter through an
/// isolated domain, this is the path of the original URL. Otherwise it is an
/// absolute `https` URL of the tenant mount point, moved to the regional
/// canonical host when the URL still points at the shared ingress.
///
/// # Errors
///
/// Returns [`AddressError::UnsupportedScheme`] when the routing context
/// names a container but carries an unknown scheme tag.
pub fn sandbox_routing_url(
    request: &RequestContext,
    domains: &SandboxDomains,
) -> Result<String, Report<AddressError>> {
    let original = pathname(request.original_url());

    let Some(sandbox) = request.sandbox() else {
        return Ok(original);
    };

    let normalization = route_normalization(sandbox)?;
    if !sandbox.is_isolated_domain() {
        return Ok(original);
    }

    let request_path = match &normalization {
        Some(rx) => rx.replace(&original, "/").into_owned(),
        None => original.clone(),
    };

    let mount = original.replacen(&request_path, "", 1);
    let mount = mount.strip_suffix('/').unwrap_or(&mount);
    let host = request.host().unwrap_or_default();
    let url = format_url("https", host, mount);

    // Containerless contexts have nothing to relocate.
    let Some(container) = sandbox.container() else {
        return Ok(url);
    };

    let trigger = format!("{}/api/run/{container}/", domains.ingress_suffix);
    if !url.contains(&trigger) {
        return Ok(url);
    }

    let ingress_prefix = format!("https://{host}/api/run/{container}/");
    let regional = domains.regional_url(&url, container);
    Ok(url.replacen(&ingress_prefix, &regional, 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(host: &str, original: &str, sandbox: SandboxContext) -> RequestContext {
        RequestContext::new("/login", original)
            .with_host(host)
            .with_sandbox(sandbox)
    }

    #[test]
    fn regional_url_with_region_and_version() {
        let domains = SandboxDomains::default();
        assert_eq!(
            domains.regional_url("https://sandbox8-eu.it.auth0.com/api/run/acme/x", "acme"),
            "https://acme.eu8.webtask.io/"
        );
    }

    #[test]
    fn regional_url_defaults_to_us() {
        let domains = SandboxDomains::default();
        assert_eq!(
            domains.regional_url("https://sandbox.it.auth0.com/api/run/acme/x", "acme"),
            "https://acme.us.webtask.io/"
        );
        assert_eq!(
            domains.regional_url("https://sandbox8.it.auth0.com/api/run/acme/x", "acme"),
            "https://acme.us8.webtask.io/"
        );
    }

    #[test]
    fn shared_domain_pattern_strips_container_and_name() {
        let sandbox = SandboxContext::new(1)
            .with_container("acme")
            .with_name("console");
        let rx = route_normalization(&sandbox)
            .expect("pattern")
            .expect("container present");

        assert_eq!(rx.replace("/api/run/acme/console/login", "/"), "/login");
        assert_eq!(rx.replace("/api/run/acme/login", "/"), "/login");
    }

    #[test]
    fn custom_and_wildcard_patterns() {
        let custom = SandboxContext::new(2)
            .with_container("acme")
            .with_name("console");
        let rx = route_normalization(&custom).expect("pattern").expect("rx");
        assert_eq!(rx.replace("/acme/console/logout", "/"), "/logout");

        let wildcard = SandboxContext::new(3)
            .with_container("acme")
            .with_name("console");
        let rx = route_normalization(&wildcard).expect("pattern").expect("rx");
        assert_eq!(rx.replace("/console/logout", "/"), "/logout");
    }

    #[test]
    fn container_metacharacters_are_literal() {
        let sandbox = SandboxContext::new(2).with_container("a.c").with_name("n");
        let rx = route_normalization(&sandbox).expect("pattern").expect("rx");

        assert_eq!(rx.replace("/a.c/n/login", "/"), "/login");
        assert_eq!(rx.replace("/abc/n/login", "/"), "/abc/n/login");
    }

    #[test]
    fn no_container_means_no_pattern() {
        let sandbox = SandboxContext::new(9);
        assert!(route_normalization(&sandbox).expect("no error").is_none());
    }

    #[test]
    fn unknown_scheme_is_an_error() {
        let sandbox = SandboxContext::new(4).with_container("acme");
        let request = request("h", "/acme/login", sandbox);

        let err = sandbox_routing_url(&request, &SandboxDomains::default())
            .expect_err("unknown scheme");
        assert_eq!(
            err.current_context(),
            &AddressError::UnsupportedScheme { url_format: 4 }
        );
    }

    #[test]
    fn without_sandbox_returns_original_path() {
        let request = RequestContext::new("/login", "/console/login?x=1").with_host("h");
        let url = sandbox_routing_url(&request, &SandboxDomains::default()).expect("url");
        assert_eq!(url, "/console/login");
    }

    #[test]
    fn non_isolated_domain_returns_original_path() {
        let sandbox = SandboxContext::new(1)
            .with_container("acme")
            .with_name("console");
        let request = request(
            "sandbox8-eu.it.auth0.com",
            "/api/run/acme/console/login",
            sandbox,
        );

        let url = sandbox_routing_url(&request, &SandboxDomains::default()).expect("url");
        assert_eq!(url, "/api/run/acme/console/login");
    }

    #[test]
    fn isolated_shared_ingress_is_relocated_to_region() {
        let sandbox = SandboxContext::new(1)
            .with_container("acme")
            .with_name("console")
            .with_isolated_domain(true);
        let request = request(
            "sandbox8-eu.it.auth0.com",
            "/api/run/acme/console/login",
            sandbox,
        );

        let url = sandbox_routing_url(&request, &SandboxDomains::default()).expect("url");
        assert_eq!(url, "https://acme.eu8.webtask.io/console");
    }

    #[test]
    fn isolated_custom_domain_keeps_host() {
        let sandbox = SandboxContext::new(2)
            .with_container("acme")
            .with_name("console")
            .with_isolated_domain(true);
        let request = request("console.acme.example", "/acme/console/login", sandbox);

        let url = sandbox_routing_url(&request, &SandboxDomains::default()).expect("url");
        assert_eq!(url, "https://console.acme.example/acme/console");
    }

    #[test]
    fn isolated_request_at_mount_root() {
        let sandbox = SandboxContext::new(3)
            .with_container("acme")
            .with_name("console")
            .with_isolated_domain(true);
        let request = request("acme.tenants.example", "/console/", sandbox);

        let url = sandbox_routing_url(&request, &SandboxDomains::default()).expect("url");
        assert_eq!(url, "https://acme.tenants.example/console");
    }

    #[test]
    fn custom_ingress_suffix() {
        let domains = SandboxDomains::default()
            .with_ingress_suffix(".run.example")
            .with_regional_domain("tenants.example");
        let sandbox = SandboxContext::new(1)
            .with_container("acme")
            .with_name("console")
            .with_isolated_domain(true);
        let request = request("edge-ap.run.example", "/api/run/acme/console/login", sandbox);

        let url = sandbox_routing_url(&request, &domains).expect("url");
        assert_eq!(url, "https://acme.ap.tenants.example/console");
    }
}
