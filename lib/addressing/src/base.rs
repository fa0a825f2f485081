//! Base path and base URL of a request.
//!
//! The base path is the mount prefix the browser sees in front of the
//! matched route, recovered by removing the route from the end of the
//! original URL. It scopes cookies. The base URL is the same prefix
//! qualified with scheme and host and is used to build redirect targets.

use crate::pattern::{format_url, pathname, strip_route_suffix};
use crate::request::RequestContext;

/// Returns the mount prefix of the request, always starting and ending with `/`.
///
/// Returns `/` when the service is not mounted under a prefix.
#[must_use]
pub fn base_path(request: &RequestContext) -> String {
    let original = pathname(request.original_url());
    let stripped = strip_route_suffix(&original, request.path());

    let trimmed = stripped.strip_prefix('/').unwrap_or(&stripped);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);

    let mut base = String::with_capacity(trimmed.len() + 2);
    if !trimmed.starts_with('/') {
        base.push('/');
    }
    base.push_str(trimmed);
    if !base.ends_with('/') {
        base.push('/');
    }
    base
}

/// Returns `scheme://host{prefix}` for the request, without a trailing slash.
///
/// `scheme` is used as given; callers decide between an explicit override
/// and the runtime mode's default. A request without a `Host` header
/// produces an empty host.
#[must_use]
pub fn base_url(request: &RequestContext, scheme: &str) -> String {
    let original = pathname(request.original_url());
    let stripped = strip_route_suffix(&original, request.path());
    let prefix = stripped.strip_suffix('/').unwrap_or(&stripped);

    format_url(scheme, request.host().unwrap_or_default(), prefix)
}
