//! Path helpers shared by base and sandbox resolution.

use http::Uri;
use regex::Regex;

/// Returns the path component of an absolute URL or an origin-form path.
///
/// Query and fragment are dropped. Input that cannot be parsed at all
/// yields an empty path.
pub(crate) fn pathname(url: &str) -> String {
    if url.is_empty() {
        return String::new();
    }

    if let Ok(uri) = url.parse::<Uri>() {
        return uri.path().to_string();
    }

    // Lenient fallback for input `Uri` rejects (spaces, non-ASCII).
    let without_scheme = match url.find("://") {
        Some(idx) => {
            let rest = &url[idx + 3..];
            match rest.find('/') {
                Some(slash) => &rest[slash..],
                None => "/",
            }
        }
        None => url,
    };
    let end = without_scheme
        .find(['?', '#'])
        .unwrap_or(without_scheme.len());
    without_scheme[..end].to_string()
}

/// Removes `route` from the end of `pathname`.
///
/// The route is escaped before it is embedded in the pattern, so route
/// segments containing pattern metacharacters are matched literally.
pub(crate) fn strip_route_suffix(pathname: &str, route: &str) -> String {
    if route.is_empty() {
        return pathname.to_string();
    }

    match Regex::new(&format!("{}$", regex::escape(route))) {
        Ok(rx) => rx.replace(pathname, "").into_owned(),
        // Only reachable past the compiled size limit; same result without the pattern.
        Err(_) => pathname
            .strip_suffix(route)
            .unwrap_or(pathname)
            .to_string(),
    }
}

/// Joins scheme, host and path into an absolute URL.
///
/// A non-empty path without a leading slash gets one.
pub(crate) fn format_url(scheme: &str, host: &str, path: &str) -> String {
    if path.is_empty() || path.starts_with('/') {
        format!("{scheme}://{host}{path}")
    } else {
        format!("{scheme}://{host}/{path}")
    }
}
