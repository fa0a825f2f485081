//! Minimal HTML documents returned by the login and logout routes.
//!
//! Each page is a single inline script that touches client-side storage and
//! then navigates away. Every embedded value is written as a JSON string
//! literal with `<` escaped, so values derived from request headers cannot
//! terminate the script element.

use crate::options::StorageType;

fn js_string(value: &str) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "\"\"".to_string())
        .replace('<', "\\u003c")
}

fn document(script: &str) -> String {
    format!("<html><head><script type=\"text/javascript\">{script}</script></head></html>")
}

/// Stores the session token and navigates to the console root.
#[must_use]
pub fn login_page(storage: StorageType, storage_key: &str, token: &str, base_url: &str) -> String {
    document(&format!(
        "{storage}.setItem({}, {});window.location.href = {};",
        js_string(storage_key),
        js_string(token),
        js_string(base_url),
    ))
}

/// Returns the identity provider's logout URL, returning to `base_url`.
#[must_use]
pub fn provider_logout_url(rta: &str, base_url: &str) -> String {
    let encoded = urlencoding::encode(base_url);
    format!("https://{rta}/v2/logout/?returnTo={encoded}&client_id={encoded}")
}

/// Removes the session token and navigates to the provider's logout endpoint.
#[must_use]
pub fn logout_page(storage: StorageType, storage_key: &str, rta: &str, base_url: &str) -> String {
    document(&format!(
        "{storage}.removeItem({});window.location.href = {};",
        js_string(storage_key),
        js_string(&provider_logout_url(rta, base_url)),
    ))
}
