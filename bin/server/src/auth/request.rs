//! Request extractor for address resolution.

use axum::{
    extract::{FromRef, FromRequestParts, OriginalUri},
    http::{HeaderMap, request::Parts},
};
use console_gate_addressing::{AddressComponents, RequestContext, SandboxContext};
use std::sync::Arc;

use super::AppState;
use crate::error::AppError;

/// The externally visible address of the current request.
///
/// The route path is the path the router matched, after any nesting. The
/// original URL is taken from the configured routing layer header when
/// present, and from the URL axum saw before nesting otherwise. A routing
/// context with a scheme we cannot interpret fails the request.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    components: AddressComponents,
}

impl InboundRequest {
    /// Returns the mount prefix, starting and ending with `/`.
    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.components.base_path
    }

    /// Returns scheme, host and mount prefix without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.components.base_url
    }
}

impl<S> FromRequestParts<S> for InboundRequest
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = Arc::<AppState>::from_ref(state);
        let routing = &app_state.routing;

        let original_url = routing
            .original_url_header
            .as_deref()
            .and_then(|name| header(&parts.headers, name))
            .map(str::to_string)
            .or_else(|| {
                parts
                    .extensions
                    .get::<OriginalUri>()
                    .map(|uri| uri.0.to_string())
            })
            .unwrap_or_else(|| parts.uri.to_string());

        let mut context = RequestContext::new(parts.uri.path(), original_url)
            .with_headers(parts.headers.clone());

        if let Some(sandbox) = routing
            .context_header
            .as_deref()
            .and_then(|name| header(&parts.headers, name))
            .and_then(parse_sandbox)
        {
            sandbox.validate()?;
            context = context.with_sandbox(sandbox);
        }

        let components = app_state.resolver.components(&context);
        tracing::debug!(base_url = %components.base_url, "resolved request address");

        Ok(Self { components })
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
}

fn parse_sandbox(raw: &str) -> Option<SandboxContext> {
    match serde_json::from_str(raw) {
        Ok(sandbox) => Some(sandbox),
        Err(e) => {
            tracing::warn!(error = %e, "ignoring malformed sandbox routing context");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn parses_routing_layer_context() {
        let sandbox = parse_sandbox(r#"{"container":"acme","url_format":2}"#)
            .expect("context should parse");
        assert_eq!(sandbox.container(), Some("acme"));
    }

    #[test]
    fn malformed_context_is_ignored() {
        assert!(parse_sandbox("not json").is_none());
    }

    #[test]
    fn empty_header_is_absent() {
        let mut headers = HeaderMap::new();
        headers.insert("x-original-url", HeaderValue::from_static(""));
        assert_eq!(header(&headers, "x-original-url"), None);
    }
}
