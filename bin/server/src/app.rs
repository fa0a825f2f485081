//! Router for the console login routes.

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::auth::{self, AppState};

/// Path of the OAuth client configuration document.
pub const DISCOVERY_ROUTE: &str = "/.well-known/oauth2-client-configuration";

/// Builds the router for the login, callback, logout and discovery routes.
///
/// Login routes sit under the configured URL prefix. The router may itself
/// be nested under a mount prefix; base paths and URLs are recovered from
/// the original request URL either way.
pub fn router(state: Arc<AppState>) -> Router {
    let settings = &state.settings;

    Router::new()
        .route(&settings.login_route(), get(auth::login))
        .route(&settings.callback_route(), post(auth::callback))
        .route(&settings.logout_route(), get(auth::logout))
        .route(DISCOVERY_ROUTE, get(auth::discovery))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
