//! Login, callback, logout and discovery routes.

use axum::{
    Form, Json,
    extract::{State, rejection::FormRejection},
    response::{Html, IntoResponse, Redirect},
};
use axum_extra::extract::cookie::CookieJar;
use console_gate_platform_access::{
    AuthorizeUrlBuilder, CsrfTokenPair, SessionRequest, decode_unverified, login_page,
    logout_page, verify_callback,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{AppState, csrf, request::InboundRequest};
use crate::error::AppError;

/// Form fields the identity provider posts to the callback.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackForm {
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    state: Option<String>,
}

/// OAuth client configuration document.
#[derive(Debug, Serialize)]
pub struct ClientConfiguration {
    redirect_uris: Vec<String>,
    client_name: String,
    post_logout_redirect_uris: Vec<String>,
}

/// Starts a login by setting the CSRF cookies and redirecting to the identity provider.
pub async fn login(
    State(state): State<Arc<AppState>>,
    request: InboundRequest,
    jar: CookieJar,
) -> impl IntoResponse {
    let settings = &state.settings;
    let tokens = CsrfTokenPair::generate();

    let redirect_uri = format!("{}{}", request.base_url(), settings.callback_route());
    let authorize_url = AuthorizeUrlBuilder::new(settings, redirect_uri).build(&tokens);

    tracing::debug!(base_path = request.base_path(), "redirecting to identity provider");

    let jar = csrf::issue(jar, settings.csrf_keys(), request.base_path(), &tokens);
    (jar, Redirect::to(&authorize_url))
}

/// Completes a login posted back by the identity provider.
///
/// The identity token is decoded without verification only to read its
/// nonce. Trust is established by the session issuer.
pub async fn callback(
    State(state): State<Arc<AppState>>,
    request: InboundRequest,
    jar: CookieJar,
    form: Result<Form<CallbackForm>, FormRejection>,
) -> Result<impl IntoResponse, AppError> {
    let settings = &state.settings;

    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "unreadable callback form");
            CallbackForm::default()
        }
    };

    let id_token = form.id_token.as_deref().unwrap_or_default();
    let claims = decode_unverified(id_token)?;

    verify_callback(
        settings.csrf_keys(),
        csrf::lookup(&jar),
        claims.nonce(),
        form.state.as_deref(),
    )?;

    let session_token = state
        .issuer
        .issue(SessionRequest {
            id_token,
            access_token: form.access_token.as_deref(),
            no_access_token: settings.no_access_token(),
        })
        .await?;

    tracing::info!(subject = ?claims.sub, "console login completed");

    let jar = csrf::clear(jar, settings.csrf_keys(), request.base_path());
    let page = login_page(
        settings.storage_type(),
        settings.storage_key(),
        &session_token,
        request.base_url(),
    );

    Ok((jar, Html(page)))
}

/// Clears the CSRF cookies and the stored session token, then leaves through
/// the identity provider's logout endpoint.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    request: InboundRequest,
    jar: CookieJar,
) -> impl IntoResponse {
    let settings = &state.settings;

    let jar = csrf::clear(jar, settings.csrf_keys(), request.base_path());
    let page = logout_page(
        settings.storage_type(),
        settings.storage_key(),
        settings.rta(),
        request.base_url(),
    );

    (jar, Html(page))
}

/// Serves the OAuth client configuration for this deployment.
pub async fn discovery(
    State(state): State<Arc<AppState>>,
    request: InboundRequest,
) -> Json<ClientConfiguration> {
    let settings = &state.settings;

    Json(ClientConfiguration {
        redirect_uris: vec![format!(
            "{}{}",
            request.base_url(),
            settings.callback_route()
        )],
        client_name: settings.client_name().to_string(),
        post_logout_redirect_uris: vec![request.base_url().to_string()],
    })
}
