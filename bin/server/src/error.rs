//! Centralized error responder.
//!
//! Every request-time failure ends up here as an `AppError`, is logged once,
//! and is rendered as `{ "error": <name>, "message": <text> }`. Only messages
//! that are safe to show a user are echoed; everything else is logged.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use console_gate_addressing::AddressError;
use console_gate_platform_access::{SessionError, ValidationError};
use rootcause::prelude::Report;
use serde::Serialize;

/// Request-time errors.
#[derive(Debug)]
pub enum AppError {
    /// The login callback was rejected.
    Validation(Report<ValidationError>),
    /// The session issuer or session verification failed.
    Session(Report<SessionError>),
    /// The routing layer handed us metadata we cannot interpret.
    Address(Report<AddressError>),
    /// A protected route was called without a session token.
    Unauthenticated,
}

impl From<Report<ValidationError>> for AppError {
    fn from(report: Report<ValidationError>) -> Self {
        Self::Validation(report)
    }
}

impl From<Report<SessionError>> for AppError {
    fn from(report: Report<SessionError>) -> Self {
        Self::Session(report)
    }
}

impl From<Report<AddressError>> for AppError {
    fn from(report: Report<AddressError>) -> Self {
        Self::Address(report)
    }
}

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl AppError {
    /// Returns the status code, error name and user-facing message.
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            Self::Validation(report) => (
                StatusCode::BAD_REQUEST,
                "ValidationError",
                report.current_context().to_string(),
            ),
            Self::Session(report) => match report.current_context() {
                SessionError::InvalidToken { .. } => (
                    StatusCode::UNAUTHORIZED,
                    "UnauthorizedError",
                    "Invalid token.".to_string(),
                ),
                SessionError::MissingAccessToken => (
                    StatusCode::UNAUTHORIZED,
                    "UnauthorizedError",
                    "Access token is required.".to_string(),
                ),
                SessionError::KeySetUnavailable { .. } | SessionError::SigningFailed { .. } => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "InternalServerError",
                    "Internal server error".to_string(),
                ),
            },
            Self::Address(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "InternalServerError",
                "Internal server error".to_string(),
            ),
            Self::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "UnauthorizedError",
                "No authorization token was found.".to_string(),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = self.parts();

        match &self {
            Self::Validation(report) => {
                tracing::warn!(error = %report, "login callback rejected");
            }
            Self::Session(report) if status.is_server_error() => {
                tracing::error!(error = %report, "session issuer failed");
            }
            Self::Session(report) => {
                tracing::warn!(error = %report, "session token rejected");
            }
            Self::Address(report) => {
                tracing::error!(error = %report, "cannot resolve request address");
            }
            Self::Unauthenticated => {
                tracing::debug!("request without session token");
            }
        }

        (status, Json(ErrorBody { error, message })).into_response()
    }
}
