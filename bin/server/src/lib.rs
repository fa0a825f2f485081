//! console-gate web server.
//!
//! This crate wires the login crates into an axum router: the login,
//! callback, logout and discovery routes, the cookie codec for the CSRF
//! tokens, request extractors and the centralized error responder.

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
