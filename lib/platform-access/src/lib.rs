//! Console login for console-gate.
//!
//! This crate provides the request-independent parts of the admin console
//! login round trip:
//! - Login options and their validation (`LoginOptions`, `LoginSettings`)
//! - CSRF state/nonce tokens stored in two cookie generations
//! - Unverified decoding of identity tokens
//! - The identity provider's authorize URL
//! - The `SessionIssuer` contract and a JWKS-backed implementation
//! - The HTML pages that hand the session token to the browser
//!
//! # Example
//!
//! ```
//! use console_gate_platform_access::{
//!     AuthorizeUrlBuilder, CsrfTokenPair, LoginSettings, verify_callback,
//! };
//!
//! let settings = LoginSettings::builder(
//!     "secret",
//!     "urn:console",
//!     "auth.example.com",
//!     "tenant.example.com",
//!     "https://console.example.com",
//!     "Console",
//! )
//! .build()
//! .expect("valid settings");
//!
//! // Login: generate tokens and redirect to the provider
//! let tokens = CsrfTokenPair::generate();
//! let url = AuthorizeUrlBuilder::new(&settings, "https://console.example.com/login/callback")
//!     .build(&tokens);
//! assert!(url.starts_with("https://auth.example.com/authorize?"));
//!
//! // Callback: both cookie generations came back unchanged
//! let cookies = |name: &str| match name {
//!     "state" | "state_compat" => Some(tokens.state().to_string()),
//!     "nonce" | "nonce_compat" => Some(tokens.nonce().to_string()),
//!     _ => None,
//! };
//! assert!(verify_callback(
//!     settings.csrf_keys(),
//!     cookies,
//!     Some(tokens.nonce()),
//!     Some(tokens.state()),
//! )
//! .is_ok());
//! ```

pub mod authorize;
pub mod claims;
pub mod csrf;
pub mod error;
pub mod options;
pub mod page;
pub mod session;

// Re-export main types at crate root
pub use authorize::AuthorizeUrlBuilder;
pub use claims::{IdentityTokenClaims, decode_unverified};
pub use csrf::{CookieGeneration, CsrfKeys, CsrfTokenPair, verify_callback};
pub use error::{ConfigurationError, SessionError, ValidationError};
pub use options::{LoginOptions, LoginSettings, LoginSettingsBuilder, StorageType};
pub use page::{login_page, logout_page, provider_logout_url};
pub use session::{
    JwksSessionIssuer, SessionClaims, SessionIssuer, SessionRequest, verify_session,
};
