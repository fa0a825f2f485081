//! Address resolution for console-gate.
//!
//! The login routes have to build absolute URLs (redirect URIs, the console
//! root, discovery documents) and cookie paths that match what the browser
//! sees. When the service runs behind a multi-tenant routing layer the
//! request path is rewritten on the way in, so the mount prefix has to be
//! recovered from the original URL.
//!
//! This crate provides:
//! - `RequestContext`: the read-only view of an inbound request
//! - `SandboxContext`: routing metadata supplied by the tenant routing layer
//! - `AddressResolver`: base path, base URL and sandbox routing URL
//!
//! # Example
//!
//! ```
//! use console_gate_addressing::{AddressResolver, RequestContext};
//! use console_gate_core::RuntimeMode;
//!
//! let request = RequestContext::new("/login", "/api/run/mytenant/abc/login")
//!     .with_host("sandbox.example.com");
//! let resolver = AddressResolver::new(RuntimeMode::Production);
//!
//! assert_eq!(resolver.base_path(&request), "/api/run/mytenant/abc/");
//! assert_eq!(
//!     resolver.base_url(&request),
//!     "https://sandbox.example.com/api/run/mytenant/abc"
//! );
//! ```

pub mod base;
pub mod error;
pub mod request;
pub mod resolver;
pub mod sandbox;

mod pattern;

pub use base::{base_path, base_url};
pub use error::AddressError;
pub use request::{RequestContext, SandboxContext, UrlFormat};
pub use resolver::{AddressComponents, AddressResolver};
pub use sandbox::{SandboxDomains, sandbox_routing_url};
