//! Core types shared by the console-gate crates.
//!
//! This crate provides the process-wide runtime mode that the addressing
//! and login crates are configured with.

pub mod mode;

pub use mode::RuntimeMode;
