//! Core business logic for fedblog.
//!
//! Services sit between the HTTP endpoints and the repositories: they own
//! validation, permission checks, slug generation and image processing.

pub mod services;

pub use services::*;
