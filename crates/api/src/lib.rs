//! HTTP API layer for fedblog.
//!
//! - **Endpoints**: auth, account, users, posts, comments and images
//! - **Extractors**: current user from the bearer token
//! - **Middleware**: bearer token authentication
//!
//! Built on Axum 0.8.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};
