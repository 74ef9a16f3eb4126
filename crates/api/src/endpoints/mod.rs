//! API endpoints.

mod auth;
mod comments;
mod me;
mod posts;
mod root;
mod upload;
mod users;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(root::router())
        .merge(auth::router())
        .nest("/me", me::router())
        .nest("/users", users::router())
        .nest("/posts", posts::router())
        .nest("/comments", comments::router())
}
