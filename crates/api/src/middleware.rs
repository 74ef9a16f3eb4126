//! API middleware.

#![allow(missing_docs)]

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use fedblog_core::{AuthService, CommentService, MediaService, PostService, UserService};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub post_service: PostService,
    pub comment_service: CommentService,
    pub media_service: MediaService,
}

/// Authentication middleware.
///
/// A valid `Authorization: Bearer` token puts the
/// [`Authenticated`](fedblog_core::Authenticated) session in the request
/// extensions. Anything else leaves the request anonymous; endpoints that
/// need a user reject it themselves.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get(header::AUTHORIZATION)
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.auth_service.authenticate(token.trim()).await {
            Ok(Some(session)) => {
                req.extensions_mut().insert(session);
            }
            Ok(None) => tracing::debug!("Unknown or expired bearer token"),
            Err(e) => tracing::warn!(error = %e, "Token lookup failed"),
        }
    }

    next.run(req).await
}
