//! User endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    routing::{get, put},
};
use fedblog_common::{AppError, AppResult};
use fedblog_core::PublicUser;
use serde::Deserialize;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{PostSummary, image, no_content},
};

/// Permission change request.
#[derive(Debug, Deserialize)]
pub struct PermissionRequest {
    pub permission: i16,
}

async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<PublicUser>>> {
    Ok(Json(state.user_service.list().await?))
}

async fn show(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<Json<PublicUser>> {
    Ok(Json(state.user_service.get_public(&username).await?))
}

/// Posts written by a user, newest first, without their body.
async fn posts(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<PostSummary>>> {
    let posts = state.user_service.posts_of(&id).await?;
    Ok(Json(
        posts
            .into_iter()
            .map(|post| PostSummary::new(post, None))
            .collect(),
    ))
}

async fn delete(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<StatusCode> {
    state.user_service.delete_user(&caller, &username).await?;
    Ok(no_content())
}

async fn change_permission(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(req): Json<PermissionRequest>,
) -> AppResult<StatusCode> {
    state
        .user_service
        .change_permission(&caller, &username, req.permission)
        .await?;
    Ok(no_content())
}

async fn avatar(State(state): State<AppState>, Path(name): Path<String>) -> AppResult<Response> {
    state
        .media_service
        .user_image(&name)
        .await?
        .map(|bytes| image("avatar.png", bytes))
        .ok_or_else(|| AppError::NotFound("Image introuvable.".to_string()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/images/{name}", get(avatar))
        .route("/{username}", get(show).delete(delete))
        .route("/{username}/permission", put(change_permission))
        .route("/{username}/posts", get(posts))
}
