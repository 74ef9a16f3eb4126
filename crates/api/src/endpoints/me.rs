//! Endpoints acting on the caller's own account.

use axum::{
    Json, Router,
    extract::{Multipart, State},
    http::StatusCode,
    routing::{get, post},
};
use fedblog_common::{AppError, AppResult};
use fedblog_core::UpdateMeInput;
use fedblog_db::entities::user;
use serde::Serialize;

use crate::{
    endpoints::upload::read_image,
    extractors::AuthUser,
    middleware::AppState,
    response::no_content,
};

/// Avatar upload response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarResponse {
    pub resized_image_path: String,
}

async fn show(AuthUser(me): AuthUser) -> Json<user::Model> {
    Json(me)
}

async fn update(
    AuthUser(me): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UpdateMeInput>,
) -> AppResult<StatusCode> {
    state.user_service.update_me(&me, input).await?;
    Ok(no_content())
}

async fn delete(AuthUser(me): AuthUser, State(state): State<AppState>) -> AppResult<StatusCode> {
    state.user_service.delete_me(&me).await?;
    Ok(no_content())
}

/// Replace the caller's avatar with a 500x500 PNG.
async fn upload_avatar(
    AuthUser(me): AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Json<AvatarResponse>> {
    if me.is_suspended() {
        return Err(AppError::suspended());
    }

    let file = read_image(multipart).await?;
    let avatar = state.media_service.upload_avatar(&me.id, file.data).await?;
    state
        .user_service
        .set_avatar(&me, Some(avatar.url.clone()))
        .await?;

    Ok(Json(AvatarResponse {
        resized_image_path: avatar.url,
    }))
}

async fn delete_avatar(
    AuthUser(me): AuthUser,
    State(state): State<AppState>,
) -> AppResult<&'static str> {
    state.media_service.delete_avatar(&me.id).await?;
    state.user_service.set_avatar(&me, None).await?;
    Ok("Image deleted successfully")
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(show).put(update).delete(delete))
        .route("/avatar", post(upload_avatar).delete(delete_avatar))
}
