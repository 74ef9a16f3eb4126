//! Authentication endpoints.

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use fedblog_common::AppResult;
use fedblog_core::{IssuedToken, LoginInput, RegisterInput};
use fedblog_db::entities::user;

use crate::{
    extractors::{MaybeAuthUser, Session},
    middleware::AppState,
    response::Message,
};

/// Create a regular account.
async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> AppResult<(StatusCode, Json<user::Model>)> {
    let user = state.auth_service.register(input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Exchange credentials for a bearer token.
async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> AppResult<Json<IssuedToken>> {
    Ok(Json(state.auth_service.login(input).await?))
}

/// Revoke the token used for this request.
async fn logout(
    Session(session): Session,
    State(state): State<AppState>,
) -> AppResult<Json<Message>> {
    state.auth_service.logout(&session).await?;
    Ok(Json(Message {
        message: "Logged out",
    }))
}

/// Create an administrator account.
async fn create_admin(
    MaybeAuthUser(caller): MaybeAuthUser,
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> AppResult<(StatusCode, Json<user::Model>)> {
    let user = state
        .auth_service
        .create_admin(caller.as_ref(), input)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/create-admin", post(create_admin))
}
