//! Post endpoints.

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use fedblog_common::{AppError, AppResult};
use fedblog_core::{
    CreateCommentInput, CreatePostInput, ListPostsQuery, PostListing, UpdatePostInput,
};
use fedblog_db::repositories::PostWithAuthor;
use serde::Serialize;

use crate::{
    endpoints::upload::read_image,
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::{PageResponse, PostSummary, PostView, image, no_content},
};

/// Response header telling whether the caller liked the post.
pub const HAS_LIKED_HEADER: &str = "has_liked";

/// Post image upload response.
#[derive(Serialize)]
pub struct UploadResponse {
    pub path: String,
}

async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListPostsQuery>,
) -> AppResult<Response> {
    let summarize = |(post, author): PostWithAuthor| PostSummary::new(post, author);

    Ok(match state.post_service.list(query).await? {
        PostListing::All(posts) => {
            Json(posts.into_iter().map(summarize).collect::<Vec<_>>()).into_response()
        }
        PostListing::Page(page) => PageResponse::from(page.map(summarize)).into_response(),
    })
}

async fn show(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Response> {
    let detail = state.post_service.get(&slug, viewer.as_ref()).await?;
    let has_liked = if detail.has_liked { "true" } else { "false" };

    let mut response = Json(PostView::from(detail)).into_response();
    response
        .headers_mut()
        .insert(HAS_LIKED_HEADER, HeaderValue::from_static(has_liked));
    Ok(response)
}

async fn create(
    AuthUser(author): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreatePostInput>,
) -> AppResult<&'static str> {
    state.post_service.create(&author, input).await?;
    Ok("Post créé !")
}

async fn update(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(input): Json<UpdatePostInput>,
) -> AppResult<StatusCode> {
    state.post_service.update(&caller, &slug, input).await?;
    Ok(no_content())
}

async fn delete(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<StatusCode> {
    state.post_service.delete(&caller, &slug).await?;
    Ok(no_content())
}

/// Store an illustration, resized to the post card width.
async fn upload(
    AuthUser(_uploader): AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    let file = read_image(multipart).await?;
    let name = file
        .file_name
        .ok_or_else(|| AppError::BadRequest("Nom de fichier invalide".to_string()))?;

    let path = state.media_service.upload_post_image(&name, file.data).await?;
    Ok(Json(UploadResponse { path }))
}

async fn illustration(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Response> {
    state
        .media_service
        .post_image(&name)
        .await?
        .map(|bytes| image(&name, bytes))
        .ok_or_else(|| AppError::NotFound("Image introuvable.".to_string()))
}

async fn like(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<StatusCode> {
    state.post_service.like(&caller, &slug).await?;
    Ok(no_content())
}

async fn unlike(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<StatusCode> {
    state.post_service.unlike(&caller, &slug).await?;
    Ok(no_content())
}

async fn comment(
    AuthUser(author): AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(input): Json<CreateCommentInput>,
) -> AppResult<StatusCode> {
    state.comment_service.create(&author, &slug, input).await?;
    Ok(no_content())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/upload", post(upload))
        .route("/images/{name}", get(illustration))
        .route("/{slug}", get(show).put(update).delete(delete))
        .route("/{slug}/like", post(like).delete(unlike))
        .route("/{slug}/comments", post(comment))
}
