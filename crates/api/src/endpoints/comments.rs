//! Comment endpoints.

use axum::{
    Router,
    extract::{Path, Query, State},
    routing::get,
};
use fedblog_common::AppResult;
use serde::Deserialize;

use crate::{
    middleware::AppState,
    response::{CommentView, PageResponse},
};

#[derive(Debug, Deserialize)]
pub struct CommentsQuery {
    pub page: Option<u64>,
}

/// Comments of a post, newest first.
async fn list(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Query(query): Query<CommentsQuery>,
) -> AppResult<PageResponse<CommentView>> {
    let page = state.comment_service.list(&post_id, query.page).await?;
    Ok(PageResponse::from(
        page.map(|(comment, author)| CommentView::new(comment, author)),
    ))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/{post_id}", get(list))
}
