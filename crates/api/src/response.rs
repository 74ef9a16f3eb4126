//! API response types.
//!
//! Views decide which columns leave the server: post listings never carry
//! the post body, and authors are reduced to what a byline needs.

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, FixedOffset};
use fedblog_core::{PageMeta, Paginated, PostDetail};
use fedblog_db::entities::{comment, post, user};
use serde::Serialize;

/// Author as shown next to posts and comments.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorSummary {
    pub id: String,
    pub username: String,
    pub pp: Option<String>,
    pub permission: i16,
}

impl From<user::Model> for AuthorSummary {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            pp: user.pp,
            permission: user.permission,
        }
    }
}

/// Post in a listing: everything but the body.
#[derive(Debug, Clone, Serialize)]
pub struct PostSummary {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub image: Option<String>,
    pub tag: Option<String>,
    pub comment_count: i32,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: Option<DateTime<FixedOffset>>,
    pub author: Option<AuthorSummary>,
}

impl PostSummary {
    /// Build a listing entry.
    #[must_use]
    pub fn new(post: post::Model, author: Option<user::Model>) -> Self {
        Self {
            id: post.id,
            title: post.title,
            slug: post.slug,
            description: post.description,
            image: post.image,
            tag: post.tag,
            comment_count: post.comment_count,
            created_at: post.created_at,
            updated_at: post.updated_at,
            author: author.map(AuthorSummary::from),
        }
    }
}

/// Comment with its author.
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: String,
    pub post_id: String,
    pub content: String,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: Option<DateTime<FixedOffset>>,
    pub author: Option<AuthorSummary>,
}

impl CommentView {
    #[must_use]
    pub fn new(comment: comment::Model, author: Option<user::Model>) -> Self {
        Self {
            id: comment.id,
            post_id: comment.post_id,
            content: comment.content,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
            author: author.map(AuthorSummary::from),
        }
    }
}

/// Full post page.
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub summary: PostSummary,
    pub content: String,
    pub comments: Vec<CommentView>,
}

impl From<PostDetail> for PostView {
    fn from(detail: PostDetail) -> Self {
        let content = detail.post.content.clone();
        Self {
            summary: PostSummary::new(detail.post, detail.author),
            content,
            comments: detail
                .comments
                .into_iter()
                .map(|(comment, author)| CommentView::new(comment, author))
                .collect(),
        }
    }
}

/// Paginated listing: `{"meta": {...}, "data": [...]}`.
#[derive(Debug, Serialize)]
pub struct PageResponse<T: Serialize> {
    pub meta: PageMeta,
    pub data: Vec<T>,
}

impl<T: Serialize> From<Paginated<T>> for PageResponse<T> {
    fn from(page: Paginated<T>) -> Self {
        Self {
            meta: page.meta(),
            data: page.items,
        }
    }
}

impl<T: Serialize> IntoResponse for PageResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// `{"message": ...}` body.
#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

/// Empty success response.
#[must_use]
pub fn no_content() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Raw image bytes with a content type guessed from the file name.
#[must_use]
pub fn image(name: &str, bytes: Vec<u8>) -> Response {
    ([(header::CONTENT_TYPE, image_content_type(name))], bytes).into_response()
}

/// Content type of an image file, by extension.
#[must_use]
pub fn image_content_type(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}
