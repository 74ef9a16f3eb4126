//! Post service.

use std::collections::HashSet;

use chrono::Utc;
use fedblog_common::{AppError, AppResult, IdGenerator};
use fedblog_db::{
    entities::{like, post, user},
    repositories::{
        CommentRepository, CommentWithAuthor, LikeRepository, PostRepository, PostWithAuthor,
    },
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use super::pagination::{Paginated, checked_page};

/// Number of comments embedded in a single post view.
pub const POST_COMMENT_PREVIEW: u64 = 20;

/// Query parameters of the post listing.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ListPostsQuery {
    #[validate(range(min = 1, max = 100, message = "La limite doit être comprise entre 1 et 100."))]
    pub limit: Option<u64>,
    #[validate(range(max = 100_000, message = "La page demandée n'est pas valide."))]
    pub page: Option<u64>,
    /// Author id to filter on.
    pub users: Option<String>,
}

/// Result of a post listing.
#[derive(Debug, Clone)]
pub enum PostListing {
    /// Plain list, possibly truncated by `limit`.
    All(Vec<PostWithAuthor>),
    /// `limit` and `page` were both given.
    Page(Paginated<PostWithAuthor>),
}

/// A post with everything shown on its page.
#[derive(Debug, Clone)]
pub struct PostDetail {
    pub post: post::Model,
    pub author: Option<user::Model>,
    pub comments: Vec<CommentWithAuthor>,
    pub has_liked: bool,
}

/// Input for creating a post.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePostInput {
    #[validate(length(min = 1, max = 255, message = "Le titre doit faire entre 1 et 255 caractères."))]
    pub title: String,

    #[validate(length(min = 1, message = "La description est obligatoire."))]
    pub description: String,

    #[validate(length(min = 1, message = "Le contenu est obligatoire."))]
    pub content: String,

    pub image: Option<String>,

    #[validate(length(max = 64, message = "Le tag ne peut excéder 64 caractères."))]
    pub tag: Option<String>,
}

/// Partial update of a post.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdatePostInput {
    #[validate(length(min = 1, max = 255, message = "Le titre doit faire entre 1 et 255 caractères."))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub image: Option<String>,
    #[validate(length(max = 64, message = "Le tag ne peut excéder 64 caractères."))]
    pub tag: Option<String>,
}

/// Post service for business logic.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    comment_repo: CommentRepository,
    like_repo: LikeRepository,
    id_gen: IdGenerator,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub const fn new(
        post_repo: PostRepository,
        comment_repo: CommentRepository,
        like_repo: LikeRepository,
    ) -> Self {
        Self {
            post_repo,
            comment_repo,
            like_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// List posts, newest first.
    pub async fn list(&self, query: ListPostsQuery) -> AppResult<PostListing> {
        query.validate()?;
        let author = query.users.as_deref().filter(|u| !u.is_empty());

        match (query.limit, query.page) {
            (Some(limit), Some(page)) => {
                let page = checked_page(Some(page))?;
                let (items, total) = self.post_repo.paginate(author, page, limit).await?;
                Ok(PostListing::Page(Paginated::new(items, total, limit, page)))
            }
            (limit, _) => Ok(PostListing::All(
                self.post_repo.find_recent(author, limit).await?,
            )),
        }
    }

    /// A post with its author, latest comments and the viewer's like.
    pub async fn get(&self, slug: &str, viewer: Option<&user::Model>) -> AppResult<PostDetail> {
        let (post, author) = self
            .post_repo
            .find_by_slug_with_author(slug)
            .await?
            .ok_or_else(|| AppError::PostNotFound(slug.to_string()))?;

        let comments = self
            .comment_repo
            .find_latest_for_post(&post.id, POST_COMMENT_PREVIEW)
            .await?;

        let has_liked = match viewer {
            Some(viewer) => self.like_repo.exists(&viewer.id, &post.id).await?,
            None => false,
        };

        Ok(PostDetail {
            post,
            author,
            comments,
            has_liked,
        })
    }

    /// Create a post; the slug is derived from the title.
    pub async fn create(
        &self,
        author: &user::Model,
        input: CreatePostInput,
    ) -> AppResult<post::Model> {
        if author.is_suspended() {
            return Err(AppError::suspended());
        }
        input.validate()?;

        let base = slugify(&input.title);
        let taken: HashSet<String> = self
            .post_repo
            .find_slugs_with_prefix(&base)
            .await?
            .into_iter()
            .collect();
        let slug = unique_slug(&base, &taken);

        let model = post::ActiveModel {
            id: Set(self.id_gen.generate()),
            author_id: Set(author.id.clone()),
            title: Set(input.title),
            slug: Set(slug),
            description: Set(input.description),
            content: Set(input.content),
            image: Set(input.image),
            tag: Set(input.tag.filter(|t| !t.is_empty())),
            comment_count: Set(0),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let post = self.post_repo.create(model).await?;
        tracing::info!(slug = %post.slug, author = %author.username, "Post created");
        Ok(post)
    }

    /// Update a post. Only its author may.
    pub async fn update(
        &self,
        caller: &user::Model,
        slug: &str,
        input: UpdatePostInput,
    ) -> AppResult<post::Model> {
        let post = self.post_repo.get_by_slug(slug).await?;

        if post.author_id != caller.id {
            return Err(AppError::Forbidden(
                "Vous n'avez pas la permission de modifier cet article.".to_string(),
            ));
        }
        input.validate()?;

        let mut active: post::ActiveModel = post.into();
        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(content) = input.content {
            active.content = Set(content);
        }
        if let Some(image) = input.image {
            active.image = Set(Some(image));
        }
        if let Some(tag) = input.tag {
            active.tag = Set(Some(tag).filter(|t| !t.is_empty()));
        }
        active.updated_at = Set(Some(Utc::now().into()));

        self.post_repo.update(active).await
    }

    /// Delete a post. Only its author may.
    pub async fn delete(&self, caller: &user::Model, slug: &str) -> AppResult<()> {
        let post = self.post_repo.get_by_slug(slug).await?;

        if post.author_id != caller.id {
            return Err(AppError::Forbidden(
                "Vous n'êtes pas l'auteur de cet article.".to_string(),
            ));
        }

        self.post_repo.delete(&post.id).await?;
        tracing::info!(slug = %slug, "Post deleted");
        Ok(())
    }

    /// Like a post. Liking twice is a no-op.
    pub async fn like(&self, caller: &user::Model, slug: &str) -> AppResult<()> {
        if caller.is_suspended() {
            return Err(AppError::suspended());
        }
        let post = self.post_repo.get_by_slug(slug).await?;

        if self.like_repo.exists(&caller.id, &post.id).await? {
            return Ok(());
        }

        self.like_repo
            .create(like::ActiveModel {
                id: Set(self.id_gen.generate()),
                user_id: Set(caller.id.clone()),
                post_id: Set(post.id),
                created_at: Set(Utc::now().into()),
            })
            .await?;
        Ok(())
    }

    /// Remove a like. Unliking a post that was not liked is a no-op.
    pub async fn unlike(&self, caller: &user::Model, slug: &str) -> AppResult<()> {
        if caller.is_suspended() {
            return Err(AppError::suspended());
        }
        let post = self.post_repo.get_by_slug(slug).await?;
        self.like_repo.delete(&caller.id, &post.id).await?;
        Ok(())
    }
}

/// Turn a title into a URL slug.
///
/// Lowercases, folds French accents, and collapses every run of other
/// characters into a single `-`.
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars().flat_map(char::to_lowercase) {
        let folded = fold_accent(c);
        if folded.chars().all(|f| f.is_ascii_alphanumeric()) && !folded.is_empty() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push_str(folded);
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        "post".to_string()
    } else {
        slug
    }
}

fn fold_accent(c: char) -> &'static str {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => "a",
        'ç' => "c",
        'è' | 'é' | 'ê' | 'ë' => "e",
        'ì' | 'í' | 'î' | 'ï' => "i",
        'ñ' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => "o",
        'ù' | 'ú' | 'û' | 'ü' => "u",
        'ý' | 'ÿ' => "y",
        'æ' => "ae",
        'œ' => "oe",
        'ß' => "ss",
        _ => ascii_str(c),
    }
}

fn ascii_str(c: char) -> &'static str {
    const ALNUM: &str = "abcdefghijklmnopqrstuvwxyz0123456789";
    match ALNUM.find(c) {
        Some(i) => &ALNUM[i..=i],
        None => "",
    }
}

/// First free slug among `base`, `base-1`, `base-2`, ...
#[must_use]
pub fn unique_slug(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    (1u64..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| format!("{base}-{}", taken.len() + 1))
}
