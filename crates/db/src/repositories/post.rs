//! Post repository.

use std::sync::Arc;

use crate::entities::{Post, User, post, user};
use fedblog_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, sea_query::Expr,
};

/// A post together with its author.
pub type PostWithAuthor = (post::Model, Option<user::Model>);

/// Post repository for database operations.
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a post by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<post::Model>> {
        Post::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a post by slug.
    pub async fn find_by_slug(&self, slug: &str) -> AppResult<Option<post::Model>> {
        Post::find()
            .filter(post::Column::Slug.eq(slug))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a post by slug, returning an error if not found.
    pub async fn get_by_slug(&self, slug: &str) -> AppResult<post::Model> {
        self.find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::PostNotFound(slug.to_string()))
    }

    /// Find a post by slug along with its author.
    pub async fn find_by_slug_with_author(&self, slug: &str) -> AppResult<Option<PostWithAuthor>> {
        Post::find()
            .filter(post::Column::Slug.eq(slug))
            .find_also_related(User)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Existing slugs equal to `base` or of the form `{base}-{n}`.
    pub async fn find_slugs_with_prefix(&self, base: &str) -> AppResult<Vec<String>> {
        let posts = Post::find()
            .filter(
                Condition::any()
                    .add(post::Column::Slug.eq(base))
                    .add(post::Column::Slug.starts_with(format!("{base}-"))),
            )
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(posts.into_iter().map(|p| p.slug).collect())
    }

    /// Newest posts with their authors, optionally restricted to one author.
    pub async fn find_recent(
        &self,
        author_id: Option<&str>,
        limit: Option<u64>,
    ) -> AppResult<Vec<PostWithAuthor>> {
        let mut query = Post::find();
        if let Some(author_id) = author_id {
            query = query.filter(post::Column::AuthorId.eq(author_id));
        }

        query
            .order_by_desc(post::Column::CreatedAt)
            .limit(limit)
            .find_also_related(User)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// One page of posts with their authors, newest first.
    ///
    /// `page` is 1-based. Returns the page and the total number of posts.
    pub async fn paginate(
        &self,
        author_id: Option<&str>,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<PostWithAuthor>, u64)> {
        let mut query = Post::find();
        if let Some(author_id) = author_id {
            query = query.filter(post::Column::AuthorId.eq(author_id));
        }

        let paginator = query
            .order_by_desc(post::Column::CreatedAt)
            .find_also_related(User)
            .paginate(self.db.as_ref(), per_page.max(1));

        let total = paginator
            .num_items()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        let items = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((items, total))
    }

    /// All posts of an author, newest first.
    pub async fn find_by_author(&self, author_id: &str) -> AppResult<Vec<post::Model>> {
        Post::find()
            .filter(post::Column::AuthorId.eq(author_id))
            .order_by_desc(post::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new post.
    pub async fn create(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a post.
    pub async fn update(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a post. Comments and likes cascade.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Post::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Count all posts.
    pub async fn count(&self) -> AppResult<u64> {
        Post::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Increment the comment counter atomically (single UPDATE query, no fetch).
    pub async fn increment_comment_count(&self, post_id: &str) -> AppResult<()> {
        Post::update_many()
            .col_expr(
                post::Column::CommentCount,
                Expr::col(post::Column::CommentCount).add(1),
            )
            .filter(post::Column::Id.eq(post_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::user::Permission;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_post(id: &str, slug: &str) -> post::Model {
        post::Model {
            id: id.to_string(),
            author_id: "user1".to_string(),
            title: "Premier post".to_string(),
            slug: slug.to_string(),
            description: "Une description".to_string(),
            content: "Un contenu".to_string(),
            image: None,
            tag: None,
            comment_count: 0,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_author() -> user::Model {
        user::Model {
            id: "user1".to_string(),
            username: "alice".to_string(),
            username_lower: "alice".to_string(),
            email: "alice@blog.example".to_string(),
            password: String::new(),
            birthdate: None,
            biography: None,
            pp: None,
            permission: Permission::User.as_i16(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_get_by_slug_not_found_returns_error() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<post::Model>::new()])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let result = repo.get_by_slug("missing").await;

        assert!(matches!(result, Err(AppError::PostNotFound(_))));
    }

    #[tokio::test]
    async fn test_find_by_slug_with_author() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[(
                    create_test_post("post1", "premier-post"),
                    create_test_author(),
                )]])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let (post, author) = repo
            .find_by_slug_with_author("premier-post")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(post.slug, "premier-post");
        assert_eq!(author.unwrap().username, "alice");
    }

    #[tokio::test]
    async fn test_find_slugs_with_prefix() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_post("post1", "premier-post"),
                    create_test_post("post2", "premier-post-1"),
                ]])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let slugs = repo.find_slugs_with_prefix("premier-post").await.unwrap();

        assert_eq!(slugs, vec!["premier-post", "premier-post-1"]);
    }

    #[tokio::test]
    async fn test_paginate_returns_items_and_total() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(3))
                }]])
                .append_query_results([[(
                    create_test_post("post3", "troisieme"),
                    create_test_author(),
                )]])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let (items, total) = repo.paginate(None, 2, 2).await.unwrap();

        assert_eq!(total, 3);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].0.slug, "troisieme");
    }

    #[tokio::test]
    async fn test_increment_comment_count() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        assert!(repo.increment_comment_count("post1").await.is_ok());
    }
}
