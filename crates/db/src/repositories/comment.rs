//! Comment repository.

use std::sync::Arc;

use crate::entities::{Comment, User, comment, user};
use fedblog_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

/// A comment together with its author.
pub type CommentWithAuthor = (comment::Model, Option<user::Model>);

/// Comment repository for database operations.
#[derive(Clone)]
pub struct CommentRepository {
    db: Arc<DatabaseConnection>,
}

impl CommentRepository {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create a new comment.
    pub async fn create(&self, model: comment::ActiveModel) -> AppResult<comment::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// The `limit` newest comments of a post, with authors.
    pub async fn find_latest_for_post(
        &self,
        post_id: &str,
        limit: u64,
    ) -> AppResult<Vec<CommentWithAuthor>> {
        Comment::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_desc(comment::Column::CreatedAt)
            .limit(limit)
            .find_also_related(User)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// One page of comments of a post, newest first.
    ///
    /// `page` is 1-based. Returns the page and the total number of comments.
    pub async fn paginate_for_post(
        &self,
        post_id: &str,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<CommentWithAuthor>, u64)> {
        let paginator = Comment::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_desc(comment::Column::CreatedAt)
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
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::user::Permission;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_comment(id: &str) -> comment::Model {
        comment::Model {
            id: id.to_string(),
            post_id: "post1".to_string(),
            author_id: "user1".to_string(),
            content: "Super article".to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_author() -> user::Model {
        user::Model {
            id: "user1".to_string(),
            username: "bob".to_string(),
            username_lower: "bob".to_string(),
            email: "bob@blog.example".to_string(),
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
    async fn test_create() {
        let comment = create_test_comment("c1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[comment.clone()]])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        let active: comment::ActiveModel = comment.into();
        let created = repo.create(active).await.unwrap();

        assert_eq!(created.content, "Super article");
    }

    #[tokio::test]
    async fn test_find_latest_for_post() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    (create_test_comment("c2"), create_test_author()),
                    (create_test_comment("c1"), create_test_author()),
                ]])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        let comments = repo.find_latest_for_post("post1", 20).await.unwrap();

        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].0.id, "c2");
        assert_eq!(comments[0].1.as_ref().unwrap().username, "bob");
    }

    #[tokio::test]
    async fn test_paginate_for_post_empty() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(0))
                }]])
                .append_query_results([Vec::<(comment::Model, user::Model)>::new()])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        let (items, total) = repo.paginate_for_post("post1", 1, 20).await.unwrap();

        assert_eq!(total, 0);
        assert!(items.is_empty());
    }
}
