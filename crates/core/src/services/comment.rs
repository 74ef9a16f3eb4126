//! Comment service.

use chrono::Utc;
use fedblog_common::{AppError, AppResult, IdGenerator};
use fedblog_db::{
    entities::{comment, user},
    repositories::{CommentRepository, CommentWithAuthor, PostRepository},
};
use sea_orm::Set;
use serde::Deserialize;

use super::pagination::{Paginated, checked_page};
use super::validation::validate_comment;

/// Comments per page.
pub const COMMENTS_PER_PAGE: u64 = 20;

/// Input for commenting a post.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCommentInput {
    pub content: String,
}

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    post_repo: PostRepository,
    id_gen: IdGenerator,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub const fn new(comment_repo: CommentRepository, post_repo: PostRepository) -> Self {
        Self {
            comment_repo,
            post_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Comments of a post, newest first, twenty per page.
    pub async fn list(
        &self,
        post_id: &str,
        page: Option<u64>,
    ) -> AppResult<Paginated<CommentWithAuthor>> {
        let page = checked_page(page)?;
        if self.post_repo.find_by_id(post_id).await?.is_none() {
            return Err(AppError::PostNotFound(post_id.to_string()));
        }

        let (items, total) = self
            .comment_repo
            .paginate_for_post(post_id, page, COMMENTS_PER_PAGE)
            .await?;

        Ok(Paginated::new(items, total, COMMENTS_PER_PAGE, page))
    }

    /// Comment a post and bump its comment counter.
    pub async fn create(
        &self,
        author: &user::Model,
        slug: &str,
        input: CreateCommentInput,
    ) -> AppResult<comment::Model> {
        if author.is_suspended() {
            return Err(AppError::Forbidden(
                "Votre compte est suspendu ! Vous ne pouvez pas commentez.".to_string(),
            ));
        }

        let post = self.post_repo.get_by_slug(slug).await?;
        validate_comment(&input.content)?;

        let comment = self
            .comment_repo
            .create(comment::ActiveModel {
                id: Set(self.id_gen.generate()),
                post_id: Set(post.id.clone()),
                author_id: Set(author.id.clone()),
                content: Set(input.content),
                created_at: Set(Utc::now().into()),
                updated_at: Set(None),
            })
            .await?;

        self.post_repo.increment_comment_count(&post.id).await?;

        tracing::debug!(post = %post.slug, author = %author.username, "Comment created");
        Ok(comment)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use fedblog_db::entities::{post, user::Permission};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn test_user(permission: Permission) -> user::Model {
        user::Model {
            id: "user1".to_string(),
            username: "alice".to_string(),
            username_lower: "alice".to_string(),
            email: "alice@blog.example".to_string(),
            password: String::new(),
            birthdate: None,
            biography: None,
            pp: None,
            permission: permission.as_i16(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn test_post() -> post::Model {
        post::Model {
            id: "post1".to_string(),
            author_id: "user2".to_string(),
            title: "Titre".to_string(),
            slug: "titre".to_string(),
            description: "Description".to_string(),
            content: "Contenu".to_string(),
            image: None,
            tag: None,
            comment_count: 0,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn service(db: MockDatabase) -> CommentService {
        let conn = Arc::new(db.into_connection());
        CommentService::new(CommentRepository::new(conn.clone()), PostRepository::new(conn))
    }

    #[tokio::test]
    async fn test_suspended_cannot_comment() {
        let comments = service(MockDatabase::new(DatabaseBackend::Postgres));
        let err = comments
            .create(
                &test_user(Permission::Suspended),
                "titre",
                CreateCommentInput {
                    content: "Bravo".to_string(),
                },
            )
            .await
            .unwrap_err();

        assert_eq!(
            err.public_message(),
            "Votre compte est suspendu ! Vous ne pouvez pas commentez."
        );
    }

    #[tokio::test]
    async fn test_comment_on_unknown_post() {
        let comments = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<post::Model>::new()]),
        );

        let result = comments
            .create(
                &test_user(Permission::User),
                "nope",
                CreateCommentInput {
                    content: "Bravo".to_string(),
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::PostNotFound(_))));
    }

    #[tokio::test]
    async fn test_create_increments_counter() {
        let created = comment::Model {
            id: "c1".to_string(),
            post_id: "post1".to_string(),
            author_id: "user1".to_string(),
            content: "Bravo".to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
        };

        let comments = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_post()]])
                .append_query_results([[created]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }]),
        );

        let comment = comments
            .create(
                &test_user(Permission::User),
                "titre",
                CreateCommentInput {
                    content: "Bravo".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(comment.id, "c1");
    }

    #[tokio::test]
    async fn test_list_unknown_post() {
        let comments = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<post::Model>::new()]),
        );

        assert!(comments.list("nope", None).await.is_err());
    }

    #[tokio::test]
    async fn test_list_rejects_out_of_range_page() {
        let comments = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[test_post()]]),
        );

        let err = comments.list("post1", Some(u64::MAX)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(err.public_message(), "La page demandée n'est pas valide.");
    }
}
