//! Access token repository.

use std::sync::Arc;

use crate::entities::{AccessToken, access_token};
use fedblog_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, sea_query::Expr,
};

/// Access token repository for database operations.
#[derive(Clone)]
pub struct AccessTokenRepository {
    db: Arc<DatabaseConnection>,
}

impl AccessTokenRepository {
    /// Create a new access token repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Store a new token.
    pub async fn create(&self, model: access_token::ActiveModel) -> AppResult<access_token::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a token by the hash of its secret.
    pub async fn find_by_hash(&self, token_hash: &str) -> AppResult<Option<access_token::Model>> {
        AccessToken::find()
            .filter(access_token::Column::TokenHash.eq(token_hash))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Record that a token was just used.
    pub async fn touch(&self, id: &str) -> AppResult<()> {
        AccessToken::update_many()
            .col_expr(
                access_token::Column::LastUsedAt,
                Expr::value(chrono::Utc::now().fixed_offset()),
            )
            .filter(access_token::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a token.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        AccessToken::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
