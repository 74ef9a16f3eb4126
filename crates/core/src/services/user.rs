//! User service.

use chrono::Utc;
use fedblog_common::{AppError, AppResult};
use fedblog_db::{
    entities::{post, user, user::Permission},
    repositories::{PostRepository, UserRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};

use super::auth::hash_password;
use super::permission::{check_delete_user, check_upgrade, parse_permission};
use super::validation::{validate_biography, validate_email, validate_password, validate_username};

/// A user as shown to other users: no email, password or birthdate.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: String,
    pub username: String,
    pub biography: Option<String>,
    pub pp: Option<String>,
    pub permission: i16,
    pub created_at: chrono::DateTime<chrono::FixedOffset>,
    pub updated_at: Option<chrono::DateTime<chrono::FixedOffset>>,
}

impl From<user::Model> for PublicUser {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            biography: user.biography,
            pp: user.pp,
            permission: user.permission,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Fields a user may change on their own account.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMeInput {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub biography: Option<String>,
}

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    post_repo: PostRepository,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository, post_repo: PostRepository) -> Self {
        Self {
            user_repo,
            post_repo,
        }
    }

    /// Every user, in public form.
    pub async fn list(&self) -> AppResult<Vec<PublicUser>> {
        tracing::info!("Fetching all users");
        let users = self.user_repo.find_all().await?;
        Ok(users.into_iter().map(PublicUser::from).collect())
    }

    /// One user by username, in public form.
    pub async fn get_public(&self, username: &str) -> AppResult<PublicUser> {
        tracing::info!(username = %username, "Fetching user by username");
        self.user_repo
            .find_by_username(username)
            .await?
            .map(PublicUser::from)
            .ok_or_else(|| AppError::NotFound("User not found !".to_string()))
    }

    /// Posts written by a user, newest first.
    pub async fn posts_of(&self, author_id: &str) -> AppResult<Vec<post::Model>> {
        tracing::info!(author_id = %author_id, "Fetching user posts");
        self.post_repo.find_by_author(author_id).await
    }

    /// Delete another account. Administrators only.
    pub async fn delete_user(&self, caller: &user::Model, username: &str) -> AppResult<()> {
        if caller.permission_level() != Permission::Administrator {
            return Err(AppError::Forbidden(
                "Seul un administrateur peut effectuer cette opération.".to_string(),
            ));
        }

        let target = self
            .user_repo
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::UserNotFound(username.to_string()))?;

        check_delete_user(caller.permission_level(), target.permission_level())?;

        self.user_repo.delete(&target.id).await?;
        tracing::info!(username = %target.username, by = %caller.username, "User deleted");
        Ok(())
    }

    /// Change the permission level of another account.
    pub async fn change_permission(
        &self,
        caller: &user::Model,
        username: &str,
        requested: i16,
    ) -> AppResult<()> {
        let requested = parse_permission(requested)?;

        let target = self
            .user_repo
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::UserNotFound(username.to_string()))?;

        check_upgrade(
            caller.permission_level(),
            target.permission_level(),
            requested,
        )?;

        let target = self.user_repo.set_permission(target, requested).await?;
        tracing::info!(
            username = %target.username,
            permission = requested.as_i16(),
            by = %caller.username,
            "Permission changed"
        );
        Ok(())
    }

    /// Apply a partial update to the caller's own account.
    pub async fn update_me(
        &self,
        me: &user::Model,
        input: UpdateMeInput,
    ) -> AppResult<user::Model> {
        if me.is_suspended() {
            return Err(AppError::suspended());
        }

        let mut active: user::ActiveModel = me.clone().into();

        if let Some(email) = input.email.filter(|e| !e.is_empty()) {
            validate_email(&email)?;
            if email != me.email && self.user_repo.find_by_email(&email).await?.is_some() {
                return Err(AppError::Conflict(
                    "Cette adresse email est déjà utilisée.".to_string(),
                ));
            }
            active.email = Set(email);
        }

        if let Some(username) = input.username.filter(|u| !u.is_empty()) {
            validate_username(&username)?;
            let lower = username.to_lowercase();
            if lower != me.username_lower
                && self.user_repo.find_by_username(&username).await?.is_some()
            {
                return Err(AppError::Conflict(
                    "Ce nom d'utilisateur est déjà utilisé.".to_string(),
                ));
            }
            active.username = Set(username);
            active.username_lower = Set(lower);
        }

        if let Some(password) = input.password.filter(|p| !p.is_empty()) {
            validate_password(&password)?;
            active.password = Set(hash_password(&password)?);
        }

        if let Some(biography) = input.biography {
            validate_biography(&biography)?;
            active.biography = Set(Some(biography).filter(|b| !b.is_empty()));
        }

        active.updated_at = Set(Some(Utc::now().into()));
        self.user_repo.update(active).await
    }

    /// Delete the caller's own account. Administrators cannot.
    pub async fn delete_me(&self, me: &user::Model) -> AppResult<()> {
        if me.permission_level() == Permission::Administrator {
            return Err(AppError::Forbidden(
                "Vous êtes un administrateur, votre compte ne peut pas être supprimé !"
                    .to_string(),
            ));
        }

        self.user_repo.delete(&me.id).await?;
        tracing::info!(username = %me.username, "Account deleted by its owner");
        Ok(())
    }

    /// Set or clear the avatar URL of a user.
    pub async fn set_avatar(&self, me: &user::Model, pp: Option<String>) -> AppResult<user::Model> {
        let mut active: user::ActiveModel = me.clone().into();
        active.pp = Set(pp);
        active.updated_at = Set(Some(Utc::now().into()));
        self.user_repo.update(active).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn test_user(id: &str, username: &str, permission: Permission) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            username_lower: username.to_lowercase(),
            email: format!("{}@blog.example", username.to_lowercase()),
            password: String::new(),
            birthdate: None,
            biography: None,
            pp: None,
            permission: permission.as_i16(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn service(db: MockDatabase) -> UserService {
        let conn = Arc::new(db.into_connection());
        UserService::new(UserRepository::new(conn.clone()), PostRepository::new(conn))
    }

    fn deleted() -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }
    }

    #[tokio::test]
    async fn test_get_public_not_found() {
        let users = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()]),
        );

        let err = users.get_public("ghost").await.unwrap_err();
        assert_eq!(err.public_message(), "User not found !");
    }

    #[tokio::test]
    async fn test_public_user_hides_private_fields() {
        let public = PublicUser::from(test_user("user1", "alice", Permission::User));
        let json = serde_json::to_value(&public).unwrap();
        assert!(json.get("email").is_none());
        assert!(json.get("password").is_none());
        assert!(json.get("birthdate").is_none());
        assert_eq!(json["username"], "alice");
    }

    #[tokio::test]
    async fn test_change_permission_unknown_target() {
        let admin = test_user("admin", "admin", Permission::Administrator);
        let users = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()]),
        );

        let err = users.change_permission(&admin, "ghost", 1).await.unwrap_err();
        assert_eq!(err.public_message(), "L'utilisateur demandé est introuvable.");
    }

    #[tokio::test]
    async fn test_redactor_cannot_promote_to_administrator() {
        let redactor = test_user("red", "redac", Permission::Redactor);
        let target = test_user("user1", "alice", Permission::User);
        let users = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[target]]),
        );

        let err = users
            .change_permission(&redactor, "alice", Permission::Administrator.as_i16())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_redactor_promotes_to_redactor() {
        let redactor = test_user("red", "redac", Permission::Redactor);
        let target = test_user("user1", "alice", Permission::User);
        let mut promoted = target.clone();
        promoted.permission = Permission::Redactor.as_i16();

        let users = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[target]])
                .append_query_results([[promoted]]),
        );

        assert!(users.change_permission(&redactor, "alice", 1).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_user_requires_administrator() {
        let redactor = test_user("red", "redac", Permission::Redactor);
        let users = service(MockDatabase::new(DatabaseBackend::Postgres));

        let err = users.delete_user(&redactor, "alice").await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_delete_user_refuses_administrator_target() {
        let admin = test_user("admin", "admin", Permission::Administrator);
        let other = test_user("admin2", "other", Permission::Administrator);
        let users = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[other]]),
        );

        let err = users.delete_user(&admin, "other").await.unwrap_err();
        assert_eq!(
            err.public_message(),
            "Vous ne pouvez pas supprimer un administrateur / modérateur !"
        );
    }

    #[tokio::test]
    async fn test_delete_user() {
        let admin = test_user("admin", "admin", Permission::Administrator);
        let target = test_user("user1", "alice", Permission::User);
        let users = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[target]])
                .append_exec_results([deleted()]),
        );

        assert!(users.delete_user(&admin, "alice").await.is_ok());
    }

    #[tokio::test]
    async fn test_update_me_suspended() {
        let me = test_user("user1", "alice", Permission::Suspended);
        let users = service(MockDatabase::new(DatabaseBackend::Postgres));

        let err = users.update_me(&me, UpdateMeInput::default()).await.unwrap_err();
        assert_eq!(
            err.public_message(),
            "Votre compte est suspendu ! Vous ne pouvez pas faire ça."
        );
    }

    #[tokio::test]
    async fn test_update_me_rejects_long_username_without_querying() {
        let me = test_user("user1", "alice", Permission::User);
        let users = service(MockDatabase::new(DatabaseBackend::Postgres));

        let input = UpdateMeInput {
            username: Some("averyverylongname".to_string()),
            ..Default::default()
        };
        let err = users.update_me(&me, input).await.unwrap_err();
        assert_eq!(
            err.public_message(),
            "Le nom d'utilisateur doit faire moins de 12 caractères."
        );
    }

    #[tokio::test]
    async fn test_update_me_biography() {
        let me = test_user("user1", "alice", Permission::User);
        let mut updated = me.clone();
        updated.biography = Some("Bonjour".to_string());

        let users = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[updated]]),
        );

        let input = UpdateMeInput {
            biography: Some("Bonjour".to_string()),
            ..Default::default()
        };
        let result = users.update_me(&me, input).await.unwrap();
        assert_eq!(result.biography.as_deref(), Some("Bonjour"));
    }

    #[tokio::test]
    async fn test_delete_me_refuses_administrator() {
        let admin = test_user("admin", "admin", Permission::Administrator);
        let users = service(MockDatabase::new(DatabaseBackend::Postgres));

        assert!(users.delete_me(&admin).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_me() {
        let me = test_user("user1", "alice", Permission::User);
        let users = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([deleted()]),
        );

        assert!(users.delete_me(&me).await.is_ok());
    }
}
