//! Registration, login and bearer token authentication.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Duration, Utc};
use fedblog_common::{AppError, AppResult, IdGenerator, hash_token};
use fedblog_db::{
    entities::{access_token, user, user::Permission},
    repositories::{AccessTokenRepository, UserRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};

use super::validation::{validate_email, validate_password, validate_username};

/// Lifetime of a freshly issued access token.
pub const TOKEN_LIFETIME_DAYS: i64 = 30;

/// Input for creating an account.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub birthdate: Option<chrono::NaiveDate>,
}

/// Input for logging in.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// A bearer token returned to the client once, at login.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    #[serde(rename = "type")]
    pub token_type: &'static str,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// The user behind a valid bearer token.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub user: user::Model,
    pub token_id: String,
}

/// Authentication service.
#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    token_repo: AccessTokenRepository,
    id_gen: IdGenerator,
}

impl AuthService {
    /// Create a new auth service.
    #[must_use]
    pub const fn new(user_repo: UserRepository, token_repo: AccessTokenRepository) -> Self {
        Self {
            user_repo,
            token_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a regular account.
    pub async fn register(&self, input: RegisterInput) -> AppResult<user::Model> {
        let user = self.create_account(input, Permission::User).await?;
        tracing::info!(username = %user.username, "A user has been created");
        Ok(user)
    }

    /// Create an administrator account.
    ///
    /// Open while the instance has no administrator; afterwards only an
    /// administrator may create another one.
    pub async fn create_admin(
        &self,
        caller: Option<&user::Model>,
        input: RegisterInput,
    ) -> AppResult<user::Model> {
        let caller_is_admin =
            caller.is_some_and(|u| u.permission_level() == Permission::Administrator);

        if !caller_is_admin && self.user_repo.has_administrator().await? {
            return Err(AppError::Forbidden(
                "Seul un administrateur peut effectuer cette opération.".to_string(),
            ));
        }

        let user = self.create_account(input, Permission::Administrator).await?;
        tracing::info!(username = %user.username, "An administrator has been created");
        Ok(user)
    }

    async fn create_account(
        &self,
        input: RegisterInput,
        permission: Permission,
    ) -> AppResult<user::Model> {
        validate_username(&input.username)?;
        validate_email(&input.email)?;
        validate_password(&input.password)?;

        if self
            .user_repo
            .find_by_username(&input.username)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "Ce nom d'utilisateur est déjà utilisé.".to_string(),
            ));
        }
        if self.user_repo.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::Conflict(
                "Cette adresse email est déjà utilisée.".to_string(),
            ));
        }

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username_lower: Set(input.username.to_lowercase()),
            username: Set(input.username),
            email: Set(input.email),
            password: Set(hash_password(&input.password)?),
            birthdate: Set(input.birthdate),
            biography: Set(None),
            pp: Set(None),
            permission: Set(permission.as_i16()),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        self.user_repo.create(model).await
    }

    /// Check credentials and issue a new bearer token.
    pub async fn login(&self, input: LoginInput) -> AppResult<IssuedToken> {
        tracing::debug!("Login attempt");

        let invalid = || AppError::Unauthorized("Identifiants invalides.".to_string());

        let user = self
            .user_repo
            .find_by_email(&input.email)
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(&input.password, &user.password)? {
            return Err(invalid());
        }

        let token = self.id_gen.generate_token();
        let now = Utc::now();
        let expires_at = now + Duration::days(TOKEN_LIFETIME_DAYS);

        self.token_repo
            .create(access_token::ActiveModel {
                id: Set(self.id_gen.generate()),
                user_id: Set(user.id.clone()),
                token_hash: Set(hash_token(&token)),
                created_at: Set(now.into()),
                last_used_at: Set(None),
                expires_at: Set(Some(expires_at.into())),
            })
            .await?;

        tracing::info!(username = %user.username, "User logged in");

        Ok(IssuedToken {
            token_type: "bearer",
            token,
            expires_at,
        })
    }

    /// Revoke the token used for the current request.
    pub async fn logout(&self, auth: &Authenticated) -> AppResult<()> {
        self.token_repo.delete(&auth.token_id).await?;
        tracing::info!(username = %auth.user.username, "User logged out");
        Ok(())
    }

    /// Resolve a bearer token to its user.
    ///
    /// Unknown and expired tokens yield `None`; expired ones are removed.
    pub async fn authenticate(&self, token: &str) -> AppResult<Option<Authenticated>> {
        let Some(stored) = self.token_repo.find_by_hash(&hash_token(token)).await? else {
            return Ok(None);
        };

        if stored.expires_at.is_some_and(|at| at < Utc::now()) {
            self.token_repo.delete(&stored.id).await?;
            return Ok(None);
        }

        let Some(user) = self.user_repo.find_by_id(&stored.user_id).await? else {
            return Ok(None);
        };

        self.token_repo.touch(&stored.id).await?;

        Ok(Some(Authenticated {
            user,
            token_id: stored.id,
        }))
    }
}

/// Hash a password with Argon2id.
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn test_user(id: &str, username: &str, password: &str, permission: Permission) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            username_lower: username.to_lowercase(),
            email: format!("{}@blog.example", username.to_lowercase()),
            password: hash_password(password).unwrap(),
            birthdate: None,
            biography: None,
            pp: None,
            permission: permission.as_i16(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn test_token(expires_at: Option<DateTime<Utc>>) -> access_token::Model {
        access_token::Model {
            id: "tok1".to_string(),
            user_id: "user1".to_string(),
            token_hash: hash_token("oat_secret"),
            created_at: Utc::now().into(),
            last_used_at: None,
            expires_at: expires_at.map(Into::into),
        }
    }

    fn service(db: MockDatabase) -> AuthService {
        let conn = Arc::new(db.into_connection());
        AuthService::new(
            UserRepository::new(conn.clone()),
            AccessTokenRepository::new(conn),
        )
    }

    fn register_input(username: &str) -> RegisterInput {
        RegisterInput {
            username: username.to_string(),
            email: format!("{username}@blog.example"),
            password: "secret123".to_string(),
            birthdate: None,
        }
    }

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("secret123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("secret123", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_username_before_querying() {
        let auth = service(MockDatabase::new(DatabaseBackend::Postgres));
        let result = auth.register(register_input("abc")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_register_duplicate_username_conflicts() {
        let existing = test_user("user1", "alice", "secret123", Permission::User);
        let auth = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[existing]]),
        );

        let result = auth.register(register_input("alice")).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_register_creates_user() {
        let created = test_user("user1", "alice", "secret123", Permission::User);
        let auth = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new(), Vec::new()])
                .append_query_results([[created]]),
        );

        let user = auth.register(register_input("alice")).await.unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.permission_level(), Permission::User);
    }

    #[tokio::test]
    async fn test_create_admin_forbidden_once_an_admin_exists() {
        let auth = service(MockDatabase::new(DatabaseBackend::Postgres).append_query_results([
            [maplit::btreemap! { "num_items" => sea_orm::Value::BigInt(Some(1)) }],
        ]));

        let result = auth.create_admin(None, register_input("bobby")).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_login_wrong_password_is_unauthorized() {
        let user = test_user("user1", "alice", "secret123", Permission::User);
        let auth = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[user]]),
        );

        let result = auth
            .login(LoginInput {
                email: "alice@blog.example".to_string(),
                password: "nope".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_login_issues_prefixed_token() {
        let user = test_user("user1", "alice", "secret123", Permission::User);
        let auth = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .append_query_results([[test_token(None)]]),
        );

        let issued = auth
            .login(LoginInput {
                email: "alice@blog.example".to_string(),
                password: "secret123".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(issued.token_type, "bearer");
        assert!(issued.token.starts_with("oat_"));
        assert!(issued.expires_at > Utc::now());
    }

    #[tokio::test]
    async fn test_authenticate_unknown_token() {
        let auth = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<access_token::Model>::new()]),
        );

        assert!(auth.authenticate("oat_unknown").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_authenticate_expired_token_is_removed() {
        let expired = test_token(Some(Utc::now() - Duration::hours(1)));
        let auth = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[expired]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }]),
        );

        assert!(auth.authenticate("oat_secret").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_authenticate_valid_token() {
        let user = test_user("user1", "alice", "secret123", Permission::User);
        let auth = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_token(None)]])
                .append_query_results([[user]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }]),
        );

        let found = auth.authenticate("oat_secret").await.unwrap().unwrap();
        assert_eq!(found.user.id, "user1");
        assert_eq!(found.token_id, "tok1");
    }
}
