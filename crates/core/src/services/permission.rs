//! Permission rules for moderation actions.

use fedblog_common::{AppError, AppResult};
use fedblog_db::entities::user::Permission;

const MODERATOR_ONLY: &str = "Seul un modérateur peut effectuer cette opération.";
const ADMINISTRATOR_ONLY: &str = "Seul un administrateur peut effectuer cette opération.";

/// Check that `caller` may move a user from `current` to `requested`.
///
/// Redactors manage accounts up to their own level; anything touching an
/// administrator needs an administrator.
pub fn check_upgrade(
    caller: Permission,
    current: Permission,
    requested: Permission,
) -> AppResult<()> {
    if caller < Permission::Redactor {
        return Err(AppError::Forbidden(MODERATOR_ONLY.to_string()));
    }
    if caller < Permission::Administrator
        && (requested > Permission::Redactor || current > Permission::Redactor)
    {
        return Err(AppError::Forbidden(ADMINISTRATOR_ONLY.to_string()));
    }
    Ok(())
}

/// Check that `caller` may delete an account whose level is `target`.
pub fn check_delete_user(caller: Permission, target: Permission) -> AppResult<()> {
    if caller != Permission::Administrator {
        return Err(AppError::Forbidden(ADMINISTRATOR_ONLY.to_string()));
    }
    if target == Permission::Administrator {
        return Err(AppError::Forbidden(
            "Vous ne pouvez pas supprimer un administrateur / modérateur !".to_string(),
        ));
    }
    Ok(())
}

/// Parse a permission level sent by a client.
pub fn parse_permission(value: i16) -> AppResult<Permission> {
    Permission::try_from(value)
        .map_err(|_| AppError::Validation("Niveau de permission invalide.".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use Permission::{Administrator, Redactor, Suspended, User};

    fn message(result: AppResult<()>) -> String {
        result.err().map(|e| e.public_message()).unwrap_or_default()
    }

    #[test]
    fn test_users_and_suspended_are_always_rejected() {
        for caller in [Suspended, User] {
            for requested in [Suspended, User, Redactor, Administrator] {
                assert_eq!(message(check_upgrade(caller, User, requested)), MODERATOR_ONLY);
            }
        }
    }

    #[test]
    fn test_redactor_cannot_grant_above_redactor() {
        assert!(check_upgrade(Redactor, User, Redactor).is_ok());
        assert!(check_upgrade(Redactor, User, Suspended).is_ok());
        assert_eq!(
            message(check_upgrade(Redactor, User, Administrator)),
            ADMINISTRATOR_ONLY
        );
    }

    #[test]
    fn test_redactor_cannot_demote_administrator() {
        assert_eq!(
            message(check_upgrade(Redactor, Administrator, Suspended)),
            ADMINISTRATOR_ONLY
        );
    }

    #[test]
    fn test_administrator_can_do_anything() {
        for current in [Suspended, User, Redactor, Administrator] {
            for requested in [Suspended, User, Redactor, Administrator] {
                assert!(check_upgrade(Administrator, current, requested).is_ok());
            }
        }
    }

    #[test]
    fn test_delete_user_rules() {
        assert!(check_delete_user(Administrator, Redactor).is_ok());
        assert_eq!(
            message(check_delete_user(Redactor, User)),
            ADMINISTRATOR_ONLY
        );
        assert!(check_delete_user(Administrator, Administrator).is_err());
    }

    #[test]
    fn test_parse_permission() {
        assert_eq!(parse_permission(1).ok(), Some(Redactor));
        assert!(parse_permission(3).is_err());
    }
}
