//! Field rules shared by registration and profile updates.

use std::sync::LazyLock;

use fedblog_common::{AppError, AppResult};
use regex::Regex;

/// Maximum biography length, in characters.
pub const BIOGRAPHY_MAX_LEN: usize = 200;

/// Allowed comment length, in characters.
pub const COMMENT_LEN: std::ops::RangeInclusive<usize> = 1..=1000;

#[allow(clippy::unwrap_used)]
static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9_]{2,}$").unwrap());

#[allow(clippy::unwrap_used)]
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,253}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,253}[a-zA-Z0-9])?)*$",
    )
    .unwrap()
});

/// Check a username.
///
/// Four characters and pattern mismatches share the generic message; only
/// the clearly too short and too long cases get their own.
pub fn validate_username(username: &str) -> AppResult<()> {
    let len = username.chars().count();

    if len <= 3 {
        return Err(AppError::Validation(
            "Le nom d'utilisateur doit faire plus de 4 caractères.".to_string(),
        ));
    }
    if len >= 12 {
        return Err(AppError::Validation(
            "Le nom d'utilisateur doit faire moins de 12 caractères.".to_string(),
        ));
    }
    if len >= 5 && USERNAME_RE.is_match(username) {
        return Ok(());
    }

    Err(AppError::Validation(
        "Le nom d'utilisateur n'est pas valide.".to_string(),
    ))
}

/// Check an email address.
pub fn validate_email(email: &str) -> AppResult<()> {
    if EMAIL_RE.is_match(email) {
        Ok(())
    } else {
        Err(AppError::Validation(
            "L'adresse email n'est pas valide.".to_string(),
        ))
    }
}

/// Check a new password (more than five characters).
pub fn validate_password(password: &str) -> AppResult<()> {
    if password.chars().count() > 5 {
        Ok(())
    } else {
        Err(AppError::Validation(
            "Le mot de passe doit faire plus de 5 caractères.".to_string(),
        ))
    }
}

/// Check a biography.
pub fn validate_biography(biography: &str) -> AppResult<()> {
    if biography.chars().count() <= BIOGRAPHY_MAX_LEN {
        Ok(())
    } else {
        Err(AppError::Validation(
            "La biographie ne peut excéder 200 caractères.".to_string(),
        ))
    }
}

/// Check the body of a comment.
pub fn validate_comment(content: &str) -> AppResult<()> {
    if COMMENT_LEN.contains(&content.trim().chars().count()) {
        Ok(())
    } else {
        Err(AppError::Validation(
            "Le commentaire doit contenir entre 1 et 1000 caractères.".to_string(),
        ))
    }
}
