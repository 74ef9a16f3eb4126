//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account permission level.
///
/// Levels are totally ordered: `Suspended < User < Redactor < Administrator`.
/// The numeric value is what the `permission` column stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum Permission {
    /// Suspended account: read-only.
    Suspended,
    /// Regular account.
    User,
    /// Moderator / editor.
    Redactor,
    /// Full administrator.
    Administrator,
}

impl Permission {
    /// Column value for this level.
    #[must_use]
    pub const fn as_i16(self) -> i16 {
        match self {
            Self::Suspended => -1,
            Self::User => 0,
            Self::Redactor => 1,
            Self::Administrator => 2,
        }
    }
}

impl TryFrom<i16> for Permission {
    type Error = String;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Self::Suspended),
            0 => Ok(Self::User),
            1 => Ok(Self::Redactor),
            2 => Ok(Self::Administrator),
            other => Err(format!("unknown permission level {other}")),
        }
    }
}

impl From<Permission> for i16 {
    fn from(value: Permission) -> Self {
        value.as_i16()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub username: String,

    pub username_lower: String,

    #[sea_orm(unique)]
    pub email: String,

    /// Argon2 password hash
    #[serde(skip_serializing, default)]
    pub password: String,

    #[sea_orm(nullable)]
    pub birthdate: Option<Date>,

    /// Profile biography (at most 200 characters)
    #[sea_orm(column_type = "Text", nullable)]
    pub biography: Option<String>,

    /// Public avatar URL
    #[sea_orm(nullable)]
    pub pp: Option<String>,

    /// See [`Permission`]
    #[sea_orm(default_value = 0)]
    pub permission: i16,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Permission level of this user.
    ///
    /// Unknown column values are treated as suspended.
    #[must_use]
    pub fn permission_level(&self) -> Permission {
        Permission::try_from(self.permission).unwrap_or(Permission::Suspended)
    }

    /// Whether this account is suspended.
    #[must_use]
    pub fn is_suspended(&self) -> bool {
        self.permission_level() == Permission::Suspended
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::post::Entity")]
    Posts,

    #[sea_orm(has_many = "super::comment::Entity")]
    Comments,

    #[sea_orm(has_many = "super::like::Entity")]
    Likes,

    #[sea_orm(has_many = "super::access_token::Entity")]
    AccessTokens,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Posts.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl Related<super::like::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Likes.def()
    }
}

impl Related<super::access_token::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AccessTokens.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
