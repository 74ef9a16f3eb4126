//! Access token entity (opaque bearer tokens).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "access_token")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Token owner
    #[sea_orm(indexed)]
    pub user_id: String,

    /// SHA-256 of the bearer secret; the secret itself is never stored
    #[sea_orm(unique)]
    #[serde(skip_serializing, default)]
    pub token_hash: String,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub last_used_at: Option<DateTimeWithTimeZone>,

    #[sea_orm(nullable)]
    pub expires_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
