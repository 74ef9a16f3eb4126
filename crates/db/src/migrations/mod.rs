//! Database migrations.
//!
//! Posts were created before they had an author, and profile fields and the
//! comment counter came later; the add-column migrations keep that history.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250101_000001_create_user_table;
mod m20250101_000002_create_access_token_table;
mod m20250101_000003_create_post_table;
mod m20250101_000004_add_author_id_to_post;
mod m20250101_000005_create_comment_table;
mod m20250101_000006_create_like_table;
mod m20250101_000007_add_profile_fields_to_user;
mod m20250101_000008_add_comment_count_to_post;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_user_table::Migration),
            Box::new(m20250101_000002_create_access_token_table::Migration),
            Box::new(m20250101_000003_create_post_table::Migration),
            Box::new(m20250101_000004_add_author_id_to_post::Migration),
            Box::new(m20250101_000005_create_comment_table::Migration),
            Box::new(m20250101_000006_create_like_table::Migration),
            Box::new(m20250101_000007_add_profile_fields_to_user::Migration),
            Box::new(m20250101_000008_add_comment_count_to_post::Migration),
        ]
    }
}
