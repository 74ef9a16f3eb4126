//! Database entities.

pub mod access_token;
pub mod comment;
pub mod like;
pub mod post;
pub mod user;

pub use access_token::Entity as AccessToken;
pub use comment::Entity as Comment;
pub use like::Entity as Like;
pub use post::Entity as Post;
pub use user::Entity as User;
