//! Database repositories.

mod access_token;
mod comment;
mod like;
mod post;
mod user;

pub use access_token::AccessTokenRepository;
pub use comment::{CommentRepository, CommentWithAuthor};
pub use like::LikeRepository;
pub use post::{PostRepository, PostWithAuthor};
pub use user::UserRepository;
