//! Business logic services.

#![allow(missing_docs)]

pub mod auth;
pub mod comment;
pub mod media;
pub mod pagination;
pub mod permission;
pub mod post;
pub mod user;
pub mod validation;

pub use auth::{AuthService, Authenticated, IssuedToken, LoginInput, RegisterInput};
pub use comment::{COMMENTS_PER_PAGE, CommentService, CreateCommentInput};
pub use media::{AvatarUpload, MediaService};
pub use pagination::{PageMeta, Paginated};
pub use post::{
    CreatePostInput, ListPostsQuery, PostDetail, PostListing, PostService, UpdatePostInput,
};
pub use user::{PublicUser, UpdateMeInput, UserService};
