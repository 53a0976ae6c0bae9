//! Records returned by the posts and users API.

pub mod post;
pub mod user;

pub use post::*;
pub use user::*;
