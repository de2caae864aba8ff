mod auth;
mod posts;

pub use auth::{login, signup};
pub use posts::{cluster, create_post, search};
