pub mod auth;
pub mod notify;
pub mod post;

pub use auth::*;
