pub mod like;
pub mod post;
pub mod saved_post;
pub mod user;

pub use like::Entity as Like;
pub use post::{Entity as Post, Model as PostModel};
pub use saved_post::Entity as SavedPost;
pub use user::{Entity as User, Model as UserModel};
