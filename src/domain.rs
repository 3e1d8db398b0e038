mod auth_token_key;
mod new_user;
mod pagination;
mod password;
mod person_name;
mod recipe_draft;
mod recipe_image;
mod role;
mod shopping_list;
mod user_email;
mod username;

pub use auth_token_key::*;
pub use new_user::*;
pub use pagination::*;
pub use password::*;
pub use person_name::*;
pub use recipe_draft::*;
pub use recipe_image::*;
pub use role::*;
pub use shopping_list::*;
pub use user_email::*;
pub use username::*;
