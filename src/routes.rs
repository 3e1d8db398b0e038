mod api_error;
mod auth_token;
mod catalogue;
mod health_check;
mod recipe_lists;
mod recipes;
mod shopping_cart;
mod subscriptions;
mod users;

pub use api_error::*;
pub use auth_token::*;
pub use catalogue::*;
pub use health_check::*;
pub use recipe_lists::*;
pub use recipes::*;
pub use shopping_cart::*;
pub use subscriptions::*;
pub use users::*;
