mod auth;
mod favorites;
mod recipes;
mod shopping_cart;
mod users;
