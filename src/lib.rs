pub mod authentication;
pub mod configuration;
pub mod database;
pub mod domain;
pub mod models;
pub mod representations;
pub mod routes;
pub mod schema;
pub mod startup;
pub mod telemetry;
pub mod utils;
