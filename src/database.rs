use anyhow::{anyhow, Context};
use diesel_async::async_connection_wrapper::AsyncConnectionWrapper;
use diesel_async::pooled_connection::deadpool::{Pool, PoolError};
use diesel_async::{pooled_connection::deadpool::Object, AsyncPgConnection};
use diesel_migrations::{
    embed_migrations, EmbeddedMigrations, MigrationHarness,
};

use crate::telemetry::spawn_blocking_with_tracing;

pub mod diesel_configuration;
pub mod queries;

pub type DatabaseConnection = Object<AsyncPgConnection>;
pub type DatabaseConnectionPool = Pool<AsyncPgConnection>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

#[tracing::instrument(
    name = "Retrieving database connection from pool.",
    skip(pool)
)]
pub async fn get_connection(
    pool: &DatabaseConnectionPool,
) -> Result<DatabaseConnection, PoolError> {
    match pool.get().await {
        Ok(conn) => {
            tracing::debug!("Connection established.");
            Ok(conn)
        }
        Err(e) => {
            tracing::error!(
                "Could not get connection from pool, with error: {:?}",
                e
            );
            Err(e)
        }
    }
}

#[tracing::instrument(name = "Running pending migrations.", skip(pool))]
pub async fn run_migrations(
    pool: &DatabaseConnectionPool,
) -> Result<(), anyhow::Error> {
    let connection = get_connection(pool)
        .await
        .context("Could not get connection for migrations.")?;
    let mut wrapper: AsyncConnectionWrapper<AsyncPgConnection> =
        AsyncConnectionWrapper::from(Object::<AsyncPgConnection>::take(connection));
    spawn_blocking_with_tracing(move || {
        wrapper
            .run_pending_migrations(MIGRATIONS)
            .map(|applied| {
                tracing::info!("Applied {} migration(s).", applied.len());
            })
            .map_err(|e| anyhow!("Failed to run migrations: {}", e))
    })
    .await
    .context("Migration task panicked.")?
}

pub use diesel_configuration::create_connection_pool;
