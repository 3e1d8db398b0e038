use crate::configuration::{DatabaseSettings, PgSslMode};
use crate::database::DatabaseConnectionPool;
use diesel::{ConnectionError, ConnectionResult};
use diesel_async::pooled_connection::deadpool::Pool;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::ManagerConfig;
use diesel_async::AsyncPgConnection;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use secrecy::ExposeSecret;

pub fn create_connection_pool(
    settings: &DatabaseSettings,
) -> Result<DatabaseConnectionPool, anyhow::Error> {
    let url = settings.connection_string();
    let connection_manager = match settings.require_ssl {
        PgSslMode::Require => {
            let mut config = ManagerConfig::default();
            config.custom_setup = Box::new(establish_tls_connection);
            AsyncDieselConnectionManager::<AsyncPgConnection>::new_with_config(
                url.expose_secret(),
                config,
            )
        }
        PgSslMode::Prefer => AsyncDieselConnectionManager::<
            AsyncPgConnection,
        >::new(url.expose_secret()),
    };
    Ok(Pool::builder(connection_manager).build()?)
}

pub fn establish_tls_connection(
    config: &str,
) -> BoxFuture<ConnectionResult<AsyncPgConnection>> {
    let future = async {
        let rustls_config = rustls::ClientConfig::builder()
            .with_root_certificates(root_certificates()?)
            .with_no_client_auth();
        let tls = tokio_postgres_rustls::MakeRustlsConnect::new(rustls_config);
        let (client, conn) = tokio_postgres::connect(config, tls)
            .await
            .map_err(|e| ConnectionError::BadConnection(e.to_string()))?;
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::error!("Database Connection: {e}");
            }
        });
        AsyncPgConnection::try_from(client).await
    };
    future.boxed()
}

fn root_certificates() -> ConnectionResult<rustls::RootCertStore> {
    let mut roots = rustls::RootCertStore::empty();
    let certs = rustls_native_certs::load_native_certs()
        .map_err(|e| ConnectionError::BadConnection(e.to_string()))?;
    for cert in certs {
        roots
            .add(cert)
            .map_err(|e| ConnectionError::BadConnection(e.to_string()))?;
    }
    Ok(roots)
}
