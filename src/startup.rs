use std::path::PathBuf;

use anyhow::Context;
use axum::{
    extract::Request,
    middleware,
    routing::{get, post},
    serve::Serve,
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::info_span;
use uuid::Uuid;

use crate::{
    authentication::require_authentication,
    configuration::Settings,
    database::{create_connection_pool, run_migrations, DatabaseConnectionPool},
    routes,
};

#[derive(Clone)]
pub struct ApplicationState {
    pub database_pool: DatabaseConnectionPool,
    pub base_url: String,
    pub media_root: PathBuf,
}

pub struct Application {
    port: u16,
    pool: DatabaseConnectionPool,
    server: Serve<Router, Router>,
}

impl Application {
    pub async fn build(configuration: Settings) -> Result<Self, anyhow::Error> {
        let pool = create_connection_pool(&configuration.database)?;
        run_migrations(&pool).await?;

        let media_root = configuration.application.media_root.clone();
        tokio::fs::create_dir_all(&media_root)
            .await
            .context("Could not create the media directory.")?;

        let listener = TcpListener::bind(configuration.application.address())
            .await
            .context("Could not bind the listener.")?;
        let port = listener.local_addr()?.port();
        tracing::info!("Listening on port {}.", port);

        let state = ApplicationState {
            database_pool: pool.clone(),
            base_url: configuration.application.base_url,
            media_root,
        };
        let server = run(listener, state);
        Ok(Self { port, pool, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn pool(&self) -> DatabaseConnectionPool {
        self.pool.clone()
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn router(state: ApplicationState) -> Router {
    let protected = Router::new()
        .route("/api/auth/token/logout", post(routes::logout))
        .route("/api/users/me", get(routes::current_user))
        .route("/api/users/set_password", post(routes::set_password))
        .route("/api/users/subscriptions", get(routes::subscriptions_list))
        .route(
            "/api/users/:id/subscribe",
            post(routes::subscribe).delete(routes::unsubscribe),
        )
        .route(
            "/api/recipes/download_shopping_cart",
            get(routes::download_shopping_cart),
        )
        .route(
            "/api/recipes/:id/favorite",
            post(routes::favorite_add).delete(routes::favorite_remove),
        )
        .route(
            "/api/recipes/:id/shopping_cart",
            post(routes::cart_add).delete(routes::cart_remove),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_authentication,
        ));

    // Handlers here that need a user take the `CurrentUser` extractor.
    let public = Router::new()
        .route("/health_check", get(routes::health_check))
        .route("/api/auth/token/login", post(routes::login))
        .route(
            "/api/users",
            get(routes::users_list).post(routes::register_user),
        )
        .route(
            "/api/users/:id",
            get(routes::user_detail).delete(routes::remove_user),
        )
        .route("/api/tags", get(routes::tags_list))
        .route("/api/tags/:id", get(routes::tag_detail))
        .route("/api/ingredients", get(routes::ingredients_list))
        .route("/api/ingredients/:id", get(routes::ingredient_detail))
        .route(
            "/api/recipes",
            get(routes::recipe_list).post(routes::recipe_create),
        )
        .route(
            "/api/recipes/:id",
            get(routes::recipe_detail)
                .patch(routes::recipe_update)
                .delete(routes::recipe_delete),
        );

    Router::new()
        .merge(public)
        .merge(protected)
        .nest_service("/media", ServeDir::new(&state.media_root))
        .layer(ServiceBuilder::new().layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let request_id = Uuid::now_v7();
                info_span!(
                    "Http Request",
                    %request_id,
                    method = %request.method(),
                    request_uri = %request.uri()
                )
            }),
        ))
        .with_state(state)
}

pub fn run(
    listener: TcpListener,
    state: ApplicationState,
) -> Serve<Router, Router> {
    axum::serve(listener, router(state))
}
