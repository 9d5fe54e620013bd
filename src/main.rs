mod config;
mod csrf;
mod db;
mod entities;
mod error;
mod forms;
mod routes;
mod store;
mod templates;
mod tmdb;

use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use tower_http::trace::TraceLayer;

use crate::{config::Config, store::MovieStore, tmdb::TmdbClient};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: MovieStore,
    pub tmdb: Arc<TmdbClient>,
    pub cookie_key: Key,
}

impl AppState {
    pub fn new(config: Config, store: MovieStore, http: reqwest::Client) -> Self {
        let tmdb = TmdbClient::new(
            http,
            config.tmdb_access_token.clone(),
            config.tmdb_base_url.clone(),
            config.tmdb_rps,
        );
        let cookie_key = csrf::key_from_secret(&config.secret_key);
        Self { config: Arc::new(config), store, tmdb: Arc::new(tmdb), cookie_key }
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,reelrank=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Config::from_env()?;
    let addr = config.addr;

    let http = reqwest::Client::builder().user_agent("reelrank/0.1").build()?;

    let db = if config.migrate_on_start {
        db::connect_and_migrate(&config.database_url).await?
    } else {
        db::connect(&config.database_url).await?
    };

    let state = AppState::new(config, MovieStore::new(db), http);

    let app = routes::router(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
