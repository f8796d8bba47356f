// ABOUTME: Main entry point for the quizvault account and game history service
// ABOUTME: Sets up tracing, the key-value store, routes, and the HTTP server

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod account;
mod error;
mod games;
mod password;
mod store;
mod types;

use error::AppError;
use store::{SqliteStore, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserStore>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quizvault=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite:quizvault.db?mode=rwc".to_string());
    let kv = SqliteStore::new(&database_url).await?;

    let app_state = AppState {
        users: Arc::new(UserStore::new(Arc::new(kv))),
    };

    let app = router(app_state);

    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Server running on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/auth/register",
            post(account::register).fallback(method_not_allowed),
        )
        .route(
            "/api/auth/login",
            post(account::login).fallback(method_not_allowed),
        )
        .route(
            "/api/games/save",
            post(games::record_game).fallback(method_not_allowed),
        )
        .route(
            "/api/games/history",
            get(games::get_history).fallback(method_not_allowed),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// Wrong verb on a known path still gets a JSON error body
async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
