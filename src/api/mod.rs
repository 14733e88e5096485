//! HTTP API
//!
//! Route modules, shared application state, and the top-level router.

pub mod articles;
pub mod common;
pub mod creators;
pub mod middleware;
pub mod upload;
pub mod users;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::config::{ServerConfig, UploadConfig};
use crate::services::{ArticleService, CreatorService, Mailer, SessionService, UserService};

/// Shared application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    pub article_service: ArticleService,
    pub creator_service: CreatorService,
    pub user_service: UserService,
    pub session_service: SessionService,
    pub upload_config: UploadConfig,
    pub mailer: Mailer,
}

/// Build the full application router.
pub fn build_router(state: AppState, server: &ServerConfig) -> Router {
    let cors = match server.cors_origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
            ])
            .allow_headers([AUTHORIZATION, CONTENT_TYPE]),
        Err(_) => {
            warn!(origin = %server.cors_origin, "Invalid CORS origin, allowing none");
            CorsLayer::new()
        }
    };

    Router::new()
        .nest("/articles", articles::router(state.clone()))
        .nest("/creators", creators::router(state.clone()))
        .nest("/users", users::router(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
