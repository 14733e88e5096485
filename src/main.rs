use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use atelier::api::{build_router, AppState};
use atelier::config::Config;
use atelier::db::repositories::{
    SqlxArticleRepository, SqlxCreatorRepository, SqlxSessionRepository, SqlxUserRepository,
};
use atelier::db::{create_pool, run_migrations};
use atelier::services::{ArticleService, CreatorService, Mailer, SessionService, UserService};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("atelier=info,tower_http=debug")),
        )
        .init();

    let config = Config::load(Path::new("config.yml"))?;

    let pool = create_pool(&config.database).await?;
    run_migrations(&pool).await?;
    info!(database = %config.database.url, "Database ready");

    let article_repo = SqlxArticleRepository::boxed(pool.clone());
    let creator_repo = SqlxCreatorRepository::boxed(pool.clone());
    let user_repo = SqlxUserRepository::boxed(pool.clone());
    let session_repo = SqlxSessionRepository::boxed(pool);

    let session_service = SessionService::new(session_repo);
    let state = AppState {
        article_service: ArticleService::new(article_repo, creator_repo.clone()),
        creator_service: CreatorService::new(creator_repo, session_service.clone()),
        user_service: UserService::new(user_repo, session_service.clone()),
        session_service,
        upload_config: config.upload.clone(),
        mailer: Mailer::new(config.mail.clone())?,
    };

    let app = build_router(state, &config.server);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid bind address")?;
    info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
