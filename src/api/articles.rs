//! Article routes
//!
//! Reads are public; writes require a creator session. Create and update
//! accept multipart forms because of the photo attachment.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::json;

use crate::api::common::ApiError;
use crate::api::middleware::{require_creator, AuthenticatedCreator};
use crate::api::upload::read_article_form;
use crate::api::AppState;
use crate::models::{FilterCriteria, SearchCriteria};

pub fn router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/", axum::routing::post(create_article))
        .route(
            "/{id}",
            axum::routing::patch(update_article).delete(delete_article),
        )
        .layer(middleware::from_fn_with_state(state, require_creator));

    Router::new()
        .route("/", get(list_articles))
        .route("/search", get(search_articles))
        .route("/filter", get(filter_articles))
        .route("/{id}", get(get_article))
        .merge(protected)
}

/// Historical contract: an empty catalog answers 404, not an empty list.
async fn list_articles(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let articles = state.article_service.list().await?;
    if articles.is_empty() {
        return Err(ApiError::not_found("No articles found"));
    }
    Ok(Json(articles))
}

async fn search_articles(
    State(state): State<AppState>,
    Query(criteria): Query<SearchCriteria>,
) -> Result<impl IntoResponse, ApiError> {
    let articles = state.article_service.search(&criteria).await?;
    Ok(Json(articles))
}

async fn filter_articles(
    State(state): State<AppState>,
    Query(criteria): Query<FilterCriteria>,
) -> Result<impl IntoResponse, ApiError> {
    let articles = state.article_service.filter(&criteria).await?;
    Ok(Json(articles))
}

async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let (article, creator) = state.article_service.get_with_creator(id).await?;
    Ok(Json(json!({ "article": article, "creator": creator })))
}

async fn create_article(
    State(state): State<AppState>,
    Extension(AuthenticatedCreator(creator_id)): Extension<AuthenticatedCreator>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = read_article_form(multipart, &state.upload_config).await?;
    let article = state
        .article_service
        .create(&form.fields, form.photo_path, creator_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Article created", "status": 201, "article": article })),
    ))
}

async fn update_article(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(AuthenticatedCreator(creator_id)): Extension<AuthenticatedCreator>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = read_article_form(multipart, &state.upload_config).await?;
    let article = state
        .article_service
        .update(id, creator_id, &form.fields, form.photo_path)
        .await?;

    Ok(Json(json!({ "message": "Article updated", "status": 200, "article": article })))
}

async fn delete_article(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(AuthenticatedCreator(creator_id)): Extension<AuthenticatedCreator>,
) -> Result<impl IntoResponse, ApiError> {
    state.article_service.delete(id, creator_id).await?;
    Ok(Json(json!({ "message": "Article deleted", "status": 200 })))
}
