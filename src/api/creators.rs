//! Creator account routes
//!
//! Registration and login are public; profile listings expose only the
//! reduced public view. Update and delete require the acting creator to
//! be the account owner, as established by their session token.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::{delete, get, patch, post};
use axum::{Extension, Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::api::common::ApiError;
use crate::api::middleware::{bearer_token, require_creator, AuthenticatedCreator};
use crate::api::AppState;
use crate::models::{CreatorPatch, CreatorProfile, RegisterCreator};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteAccountRequest {
    pub password: String,
}

pub fn router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/{id}", patch(update_creator))
        .route("/{id}", delete(delete_creator))
        .layer(middleware::from_fn_with_state(state, require_creator));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/all", get(list_creators))
        .route("/{id}", get(get_creator))
        .merge(protected)
}

async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterCreator>,
) -> Result<impl IntoResponse, ApiError> {
    let creator = state.creator_service.register(&input).await?;

    state
        .mailer
        .send_welcome_detached(creator.email.clone(), creator.first_name.clone());

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Account created", "status": 201, "creator": creator })),
    ))
}

async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (creator, session) = state
        .creator_service
        .login(&input.email, &input.password)
        .await?;

    Ok(Json(json!({
        "message": "Logged in",
        "status": 200,
        "creator": creator,
        "access_token": session.token,
    })))
}

/// Revoke the presented token. Unknown tokens get the same answer.
async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(token) = bearer_token(&headers) {
        state
            .session_service
            .revoke(token)
            .await
            .map_err(ApiError::internal)?;
    }
    Ok(Json(json!({ "message": "Logged out", "status": 200 })))
}

async fn list_creators(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let creators = state.creator_service.list().await?;
    let profiles: Vec<CreatorProfile> = creators.iter().map(CreatorProfile::from).collect();
    Ok(Json(profiles))
}

async fn get_creator(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let creator = state.creator_service.get(id).await?;
    Ok(Json(CreatorProfile::from(&creator)))
}

async fn update_creator(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(AuthenticatedCreator(acting_id)): Extension<AuthenticatedCreator>,
    Json(patch): Json<CreatorPatch>,
) -> Result<impl IntoResponse, ApiError> {
    if id != acting_id {
        return Err(ApiError::unauthorized("Cannot modify another account"));
    }

    let creator = state.creator_service.update(id, &patch).await?;
    Ok(Json(json!({ "message": "Account updated", "status": 200, "creator": creator })))
}

async fn delete_creator(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(AuthenticatedCreator(acting_id)): Extension<AuthenticatedCreator>,
    Json(input): Json<DeleteAccountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if id != acting_id {
        return Err(ApiError::unauthorized("Cannot delete another account"));
    }

    state.creator_service.delete(id, &input.password).await?;
    Ok(Json(json!({ "message": "Account deleted", "status": 200 })))
}
