//! User account routes

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::{delete, get, patch, post};
use axum::{Extension, Json, Router};
use serde_json::json;

use crate::api::common::ApiError;
use crate::api::creators::{DeleteAccountRequest, LoginRequest};
use crate::api::middleware::{bearer_token, require_user, AuthenticatedUser};
use crate::api::AppState;
use crate::models::{RegisterUser, UserPatch, UserProfile};

pub fn router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/{id}", patch(update_user))
        .route("/{id}", delete(delete_user))
        .layer(middleware::from_fn_with_state(state, require_user));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/all", get(list_users))
        .route("/{id}", get(get_user))
        .merge(protected)
}

async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterUser>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.user_service.register(&input).await?;

    state
        .mailer
        .send_welcome_detached(user.email.clone(), user.first_name.clone());

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Account created", "status": 201, "user": user })),
    ))
}

async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (user, session) = state
        .user_service
        .login(&input.email, &input.password)
        .await?;

    Ok(Json(json!({
        "message": "Logged in",
        "status": 200,
        "user": user,
        "access_token": session.token,
    })))
}

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

async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let users = state.user_service.list().await?;
    let profiles: Vec<UserProfile> = users.iter().map(UserProfile::from).collect();
    Ok(Json(profiles))
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.user_service.get(id).await?;
    Ok(Json(UserProfile::from(&user)))
}

async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(AuthenticatedUser(acting_id)): Extension<AuthenticatedUser>,
    Json(patch): Json<UserPatch>,
) -> Result<impl IntoResponse, ApiError> {
    if id != acting_id {
        return Err(ApiError::unauthorized("Cannot modify another account"));
    }

    let user = state.user_service.update(id, &patch).await?;
    Ok(Json(json!({ "message": "Account updated", "status": 200, "user": user })))
}

async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(AuthenticatedUser(acting_id)): Extension<AuthenticatedUser>,
    Json(input): Json<DeleteAccountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if id != acting_id {
        return Err(ApiError::unauthorized("Cannot delete another account"));
    }

    state.user_service.delete(id, &input.password).await?;
    Ok(Json(json!({ "message": "Account deleted", "status": 200 })))
}
