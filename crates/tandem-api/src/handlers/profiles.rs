//! `/api/user-profiles` handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;

use tandem_core::models::UserProfileRequest;
use tandem_core::search::UserProfileSearchRequest;

use crate::auth::RequireAuth;
use crate::error::ApiError;
use crate::AppState;

pub async fn create(
    State(state): State<AppState>,
    auth: RequireAuth,
    Json(request): Json<UserProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.profiles.create(&auth.principal, &request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn recommendations(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.profiles.recommendations(&auth.principal).await?;
    Ok(Json(response))
}

pub async fn list(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.profiles.list(auth.principal.user_uuid()?).await?;
    Ok(Json(response))
}

pub async fn search(
    State(state): State<AppState>,
    auth: RequireAuth,
    Json(request): Json<UserProfileSearchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state
        .profiles
        .search(&request, auth.principal.user_uuid()?)
        .await?;
    Ok(Json(response))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state
        .profiles
        .get(id, auth.principal.user_uuid()?)
        .await?;
    Ok(Json(response))
}

pub async fn update(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
    Json(request): Json<UserProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state
        .profiles
        .update(id, &request, auth.principal.user_uuid()?)
        .await?;
    Ok(Json(response))
}

pub async fn delete(
    State(state): State<AppState>,
    _auth: RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.profiles.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn star(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.profiles.star(id, &auth.principal).await?;
    Ok(Json(response))
}

pub async fn unstar(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.profiles.unstar(id, &auth.principal).await?;
    Ok(Json(response))
}
