//! `/api/projects` handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use tandem_core::models::ProjectRequest;
use tandem_core::search::ProjectSearchRequest;

use crate::auth::RequireAuth;
use crate::error::ApiError;
use crate::handlers::ParticipantFilterParams;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct JoinParams {
    pub invitation_code: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    auth: RequireAuth,
    Json(request): Json<ProjectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.projects.create(&auth.principal, &request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn recommendations(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.projects.recommendations(&auth.principal).await?;
    Ok(Json(response))
}

pub async fn list(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.projects.list(auth.principal.user_uuid()?).await?;
    Ok(Json(response))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<i64>,
    Query(params): Query<ParticipantFilterParams>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state
        .projects
        .get(id, &params.into(), auth.principal.user_uuid()?)
        .await?;
    Ok(Json(response))
}

pub async fn update(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<i64>,
    Json(request): Json<ProjectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state
        .projects
        .update(id, &request, auth.principal.user_uuid()?)
        .await?;
    Ok(Json(response))
}

pub async fn delete(
    State(state): State<AppState>,
    _auth: RequireAuth,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.projects.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn search(
    State(state): State<AppState>,
    auth: RequireAuth,
    Json(request): Json<ProjectSearchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.projects.search(&request, &auth.principal).await?;
    Ok(Json(response))
}

pub async fn join(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<i64>,
    Query(params): Query<JoinParams>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state
        .projects
        .join(id, params.invitation_code.as_deref(), &auth.principal)
        .await?;
    Ok(Json(response))
}

pub async fn leave(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.projects.leave(id, &auth.principal).await?;
    Ok(Json(response))
}

pub async fn rotate_invitation_code(
    State(state): State<AppState>,
    _auth: RequireAuth,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let code = state.projects.rotate_invitation_code(id).await?;
    Ok(code)
}

pub async fn like(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.projects.like(id, &auth.principal).await?;
    Ok(Json(response))
}

pub async fn unlike(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.projects.unlike(id, &auth.principal).await?;
    Ok(Json(response))
}
