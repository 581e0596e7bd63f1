//! `/api/events` handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use tandem_core::models::EventRequest;
use tandem_core::search::EventSearchRequest;

use crate::auth::RequireAuth;
use crate::error::ApiError;
use crate::handlers::ParticipantFilterParams;
use crate::AppState;

pub async fn create(
    State(state): State<AppState>,
    auth: RequireAuth,
    Json(request): Json<EventRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.events.create(&auth.principal, &request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn recommendations(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.events.recommendations(&auth.principal).await?;
    Ok(Json(response))
}

pub async fn list(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.events.list(auth.principal.user_uuid()?).await?;
    Ok(Json(response))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<i64>,
    Query(params): Query<ParticipantFilterParams>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state
        .events
        .get(id, &params.into(), auth.principal.user_uuid()?)
        .await?;
    Ok(Json(response))
}

pub async fn update(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<i64>,
    Json(request): Json<EventRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state
        .events
        .update(id, &request, auth.principal.user_uuid()?)
        .await?;
    Ok(Json(response))
}

pub async fn delete(
    State(state): State<AppState>,
    _auth: RequireAuth,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.events.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn search(
    State(state): State<AppState>,
    auth: RequireAuth,
    Json(request): Json<EventSearchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.events.search(&request, &auth.principal).await?;
    Ok(Json(response))
}

pub async fn join(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.events.join(id, &auth.principal).await?;
    Ok(Json(response))
}

pub async fn leave(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.events.leave(id, &auth.principal).await?;
    Ok(Json(response))
}

pub async fn like(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.events.like(id, &auth.principal).await?;
    Ok(Json(response))
}

pub async fn unlike(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.events.unlike(id, &auth.principal).await?;
    Ok(Json(response))
}
