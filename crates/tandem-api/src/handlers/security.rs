//! `/api/security` handlers.
//!
//! The role-gated endpoints carry no logic of their own; the policy
//! middleware has already rejected callers lacking the required role by the
//! time these run.

use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::auth::RequireAuth;
use crate::error::ApiError;

/// Echo the canonical identity the middleware resolved for this request.
pub async fn profile(auth: RequireAuth) -> Result<impl IntoResponse, ApiError> {
    let p = &auth.principal;
    Ok(Json(json!({
        "user_id": p.user_id,
        "username": p.username,
        "email": p.email,
        "full_name": p.full_name,
        "roles": p.roles,
    })))
}

pub async fn user_area() -> &'static str {
    "user content"
}

pub async fn admin_area() -> &'static str {
    "admin content"
}

pub async fn root_area() -> &'static str {
    "root content"
}
