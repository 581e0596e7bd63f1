//! Authentication middleware and extractors.
//!
//! Credentials are resolved once per request, before routing-level policy
//! runs: a `Bearer` JWT takes precedence, otherwise the session cookie is
//! looked up in the session store. Whichever path succeeds, the resulting
//! claims go through [`tandem_core::identity::extract`] and the canonical
//! [`Principal`] is stashed in request extensions for handlers to pull out.
//!
//! An invalid credential is a hard 401 even on paths the policy leaves
//! public; absence of a credential is not.

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use tracing::debug;

use tandem_core::identity::{extract, CredentialClaims, Principal, TokenClaims};
use tandem_core::{policy, Error, Result};

use crate::error::ApiError;
use crate::AppState;

/// Name of the session cookie set by the OIDC login callback.
pub const SESSION_COOKIE: &str = "TANDEM_SESSION";

/// Verifier for bearer JWTs issued by the identity provider.
#[derive(Clone)]
pub struct JwtState {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtState {
    pub fn from_secret(secret: &str) -> Self {
        let validation = Validation::new(Algorithm::HS256);
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Verify signature and expiry, returning the raw token claims.
    pub fn decode_claims(&self, token: &str) -> Result<TokenClaims> {
        decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| Error::IdentityExtraction(format!("invalid bearer token: {e}")))
    }
}

/// Pull the session cookie value out of the Cookie header, if present.
fn session_cookie(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

/// Resolve the request's credential, if any, into a [`Principal`].
async fn resolve_principal(state: &AppState, headers: &HeaderMap) -> Result<Option<Principal>> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    if let Some(token) = bearer {
        let claims = state.jwt.decode_claims(token.trim())?;
        let principal = extract(CredentialClaims::BearerToken(claims))?;
        debug!(
            auth_path = "bearer",
            user_id = %principal.user_id,
            "Authenticated via bearer token"
        );
        return Ok(Some(principal));
    }

    if let Some(session_id) = session_cookie(headers) {
        if let Some(claims) = state.db.sessions.get(&session_id).await? {
            let principal = extract(CredentialClaims::OidcSession(claims))?;
            debug!(
                auth_path = "session",
                user_id = %principal.user_id,
                "Authenticated via session"
            );
            return Ok(Some(principal));
        }
    }

    Ok(None)
}

/// Middleware: authenticate the request and enforce the path policy.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> std::result::Result<Response, ApiError> {
    let principal = resolve_principal(&state, request.headers()).await?;
    policy::authorize(request.uri().path(), principal.as_ref())?;
    if let Some(principal) = principal {
        request.extensions_mut().insert(principal);
    }
    Ok(next.run(request).await)
}

/// Delete the caller's session row, if any, and expire the cookie. Bearer
/// clients simply stop presenting their token; this only concerns the
/// browser path.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> std::result::Result<Response, ApiError> {
    if let Some(session_id) = session_cookie(&headers) {
        state.db.sessions.delete(&session_id).await?;
        debug!(auth_path = "session", "Session terminated");
    }
    let mut response = StatusCode::NO_CONTENT.into_response();
    response.headers_mut().insert(
        header::SET_COOKIE,
        HeaderValue::from_static("TANDEM_SESSION=; Path=/; Max-Age=0; HttpOnly"),
    );
    Ok(response)
}

/// Extractor that requires an authenticated principal.
#[derive(Debug, Clone)]
pub struct RequireAuth {
    pub principal: Principal,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let principal = parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;
        Ok(RequireAuth { principal })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde::Serialize;

    #[derive(Serialize)]
    struct TestClaims<'a> {
        sub: &'a str,
        preferred_username: &'a str,
        scope: &'a str,
        spring_sec_roles: Vec<&'a str>,
        exp: i64,
    }

    fn signed_token(secret: &str, exp: i64) -> String {
        let claims = TestClaims {
            sub: "5f0e8f60-3f9f-4a1e-b0a1-2d8f6f1c9a11",
            preferred_username: "ada",
            scope: "profile",
            spring_sec_roles: vec!["ROLE_USER"],
            exp,
        };
        jsonwebtoken::encode(
            &jsonwebtoken::Header::new(Algorithm::HS256),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn far_future() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    #[test]
    fn test_decode_valid_token() {
        let jwt = JwtState::from_secret("test-secret");
        let token = signed_token("test-secret", far_future());
        let claims = jwt.decode_claims(&token).unwrap();
        assert_eq!(
            claims.sub.as_deref(),
            Some("5f0e8f60-3f9f-4a1e-b0a1-2d8f6f1c9a11")
        );
        assert_eq!(claims.roles, vec!["ROLE_USER".to_string()]);
    }

    #[test]
    fn test_decode_rejects_wrong_secret() {
        let jwt = JwtState::from_secret("test-secret");
        let token = signed_token("other-secret", far_future());
        let err = jwt.decode_claims(&token).unwrap_err();
        assert!(matches!(err, Error::IdentityExtraction(_)));
    }

    #[test]
    fn test_decode_rejects_expired_token() {
        let jwt = JwtState::from_secret("test-secret");
        let token = signed_token("test-secret", chrono::Utc::now().timestamp() - 3600);
        assert!(jwt.decode_claims(&token).is_err());
    }

    #[test]
    fn test_session_cookie_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("other=1; TANDEM_SESSION=abc123; theme=dark"),
        );
        assert_eq!(session_cookie(&headers).as_deref(), Some("abc123"));

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("other=1"));
        assert_eq!(session_cookie(&headers), None);

        assert_eq!(session_cookie(&HeaderMap::new()), None);
    }

    #[test]
    fn test_logout_clears_the_session_cookie_by_name() {
        // The expiring Set-Cookie literal must target the cookie the
        // middleware reads.
        let expiring = "TANDEM_SESSION=; Path=/; Max-Age=0; HttpOnly";
        assert!(expiring.starts_with(SESSION_COOKIE));
    }
}
