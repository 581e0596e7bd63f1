//! tandem HTTP API server.
//!
//! Wires the repositories and services into an axum router, with
//! authentication and path-policy enforcement applied as middleware ahead
//! of every route.

mod auth;
mod error;
mod handlers;
mod services;

use std::time::Duration;

use axum::http::HeaderValue;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use tower_http::{
    cors::{self, AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use uuid::Uuid;

use tandem_db::Database;

use crate::auth::JwtState;
use crate::services::{EventService, ProfileService, ProjectService};

/// Generates time-ordered UUIDv7 request correlation IDs.
///
/// UUIDv7 embeds a Unix timestamp, so IDs sort chronologically — useful for
/// log correlation and debugging production incidents.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: JwtState,
    pub profiles: ProfileService,
    pub events: EventService,
    pub projects: ProjectService,
}

fn parse_cors_origins(raw: &str) -> Vec<HeaderValue> {
    raw.split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_ANSI    - "true"/"false" override ANSI colors
    //   RUST_LOG    - standard env filter (default: "tandem_api=debug,tower_http=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tandem_api=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);
    if log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        let mut layer = tracing_subscriber::fmt::layer();
        if let Some(ansi) = log_ansi {
            layer = layer.with_ansi(ansi);
        }
        registry.with(layer).init();
    }

    info!(log_format = %log_format, "Logging initialized");

    // Get configuration from environment
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "postgres://localhost/tandem".to_string());
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .unwrap_or(3000);
    let jwt_secret = std::env::var("JWT_SECRET")
        .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?;

    // Connect to database
    info!("Connecting to database...");
    let db = Database::connect(&database_url).await?;
    info!("Database connected");

    // Run pending database migrations on startup
    info!("Running database migrations...");
    db.migrate().await?;
    info!("Database migrations complete");

    // Reap expired sessions periodically
    let session_db = db.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(3600));
        loop {
            interval.tick().await;
            if let Err(e) = session_db.sessions.purge_expired().await {
                warn!("Session purge failed: {}", e);
            }
        }
    });

    // Create app state
    let state = AppState {
        profiles: ProfileService::new(db.clone()),
        events: EventService::new(db.clone()),
        projects: ProjectService::new(db.clone()),
        jwt: JwtState::from_secret(&jwt_secret),
        db,
    };

    // CORS: explicit origin list from the environment, otherwise open
    let cors_origins = std::env::var("CORS_ALLOWED_ORIGINS").unwrap_or_default();
    let cors = if cors_origins.trim().is_empty() || cors_origins.trim() == "*" {
        CorsLayer::new()
            .allow_origin(cors::Any)
            .allow_methods(cors::Any)
            .allow_headers(cors::Any)
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(parse_cors_origins(&cors_origins)))
            .allow_methods(cors::Any)
            .allow_headers(cors::Any)
    };

    // Build router
    let app = Router::new()
        // Health check
        .route("/health", get(health_check))
        // Session teardown (browser path)
        .route("/logout", post(auth::logout))
        // Security probes
        .route("/api/security/profile", get(handlers::security::profile))
        .route("/api/security/user", get(handlers::security::user_area))
        .route("/api/security/admin", get(handlers::security::admin_area))
        .route("/api/security/root", get(handlers::security::root_area))
        // User profiles
        .route(
            "/api/user-profiles",
            get(handlers::profiles::list).post(handlers::profiles::create),
        )
        .route(
            "/api/user-profiles/recommendations",
            get(handlers::profiles::recommendations),
        )
        .route("/api/user-profiles/search", post(handlers::profiles::search))
        .route(
            "/api/user-profiles/:id",
            get(handlers::profiles::get_by_id)
                .put(handlers::profiles::update)
                .delete(handlers::profiles::delete),
        )
        .route(
            "/api/user-profiles/:id/star",
            post(handlers::profiles::star).delete(handlers::profiles::unstar),
        )
        // Events
        .route(
            "/api/events",
            get(handlers::events::list).post(handlers::events::create),
        )
        .route(
            "/api/events/recommendations",
            get(handlers::events::recommendations),
        )
        .route("/api/events/search", post(handlers::events::search))
        .route(
            "/api/events/:id",
            get(handlers::events::get_by_id)
                .put(handlers::events::update)
                .delete(handlers::events::delete),
        )
        .route(
            "/api/events/:id/participants",
            post(handlers::events::join).delete(handlers::events::leave),
        )
        .route(
            "/api/events/:id/like",
            post(handlers::events::like).delete(handlers::events::unlike),
        )
        // Projects
        .route(
            "/api/projects",
            get(handlers::projects::list).post(handlers::projects::create),
        )
        .route(
            "/api/projects/recommendations",
            get(handlers::projects::recommendations),
        )
        .route("/api/projects/search", post(handlers::projects::search))
        .route(
            "/api/projects/:id",
            get(handlers::projects::get_by_id)
                .put(handlers::projects::update)
                .delete(handlers::projects::delete),
        )
        .route(
            "/api/projects/:id/participants",
            post(handlers::projects::join).delete(handlers::projects::leave),
        )
        .route(
            "/api/projects/:id/invitation-code",
            put(handlers::projects::rotate_invitation_code),
        )
        .route("/api/projects/:id/like", post(handlers::projects::like))
        .route("/api/projects/:id/unlike", delete(handlers::projects::unlike))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::authenticate,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(cors)
        // JSON payloads only; nothing legitimate comes close to this
        .layer(RequestBodyLimitLayer::new(2 * 1024 * 1024)) // 2 MB
        .with_state(state);

    // Start server
    let addr = format!("{}:{}", host, port);
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "tandem-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cors_origins() {
        let origins = parse_cors_origins("http://localhost:5173, https://tandem.example.com");
        assert_eq!(origins.len(), 2);
        assert_eq!(origins[0], "http://localhost:5173");

        assert!(parse_cors_origins("").is_empty());
        assert!(parse_cors_origins(" , ,").is_empty());
    }
}
