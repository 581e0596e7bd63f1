//! OIDC session store.
//!
//! Sessions map an opaque cookie value to the claims captured at login.
//! Expired rows are treated as absent on read and reaped opportunistically
//! by [`purge_expired`](PgSessionRepository::purge_expired).

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

use tandem_core::identity::SessionClaims;
use tandem_core::{Error, Result};

#[derive(Debug, Clone)]
pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Store (or refresh) the claims behind a session id.
    pub async fn put(
        &self,
        session_id: &str,
        claims: &SessionClaims,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let claims_json = serde_json::to_value(claims).map_err(Error::from)?;
        sqlx::query(
            r#"
            INSERT INTO sessions (id, claims, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET claims = EXCLUDED.claims,
                                           expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(session_id)
        .bind(claims_json)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Look up a live session. Expired or unknown ids both yield `None`.
    pub async fn get(&self, session_id: &str) -> Result<Option<SessionClaims>> {
        let row: Option<(serde_json::Value,)> = sqlx::query_as(
            "SELECT claims FROM sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some((claims,)) => {
                let claims: SessionClaims = serde_json::from_value(claims).map_err(Error::from)?;
                Ok(Some(claims))
            }
            None => Ok(None),
        }
    }

    pub async fn delete(&self, session_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Remove expired rows; returns how many were reaped.
    pub async fn purge_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;
        let purged = result.rows_affected();
        if purged > 0 {
            debug!(
                subsystem = "db",
                op = "purge_sessions",
                purged,
                "Reaped expired sessions"
            );
        }
        Ok(purged)
    }
}
