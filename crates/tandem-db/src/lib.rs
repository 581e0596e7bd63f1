//! # tandem-db
//!
//! PostgreSQL database layer for tandem.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for profiles, events, projects, and sessions
//! - Parameterized WHERE-clause generation for entity search
//!
//! ## Example
//!
//! ```rust,ignore
//! use tandem_db::Database;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/tandem").await?;
//!     db.migrate().await?;
//!
//!     let profile = db.profiles.get(user_id).await?;
//!     println!("{:?}", profile.skills);
//!     Ok(())
//! }
//! ```

pub mod events;
pub mod pool;
pub mod profiles;
pub mod projects;
pub mod search_filter;
pub mod sessions;

// Re-export core types
pub use tandem_core::*;

/// Escape LIKE/ILIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

// Re-export repository implementations
pub use events::PgEventRepository;
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use profiles::PgUserProfileRepository;
pub use projects::PgProjectRepository;
pub use search_filter::{
    bind_query_as, day_bounds, EventFilterQueryBuilder, FilterResult,
    ProfileFilterQueryBuilder, ProjectFilterQueryBuilder, QueryParam,
};
pub use sessions::PgSessionRepository;

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// User profile repository.
    pub profiles: PgUserProfileRepository,
    /// Event repository.
    pub events: PgEventRepository,
    /// Project repository.
    pub projects: PgProjectRepository,
    /// OIDC session store.
    pub sessions: PgSessionRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            profiles: PgUserProfileRepository::new(pool.clone()),
            events: PgEventRepository::new(pool.clone()),
            projects: PgProjectRepository::new(pool.clone()),
            sessions: PgSessionRepository::new(pool.clone()),
            pool,
        }
    }

    /// Connect with default pool configuration.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = pool::create_pool(database_url).await?;
        Ok(Self::new(pool))
    }

    /// Run pending schema migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Config(format!("migration failed: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("50%"), "50\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("%_\\"), "\\%\\_\\\\");
    }
}
