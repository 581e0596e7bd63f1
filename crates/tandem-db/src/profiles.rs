//! User profile repository.
//!
//! Profiles are keyed by the identity subject UUID. Skills, interests, and
//! stars live in side tables and are stitched onto the aggregate after the
//! row fetch, so the dynamic search SQL only ever touches `user_profiles`.

use std::collections::HashMap;
use std::str::FromStr;

use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use tandem_core::models::{UserProfile, UserProfileRequest, UserStatus};
use tandem_core::search::UserProfileSearchRequest;
use tandem_core::{Error, Result};

use crate::search_filter::{bind_query_as, ProfileFilterQueryBuilder};

#[derive(Debug, Clone)]
pub struct PgUserProfileRepository {
    pool: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    id: Uuid,
    first_name: Option<String>,
    last_name: Option<String>,
    description: Option<String>,
    status: Option<String>,
}

impl ProfileRow {
    fn into_profile(self) -> Result<UserProfile> {
        let status = self
            .status
            .as_deref()
            .map(UserStatus::from_str)
            .transpose()?;
        Ok(UserProfile {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            description: self.description,
            status,
            skills: Vec::new(),
            interests: Vec::new(),
            stars: Vec::new(),
        })
    }
}

impl PgUserProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert or fully replace the profile owned by `id`, including its
    /// skill and interest collections.
    pub async fn upsert(&self, id: Uuid, request: &UserProfileRequest) -> Result<UserProfile> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO user_profiles (id, first_name, last_name, description, status)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                description = EXCLUDED.description,
                status = EXCLUDED.status
            "#,
        )
        .bind(id)
        .bind(&request.first_name)
        .bind(&request.last_name)
        .bind(&request.description)
        .bind(request.status.map(|s| s.as_str()))
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM user_profile_skills WHERE user_profile_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        for skill in &request.skills {
            sqlx::query(
                "INSERT INTO user_profile_skills (user_profile_id, skill) VALUES ($1, $2)",
            )
            .bind(id)
            .bind(skill)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM user_profile_interests WHERE user_profile_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        for interest in &request.interests {
            sqlx::query(
                "INSERT INTO user_profile_interests (user_profile_id, interest) VALUES ($1, $2)",
            )
            .bind(id)
            .bind(interest)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        self.get(id).await
    }

    pub async fn get(&self, id: Uuid) -> Result<UserProfile> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "SELECT id, first_name, last_name, description, status
             FROM user_profiles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::ProfileNotFound(id))?;

        let mut profiles = self.stitch(vec![row]).await?;
        profiles.pop().ok_or(Error::ProfileNotFound(id))
    }

    /// Fetch several profiles at once; missing ids are silently skipped.
    pub async fn get_many(&self, ids: &[Uuid]) -> Result<Vec<UserProfile>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, ProfileRow>(
            "SELECT id, first_name, last_name, description, status
             FROM user_profiles WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        self.stitch(rows).await
    }

    pub async fn exists(&self, id: Uuid) -> Result<bool> {
        let exists: Option<(i32,)> =
            sqlx::query_as("SELECT 1 FROM user_profiles WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(exists.is_some())
    }

    pub async fn list(&self) -> Result<Vec<UserProfile>> {
        let rows = sqlx::query_as::<_, ProfileRow>(
            "SELECT id, first_name, last_name, description, status
             FROM user_profiles ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        self.stitch(rows).await
    }

    /// SQL portion of profile search: status equality plus the name text
    /// criterion. Skill/interest overlap runs in memory afterwards.
    pub async fn search(&self, request: &UserProfileSearchRequest) -> Result<Vec<UserProfile>> {
        let filter = ProfileFilterQueryBuilder::new(request, 0).build()?;
        let sql = format!(
            "SELECT DISTINCT p.id, p.first_name, p.last_name, p.description, p.status
             FROM user_profiles p WHERE {} ORDER BY p.id",
            filter.where_clause
        );
        debug!(
            subsystem = "db",
            op = "search_profiles",
            clause = %filter.where_clause,
            "Profile search filter"
        );
        let query = bind_query_as(sqlx::query_as::<_, ProfileRow>(&sql), &filter.params);
        let rows = query.fetch_all(&self.pool).await?;
        self.stitch(rows).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM user_profiles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::ProfileNotFound(id));
        }
        Ok(())
    }

    /// Record that `from_user` starred `target`. Idempotent.
    pub async fn star(&self, target: Uuid, from_user: Uuid) -> Result<()> {
        sqlx::query(
            "INSERT INTO user_profile_stars (target_user_id, from_user_id)
             VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(target)
        .bind(from_user)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn unstar(&self, target: Uuid, from_user: Uuid) -> Result<()> {
        sqlx::query(
            "DELETE FROM user_profile_stars WHERE target_user_id = $1 AND from_user_id = $2",
        )
        .bind(target)
        .bind(from_user)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Attach skills, interests, and stars to the fetched rows.
    async fn stitch(&self, rows: Vec<ProfileRow>) -> Result<Vec<UserProfile>> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut profiles = rows
            .into_iter()
            .map(ProfileRow::into_profile)
            .collect::<Result<Vec<_>>>()?;
        if ids.is_empty() {
            return Ok(profiles);
        }

        let mut skills: HashMap<Uuid, Vec<String>> = HashMap::new();
        let skill_rows: Vec<(Uuid, String)> = sqlx::query_as(
            "SELECT user_profile_id, skill FROM user_profile_skills
             WHERE user_profile_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        for (owner, skill) in skill_rows {
            skills.entry(owner).or_default().push(skill);
        }

        let mut interests: HashMap<Uuid, Vec<String>> = HashMap::new();
        let interest_rows: Vec<(Uuid, String)> = sqlx::query_as(
            "SELECT user_profile_id, interest FROM user_profile_interests
             WHERE user_profile_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        for (owner, interest) in interest_rows {
            interests.entry(owner).or_default().push(interest);
        }

        let mut stars: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        let star_rows: Vec<(Uuid, Uuid)> = sqlx::query_as(
            "SELECT target_user_id, from_user_id FROM user_profile_stars
             WHERE target_user_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        for (target, from_user) in star_rows {
            stars.entry(target).or_default().push(from_user);
        }

        for profile in &mut profiles {
            if let Some(s) = skills.remove(&profile.id) {
                profile.skills = s;
            }
            if let Some(i) = interests.remove(&profile.id) {
                profile.interests = i;
            }
            if let Some(st) = stars.remove(&profile.id) {
                profile.stars = st;
            }
        }
        Ok(profiles)
    }
}
