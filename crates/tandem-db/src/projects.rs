//! Project repository.
//!
//! Projects carry three side collections (tags, participants, likes) plus
//! an invitation code; visibility of the code is a service-layer concern,
//! the repository always returns it.

use std::collections::HashMap;
use std::str::FromStr;

use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use tandem_core::models::{Project, ProjectRequest, ProjectStatus};
use tandem_core::search::ProjectSearchRequest;
use tandem_core::{Error, Result};

use crate::search_filter::{bind_query_as, ProjectFilterQueryBuilder};

#[derive(Debug, Clone)]
pub struct PgProjectRepository {
    pool: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct ProjectRow {
    id: i64,
    organizer_id: Uuid,
    name: Option<String>,
    description: Option<String>,
    invitation_code: Option<String>,
    status: String,
}

impl ProjectRow {
    fn into_project(self) -> Result<Project> {
        Ok(Project {
            id: self.id,
            organizer_id: self.organizer_id,
            name: self.name,
            description: self.description,
            tags: Vec::new(),
            participants: Vec::new(),
            likes: Vec::new(),
            invitation_code: self.invitation_code,
            status: ProjectStatus::from_str(&self.status)?,
        })
    }
}

const SELECT_COLUMNS: &str =
    "pr.id, pr.organizer_id, pr.name, pr.description, pr.invitation_code, pr.status";

impl PgProjectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        organizer_id: Uuid,
        request: &ProjectRequest,
        invitation_code: &str,
    ) -> Result<Project> {
        let status = request.status.unwrap_or(ProjectStatus::Public);
        let mut tx = self.pool.begin().await?;

        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO projects (organizer_id, name, description, invitation_code, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(organizer_id)
        .bind(&request.name)
        .bind(&request.description)
        .bind(invitation_code)
        .bind(status.as_str())
        .fetch_one(&mut *tx)
        .await?;

        for tag in &request.tags {
            sqlx::query("INSERT INTO project_tags (project_id, tag) VALUES ($1, $2)")
                .bind(id)
                .bind(tag)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        self.get(id).await
    }

    pub async fn get(&self, id: i64) -> Result<Project> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM projects pr WHERE pr.id = $1");
        let row = sqlx::query_as::<_, ProjectRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(Error::ProjectNotFound(id))?;

        let mut projects = self.stitch(vec![row]).await?;
        projects.pop().ok_or(Error::ProjectNotFound(id))
    }

    pub async fn list(&self) -> Result<Vec<Project>> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM projects pr ORDER BY pr.id");
        let rows = sqlx::query_as::<_, ProjectRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        self.stitch(rows).await
    }

    /// Replace the scalar fields and the tag collection of a project. The
    /// invitation code is untouched; use [`set_invitation_code`] to rotate
    /// it.
    ///
    /// [`set_invitation_code`]: Self::set_invitation_code
    pub async fn update(&self, id: i64, request: &ProjectRequest) -> Result<Project> {
        let status = request.status.unwrap_or(ProjectStatus::Public);
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE projects SET name = $2, description = $3, status = $4 WHERE id = $1",
        )
        .bind(id)
        .bind(&request.name)
        .bind(&request.description)
        .bind(status.as_str())
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(Error::ProjectNotFound(id));
        }

        sqlx::query("DELETE FROM project_tags WHERE project_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        for tag in &request.tags {
            sqlx::query("INSERT INTO project_tags (project_id, tag) VALUES ($1, $2)")
                .bind(id)
                .bind(tag)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        self.get(id).await
    }

    pub async fn set_invitation_code(&self, id: i64, code: &str) -> Result<()> {
        let result = sqlx::query("UPDATE projects SET invitation_code = $2 WHERE id = $1")
            .bind(id)
            .bind(code)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::ProjectNotFound(id));
        }
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::ProjectNotFound(id));
        }
        Ok(())
    }

    /// SQL portion of project search; tag overlap and the mine-only pass
    /// run in the service layer.
    pub async fn search(&self, request: &ProjectSearchRequest) -> Result<Vec<Project>> {
        let filter = ProjectFilterQueryBuilder::new(request, 0).build()?;
        let sql = format!(
            "SELECT DISTINCT {SELECT_COLUMNS} FROM projects pr WHERE {} ORDER BY pr.id",
            filter.where_clause
        );
        debug!(
            subsystem = "db",
            op = "search_projects",
            clause = %filter.where_clause,
            "Project search filter"
        );
        let query = bind_query_as(sqlx::query_as::<_, ProjectRow>(&sql), &filter.params);
        let rows = query.fetch_all(&self.pool).await?;
        self.stitch(rows).await
    }

    pub async fn add_participant(&self, project_id: i64, user_id: Uuid) -> Result<()> {
        sqlx::query(
            "INSERT INTO project_participants (project_id, user_profile_id)
             VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(project_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn remove_participant(&self, project_id: i64, user_id: Uuid) -> Result<()> {
        sqlx::query(
            "DELETE FROM project_participants WHERE project_id = $1 AND user_profile_id = $2",
        )
        .bind(project_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn like(&self, project_id: i64, user_id: Uuid) -> Result<()> {
        sqlx::query(
            "INSERT INTO project_likes (project_id, user_profile_id)
             VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(project_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn unlike(&self, project_id: i64, user_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM project_likes WHERE project_id = $1 AND user_profile_id = $2")
            .bind(project_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn stitch(&self, rows: Vec<ProjectRow>) -> Result<Vec<Project>> {
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut projects = rows
            .into_iter()
            .map(ProjectRow::into_project)
            .collect::<Result<Vec<_>>>()?;
        if ids.is_empty() {
            return Ok(projects);
        }

        let mut tags: HashMap<i64, Vec<String>> = HashMap::new();
        let tag_rows: Vec<(i64, String)> =
            sqlx::query_as("SELECT project_id, tag FROM project_tags WHERE project_id = ANY($1)")
                .bind(&ids)
                .fetch_all(&self.pool)
                .await?;
        for (project_id, tag) in tag_rows {
            tags.entry(project_id).or_default().push(tag);
        }

        let mut participants: HashMap<i64, Vec<Uuid>> = HashMap::new();
        let participant_rows: Vec<(i64, Uuid)> = sqlx::query_as(
            "SELECT project_id, user_profile_id FROM project_participants
             WHERE project_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        for (project_id, user_id) in participant_rows {
            participants.entry(project_id).or_default().push(user_id);
        }

        let mut likes: HashMap<i64, Vec<Uuid>> = HashMap::new();
        let like_rows: Vec<(i64, Uuid)> = sqlx::query_as(
            "SELECT project_id, user_profile_id FROM project_likes WHERE project_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        for (project_id, user_id) in like_rows {
            likes.entry(project_id).or_default().push(user_id);
        }

        for project in &mut projects {
            if let Some(t) = tags.remove(&project.id) {
                project.tags = t;
            }
            if let Some(p) = participants.remove(&project.id) {
                project.participants = p;
            }
            if let Some(l) = likes.remove(&project.id) {
                project.likes = l;
            }
        }
        Ok(projects)
    }
}
