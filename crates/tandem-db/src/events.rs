//! Event repository.
//!
//! Tags and participants live in side tables; the search SQL covers the
//! scalar columns only and the aggregate is stitched together afterwards.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use tandem_core::models::{Event, EventRequest};
use tandem_core::search::EventSearchRequest;
use tandem_core::{Error, Result};

use crate::search_filter::{bind_query_as, EventFilterQueryBuilder};

#[derive(Debug, Clone)]
pub struct PgEventRepository {
    pool: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    id: i64,
    organizer_id: Uuid,
    name: Option<String>,
    description: Option<String>,
    event_time: Option<DateTime<Utc>>,
    place: Option<String>,
}

impl EventRow {
    fn into_event(self) -> Event {
        Event {
            id: self.id,
            organizer_id: self.organizer_id,
            name: self.name,
            description: self.description,
            event_time: self.event_time,
            place: self.place,
            tags: Vec::new(),
            participants: Vec::new(),
            likes: Vec::new(),
        }
    }
}

impl PgEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, organizer_id: Uuid, request: &EventRequest) -> Result<Event> {
        let mut tx = self.pool.begin().await?;

        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO events (organizer_id, name, description, event_time, place)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(organizer_id)
        .bind(&request.name)
        .bind(&request.description)
        .bind(request.event_time)
        .bind(&request.place)
        .fetch_one(&mut *tx)
        .await?;

        for tag in &request.tags {
            sqlx::query("INSERT INTO event_tags (event_id, tag) VALUES ($1, $2)")
                .bind(id)
                .bind(tag)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        self.get(id).await
    }

    pub async fn get(&self, id: i64) -> Result<Event> {
        let row = sqlx::query_as::<_, EventRow>(
            "SELECT id, organizer_id, name, description, event_time, place
             FROM events WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::EventNotFound(id))?;

        let mut events = self.stitch(vec![row]).await?;
        events.pop().ok_or(Error::EventNotFound(id))
    }

    pub async fn list(&self) -> Result<Vec<Event>> {
        let rows = sqlx::query_as::<_, EventRow>(
            "SELECT id, organizer_id, name, description, event_time, place
             FROM events ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        self.stitch(rows).await
    }

    /// Replace the scalar fields and the tag collection of an event.
    pub async fn update(&self, id: i64, request: &EventRequest) -> Result<Event> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE events
            SET name = $2, description = $3, event_time = $4, place = $5
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(&request.description)
        .bind(request.event_time)
        .bind(&request.place)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(Error::EventNotFound(id));
        }

        sqlx::query("DELETE FROM event_tags WHERE event_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        for tag in &request.tags {
            sqlx::query("INSERT INTO event_tags (event_id, tag) VALUES ($1, $2)")
                .bind(id)
                .bind(tag)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        self.get(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::EventNotFound(id));
        }
        Ok(())
    }

    /// SQL portion of event search; tag overlap and the mine-only pass run
    /// in the service layer.
    pub async fn search(&self, request: &EventSearchRequest) -> Result<Vec<Event>> {
        let filter = EventFilterQueryBuilder::new(request, 0).build()?;
        let sql = format!(
            "SELECT DISTINCT e.id, e.organizer_id, e.name, e.description, e.event_time, e.place
             FROM events e WHERE {} ORDER BY e.id",
            filter.where_clause
        );
        debug!(
            subsystem = "db",
            op = "search_events",
            clause = %filter.where_clause,
            "Event search filter"
        );
        let query = bind_query_as(sqlx::query_as::<_, EventRow>(&sql), &filter.params);
        let rows = query.fetch_all(&self.pool).await?;
        self.stitch(rows).await
    }

    pub async fn add_participant(&self, event_id: i64, user_id: Uuid) -> Result<()> {
        sqlx::query(
            "INSERT INTO event_participants (event_id, user_profile_id)
             VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(event_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn remove_participant(&self, event_id: i64, user_id: Uuid) -> Result<()> {
        sqlx::query(
            "DELETE FROM event_participants WHERE event_id = $1 AND user_profile_id = $2",
        )
        .bind(event_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn like(&self, event_id: i64, user_id: Uuid) -> Result<()> {
        sqlx::query(
            "INSERT INTO event_likes (event_id, user_profile_id)
             VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(event_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn unlike(&self, event_id: i64, user_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM event_likes WHERE event_id = $1 AND user_profile_id = $2")
            .bind(event_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn stitch(&self, rows: Vec<EventRow>) -> Result<Vec<Event>> {
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut events: Vec<Event> = rows.into_iter().map(EventRow::into_event).collect();
        if ids.is_empty() {
            return Ok(events);
        }

        let mut tags: HashMap<i64, Vec<String>> = HashMap::new();
        let tag_rows: Vec<(i64, String)> =
            sqlx::query_as("SELECT event_id, tag FROM event_tags WHERE event_id = ANY($1)")
                .bind(&ids)
                .fetch_all(&self.pool)
                .await?;
        for (event_id, tag) in tag_rows {
            tags.entry(event_id).or_default().push(tag);
        }

        let mut participants: HashMap<i64, Vec<Uuid>> = HashMap::new();
        let participant_rows: Vec<(i64, Uuid)> = sqlx::query_as(
            "SELECT event_id, user_profile_id FROM event_participants WHERE event_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        for (event_id, user_id) in participant_rows {
            participants.entry(event_id).or_default().push(user_id);
        }

        let mut likes: HashMap<i64, Vec<Uuid>> = HashMap::new();
        let like_rows: Vec<(i64, Uuid)> = sqlx::query_as(
            "SELECT event_id, user_profile_id FROM event_likes WHERE event_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        for (event_id, user_id) in like_rows {
            likes.entry(event_id).or_default().push(user_id);
        }

        for event in &mut events {
            if let Some(t) = tags.remove(&event.id) {
                event.tags = t;
            }
            if let Some(p) = participants.remove(&event.id) {
                event.participants = p;
            }
            if let Some(l) = likes.remove(&event.id) {
                event.likes = l;
            }
        }
        Ok(events)
    }
}
