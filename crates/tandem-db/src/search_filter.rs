//! SQL WHERE-clause generation for entity search.
//!
//! Each builder turns a search request into a conjunction of parameterized
//! clauses over one entity's columns. Absent or blank criteria generate no
//! SQL; a request with nothing to say produces the neutral clause `TRUE`.
//! Tag criteria are deliberately not handled here — tag overlap runs as an
//! in-memory pass after the rows come back.
//!
//! All values are parameterized, and user text destined for `LIKE` goes
//! through [`escape_like`](crate::escape_like) first so `%`, `_`, and `\`
//! match literally.

use chrono::{DateTime, Utc};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::QueryAs;
use sqlx::{FromRow, Postgres};
use uuid::Uuid;

use tandem_core::search::{EventSearchRequest, ProjectSearchRequest, UserProfileSearchRequest};
use tandem_core::{Error, Result};

use crate::escape_like;

/// A typed query parameter for dynamically-built SQL.
#[derive(Debug, Clone)]
pub enum QueryParam {
    Uuid(Uuid),
    UuidArray(Vec<Uuid>),
    Int(i64),
    Timestamp(DateTime<Utc>),
    Bool(bool),
    String(String),
    StringArray(Vec<String>),
}

/// Result of building a search filter.
#[derive(Debug, Clone)]
pub struct FilterResult {
    /// The WHERE clause fragment (without the `WHERE` keyword). Never
    /// empty; `TRUE` when no criterion applies.
    pub where_clause: String,
    /// Query parameters in the order they appear in the SQL.
    pub params: Vec<QueryParam>,
}

impl FilterResult {
    fn from_clauses(clauses: Vec<String>, params: Vec<QueryParam>) -> Self {
        let where_clause = if clauses.is_empty() {
            "TRUE".to_string()
        } else {
            clauses.join(" AND ")
        };
        Self {
            where_clause,
            params,
        }
    }
}

/// Lowercased, wildcard-escaped `%...%` pattern for case-insensitive
/// substring matching.
fn like_pattern(input: &str) -> String {
    format!("%{}%", escape_like(&input.to_lowercase()))
}

/// UTC calendar-day bounds `[00:00:00, 23:59:59]` of the instant carried in
/// an RFC 3339 string.
pub fn day_bounds(instant: &str) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let parsed = DateTime::parse_from_rfc3339(instant.trim())
        .map_err(|e| Error::InvalidSearchRequest(format!("invalid event time {instant:?}: {e}")))?
        .with_timezone(&Utc);
    let date = parsed.date_naive();
    // and_hms_opt cannot fail for these constants.
    let start = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| Error::Internal("day start out of range".to_string()))?
        .and_utc();
    let end = date
        .and_hms_opt(23, 59, 59)
        .ok_or_else(|| Error::Internal("day end out of range".to_string()))?
        .and_utc();
    Ok((start, end))
}

// =============================================================================
// PROFILE FILTER
// =============================================================================

/// Generates the WHERE clause for profile search: status equality plus a
/// text criterion matched against first or last name.
pub struct ProfileFilterQueryBuilder<'a> {
    request: &'a UserProfileSearchRequest,
    param_offset: usize,
}

impl<'a> ProfileFilterQueryBuilder<'a> {
    /// `param_offset` is the number of parameters already in the enclosing
    /// query; generated placeholders start at `$param_offset + 1`.
    pub fn new(request: &'a UserProfileSearchRequest, param_offset: usize) -> Self {
        Self {
            request,
            param_offset,
        }
    }

    pub fn build(&self) -> Result<FilterResult> {
        let mut clauses = Vec::new();
        let mut params = Vec::new();
        let mut idx = self.param_offset;

        if let Some(status) = self.request.status {
            idx += 1;
            clauses.push(format!("p.status = ${idx}"));
            params.push(QueryParam::String(status.as_str().to_string()));
        }

        if self.request.has_text() {
            let text = self.request.text.as_deref().unwrap_or_default();
            let pattern = like_pattern(text);
            clauses.push(format!(
                "(LOWER(p.first_name) LIKE ${} OR LOWER(p.last_name) LIKE ${})",
                idx + 1,
                idx + 2
            ));
            params.push(QueryParam::String(pattern.clone()));
            params.push(QueryParam::String(pattern));
        }

        Ok(FilterResult::from_clauses(clauses, params))
    }
}

// =============================================================================
// EVENT FILTER
// =============================================================================

/// Generates the WHERE clause for event search: name and place substring
/// criteria plus a calendar-day window on the event time.
pub struct EventFilterQueryBuilder<'a> {
    request: &'a EventSearchRequest,
    param_offset: usize,
}

impl<'a> EventFilterQueryBuilder<'a> {
    pub fn new(request: &'a EventSearchRequest, param_offset: usize) -> Self {
        Self {
            request,
            param_offset,
        }
    }

    pub fn build(&self) -> Result<FilterResult> {
        let mut clauses = Vec::new();
        let mut params = Vec::new();
        let mut idx = self.param_offset;

        if self.request.has_name() {
            idx += 1;
            clauses.push(format!("LOWER(e.name) LIKE ${idx}"));
            params.push(QueryParam::String(like_pattern(
                self.request.name.as_deref().unwrap_or_default(),
            )));
        }

        if self.request.has_place() {
            idx += 1;
            clauses.push(format!("LOWER(e.place) LIKE ${idx}"));
            params.push(QueryParam::String(like_pattern(
                self.request.place.as_deref().unwrap_or_default(),
            )));
        }

        if self.request.has_event_time() {
            let raw = self.request.event_time.as_deref().unwrap_or_default();
            let (start, end) = day_bounds(raw)?;
            clauses.push(format!("e.event_time BETWEEN ${} AND ${}", idx + 1, idx + 2));
            params.push(QueryParam::Timestamp(start));
            params.push(QueryParam::Timestamp(end));
        }

        Ok(FilterResult::from_clauses(clauses, params))
    }
}

// =============================================================================
// PROJECT FILTER
// =============================================================================

/// Generates the WHERE clause for project search: name substring only.
pub struct ProjectFilterQueryBuilder<'a> {
    request: &'a ProjectSearchRequest,
    param_offset: usize,
}

impl<'a> ProjectFilterQueryBuilder<'a> {
    pub fn new(request: &'a ProjectSearchRequest, param_offset: usize) -> Self {
        Self {
            request,
            param_offset,
        }
    }

    pub fn build(&self) -> Result<FilterResult> {
        let mut clauses = Vec::new();
        let mut params = Vec::new();

        if self.request.has_name() {
            clauses.push(format!("LOWER(pr.name) LIKE ${}", self.param_offset + 1));
            params.push(QueryParam::String(like_pattern(
                self.request.name.as_deref().unwrap_or_default(),
            )));
        }

        Ok(FilterResult::from_clauses(clauses, params))
    }
}

/// Bind a parameter list onto a typed query in order.
pub fn bind_query_as<'q, T>(
    mut query: QueryAs<'q, Postgres, T, PgArguments>,
    params: &[QueryParam],
) -> QueryAs<'q, Postgres, T, PgArguments>
where
    T: for<'r> FromRow<'r, PgRow>,
{
    for param in params {
        query = match param {
            QueryParam::Uuid(v) => query.bind(*v),
            QueryParam::UuidArray(v) => query.bind(v.clone()),
            QueryParam::Int(v) => query.bind(*v),
            QueryParam::Timestamp(v) => query.bind(*v),
            QueryParam::Bool(v) => query.bind(*v),
            QueryParam::String(v) => query.bind(v.clone()),
            QueryParam::StringArray(v) => query.bind(v.clone()),
        };
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tandem_core::models::UserStatus;

    fn assert_param_str(param: &QueryParam, expected: &str) {
        match param {
            QueryParam::String(s) => assert_eq!(s, expected),
            other => panic!("expected string param, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_profile_request_is_true() {
        let request = UserProfileSearchRequest::default();
        let result = ProfileFilterQueryBuilder::new(&request, 0).build().unwrap();
        assert_eq!(result.where_clause, "TRUE");
        assert!(result.params.is_empty());
    }

    #[test]
    fn test_blank_text_generates_no_clause() {
        let request = UserProfileSearchRequest {
            text: Some("   ".to_string()),
            ..Default::default()
        };
        let result = ProfileFilterQueryBuilder::new(&request, 0).build().unwrap();
        assert_eq!(result.where_clause, "TRUE");
    }

    #[test]
    fn test_profile_text_matches_either_name_column() {
        let request = UserProfileSearchRequest {
            text: Some("Ada".to_string()),
            ..Default::default()
        };
        let result = ProfileFilterQueryBuilder::new(&request, 0).build().unwrap();
        assert_eq!(
            result.where_clause,
            "(LOWER(p.first_name) LIKE $1 OR LOWER(p.last_name) LIKE $2)"
        );
        assert_eq!(result.params.len(), 2);
        assert_param_str(&result.params[0], "%ada%");
        assert_param_str(&result.params[1], "%ada%");
    }

    #[test]
    fn test_profile_status_and_text_conjunction() {
        let request = UserProfileSearchRequest {
            text: Some("ada".to_string()),
            status: Some(UserStatus::LookingForTeam),
            ..Default::default()
        };
        let result = ProfileFilterQueryBuilder::new(&request, 0).build().unwrap();
        assert_eq!(
            result.where_clause,
            "p.status = $1 AND (LOWER(p.first_name) LIKE $2 OR LOWER(p.last_name) LIKE $3)"
        );
        assert_param_str(&result.params[0], "LOOKING_FOR_TEAM");
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        let request = ProjectSearchRequest {
            name: Some("50%_done\\now".to_string()),
            ..Default::default()
        };
        let result = ProjectFilterQueryBuilder::new(&request, 0).build().unwrap();
        assert_param_str(&result.params[0], "%50\\%\\_done\\\\now%");
    }

    #[test]
    fn test_param_offset_shifts_placeholders() {
        let request = ProjectSearchRequest {
            name: Some("tandem".to_string()),
            ..Default::default()
        };
        let result = ProjectFilterQueryBuilder::new(&request, 2).build().unwrap();
        assert_eq!(result.where_clause, "LOWER(pr.name) LIKE $3");
    }

    #[test]
    fn test_event_filter_all_criteria() {
        let request = EventSearchRequest {
            name: Some("Hack".to_string()),
            place: Some("Berlin".to_string()),
            event_time: Some("2025-03-14T10:30:00Z".to_string()),
            ..Default::default()
        };
        let result = EventFilterQueryBuilder::new(&request, 0).build().unwrap();
        assert_eq!(
            result.where_clause,
            "LOWER(e.name) LIKE $1 AND LOWER(e.place) LIKE $2 \
             AND e.event_time BETWEEN $3 AND $4"
        );
        assert_eq!(result.params.len(), 4);
    }

    #[test]
    fn test_day_bounds_cover_whole_day() {
        let (start, end) = day_bounds("2025-03-14T10:30:00Z").unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 3, 14, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 3, 14, 23, 59, 59).unwrap());

        // Edge instants: last in-window second is included, the first
        // second of the next day is not.
        let inside = Utc.with_ymd_and_hms(2025, 3, 14, 23, 59, 0).unwrap();
        assert!(inside >= start && inside <= end);
        let next_day = Utc.with_ymd_and_hms(2025, 3, 15, 0, 0, 1).unwrap();
        assert!(next_day > end);
    }

    #[test]
    fn test_day_bounds_normalize_offset_to_utc() {
        // 01:30+02:00 is 23:30 UTC of the previous day.
        let (start, _) = day_bounds("2025-03-15T01:30:00+02:00").unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 3, 14, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_unparseable_event_time_is_invalid_search() {
        let request = EventSearchRequest {
            event_time: Some("tomorrow".to_string()),
            ..Default::default()
        };
        let err = EventFilterQueryBuilder::new(&request, 0).build().unwrap_err();
        assert!(matches!(err, Error::InvalidSearchRequest(_)));
    }

    #[test]
    fn test_building_twice_yields_identical_filters() {
        let request = EventSearchRequest {
            name: Some("Hack".to_string()),
            place: Some("Berlin".to_string()),
            event_time: Some("2025-03-14T10:30:00Z".to_string()),
            ..Default::default()
        };
        let first = EventFilterQueryBuilder::new(&request, 0).build().unwrap();
        let second = EventFilterQueryBuilder::new(&request, 0).build().unwrap();
        assert_eq!(first.where_clause, second.where_clause);
        assert_eq!(first.params.len(), second.params.len());
    }

    #[test]
    fn test_tags_never_reach_sql() {
        let request = ProjectSearchRequest {
            tags: vec!["rust".to_string()],
            only_my_projects: Some(true),
            ..Default::default()
        };
        let result = ProjectFilterQueryBuilder::new(&request, 0).build().unwrap();
        assert_eq!(result.where_clause, "TRUE");
        assert!(result.params.is_empty());
    }
}
