//! Structured logging field name constants.
//!
//! All crates use these constants so log aggregation tools can query by
//! the same field names across every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, request rejected or fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, filter clauses, config choices |
//! | TRACE | Per-item iteration (search hits, tag comparisons) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated through a request.
/// Format: UUIDv7 (time-ordered).
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "db", "core"
pub const SUBSYSTEM: &str = "subsystem";

/// Logical operation name.
/// Examples: "search_profiles", "join_project", "recommendations"
pub const OPERATION: &str = "op";

/// Authenticated subject id (never the raw credential).
pub const USER_ID: &str = "user_id";

/// Which credential shape authenticated the request: "bearer" or "session".
pub const AUTH_PATH: &str = "auth_path";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Profile UUID being operated on.
pub const PROFILE_ID: &str = "profile_id";

/// Event row id.
pub const EVENT_ID: &str = "event_id";

/// Project row id.
pub const PROJECT_ID: &str = "project_id";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of rows returned by a search or query.
pub const RESULT_COUNT: &str = "result_count";

/// Rows discarded by the in-memory tag overlap pass.
pub const TAG_FILTERED: &str = "tag_filtered";
