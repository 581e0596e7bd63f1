//! Search request shapes.
//!
//! Every criterion is optional and absent criteria never constrain the
//! result. Blank text fields count as absent; that normalization lives
//! here so the SQL builder and the tag post-filter both see the same
//! notion of "present".

use serde::{Deserialize, Serialize};

use crate::models::UserStatus;

/// True when the field carries a usable value.
pub fn present(field: Option<&str>) -> bool {
    field.is_some_and(|s| !s.trim().is_empty())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfileSearchRequest {
    /// Matched case-insensitively against first and last name.
    pub text: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    pub status: Option<UserStatus>,
}

impl UserProfileSearchRequest {
    /// Request used by the recommendation flow: interests only.
    pub fn by_interests(interests: Vec<String>) -> Self {
        Self {
            interests,
            ..Default::default()
        }
    }

    pub fn has_text(&self) -> bool {
        present(self.text.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventSearchRequest {
    pub name: Option<String>,
    /// RFC 3339 instant; matching events fall anywhere within its UTC
    /// calendar day.
    pub event_time: Option<String>,
    pub place: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub only_my_events: Option<bool>,
}

impl EventSearchRequest {
    pub fn has_name(&self) -> bool {
        present(self.name.as_deref())
    }

    pub fn has_place(&self) -> bool {
        present(self.place.as_deref())
    }

    pub fn has_event_time(&self) -> bool {
        present(self.event_time.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectSearchRequest {
    pub name: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub only_my_projects: Option<bool>,
}

impl ProjectSearchRequest {
    pub fn has_name(&self) -> bool {
        present(self.name.as_deref())
    }
}

/// Narrows the participant list returned with a single event or project.
/// Applied in memory against each participant's skills and interests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParticipantFilterRequest {
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub interests: Vec<String>,
}

impl ParticipantFilterRequest {
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty() && self.interests.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_text_counts_as_absent() {
        assert!(!present(None));
        assert!(!present(Some("")));
        assert!(!present(Some("   ")));
        assert!(present(Some("rust")));
    }

    #[test]
    fn test_interest_only_request_carries_nothing_else() {
        let req = UserProfileSearchRequest::by_interests(vec!["ml".to_string()]);
        assert!(!req.has_text());
        assert!(req.skills.is_empty());
        assert!(req.status.is_none());
        assert_eq!(req.interests, vec!["ml".to_string()]);
    }

    #[test]
    fn test_empty_request_deserializes() {
        let req: ProjectSearchRequest = serde_json::from_str("{}").unwrap();
        assert!(req.name.is_none());
        assert!(req.tags.is_empty());
        assert!(req.only_my_projects.is_none());

        let req: EventSearchRequest = serde_json::from_str("{}").unwrap();
        assert!(!req.has_name() && !req.has_place() && !req.has_event_time());
    }
}
