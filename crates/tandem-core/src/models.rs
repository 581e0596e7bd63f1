//! Domain model types shared across the workspace.
//!
//! Aggregates carry their collection fields (tags, participants, likes)
//! already stitched together; the db crate owns the row-level shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Collaboration availability advertised on a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    WantCollaborate,
    ExploringOpportunities,
    OpenToCollaboration,
    AvailableForFeedback,
    LeadingProject,
    LookingForTeam,
    NotAvailable,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::WantCollaborate => "WANT_COLLABORATE",
            UserStatus::ExploringOpportunities => "EXPLORING_OPPORTUNITIES",
            UserStatus::OpenToCollaboration => "OPEN_TO_COLLABORATION",
            UserStatus::AvailableForFeedback => "AVAILABLE_FOR_FEEDBACK",
            UserStatus::LeadingProject => "LEADING_PROJECT",
            UserStatus::LookingForTeam => "LOOKING_FOR_TEAM",
            UserStatus::NotAvailable => "NOT_AVAILABLE",
        }
    }
}

impl std::str::FromStr for UserStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "WANT_COLLABORATE" => Ok(UserStatus::WantCollaborate),
            "EXPLORING_OPPORTUNITIES" => Ok(UserStatus::ExploringOpportunities),
            "OPEN_TO_COLLABORATION" => Ok(UserStatus::OpenToCollaboration),
            "AVAILABLE_FOR_FEEDBACK" => Ok(UserStatus::AvailableForFeedback),
            "LEADING_PROJECT" => Ok(UserStatus::LeadingProject),
            "LOOKING_FOR_TEAM" => Ok(UserStatus::LookingForTeam),
            "NOT_AVAILABLE" => Ok(UserStatus::NotAvailable),
            other => Err(Error::InvalidInput(format!("unknown user status: {other}"))),
        }
    }
}

/// Project visibility. Private projects gate joining behind an invitation
/// code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    Public,
    Private,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Public => "PUBLIC",
            ProjectStatus::Private => "PRIVATE",
        }
    }
}

impl std::str::FromStr for ProjectStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "PUBLIC" => Ok(ProjectStatus::Public),
            "PRIVATE" => Ok(ProjectStatus::Private),
            other => Err(Error::InvalidInput(format!(
                "unknown project status: {other}"
            ))),
        }
    }
}

/// A user's collaboration profile. Keyed by the identity subject UUID, so a
/// profile exists only after its owner has created it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub description: Option<String>,
    pub status: Option<UserStatus>,
    pub skills: Vec<String>,
    pub interests: Vec<String>,
    /// Ids of users who starred this profile.
    pub stars: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub organizer_id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    pub event_time: Option<DateTime<Utc>>,
    pub place: Option<String>,
    pub tags: Vec<String>,
    pub participants: Vec<Uuid>,
    pub likes: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub organizer_id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub participants: Vec<Uuid>,
    pub likes: Vec<Uuid>,
    pub invitation_code: Option<String>,
    pub status: ProjectStatus,
}

impl Project {
    /// Gate for joining: public projects admit anyone; private projects
    /// require the exact invitation code.
    pub fn verify_join(&self, invitation_code: Option<&str>) -> Result<()> {
        if self.status == ProjectStatus::Public {
            return Ok(());
        }
        match (self.invitation_code.as_deref(), invitation_code) {
            (Some(stored), Some(given)) if stored == given => Ok(()),
            _ => Err(Error::AccessDenied("invalid invitation code".to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub description: Option<String>,
    pub status: Option<UserStatus>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub interests: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub event_time: Option<DateTime<Utc>>,
    pub place: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub status: Option<ProjectStatus>,
}

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

/// Profile as seen by `current_user`: raw star ids collapse into a count
/// plus a did-I-star-it flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfileResponse {
    pub id: Uuid,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub description: Option<String>,
    pub status: Option<UserStatus>,
    pub skills: Vec<String>,
    pub interests: Vec<String>,
    pub star_count: usize,
    pub starred_by_current_user: bool,
}

impl UserProfileResponse {
    pub fn from_profile(profile: UserProfile, current_user: Uuid) -> Self {
        let starred = profile.stars.contains(&current_user);
        Self {
            id: profile.id,
            first_name: profile.first_name,
            last_name: profile.last_name,
            description: profile.description,
            status: profile.status,
            skills: profile.skills,
            interests: profile.interests,
            star_count: profile.stars.len(),
            starred_by_current_user: starred,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventResponse {
    pub id: i64,
    pub organizer: Option<UserProfileResponse>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub event_time: Option<DateTime<Utc>>,
    pub place: Option<String>,
    pub tags: Vec<String>,
    pub participants: Vec<UserProfileResponse>,
    pub like_count: usize,
    pub liked_by_current_user: bool,
}

/// Project view for `current_user`. `invitation_code` is populated only
/// for the organizer; everyone else sees `null`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectResponse {
    pub id: i64,
    pub organizer: Option<UserProfileResponse>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub participants: Vec<UserProfileResponse>,
    pub like_count: usize,
    pub liked_by_current_user: bool,
    pub invitation_code: Option<String>,
    pub status: ProjectStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_user_status_round_trip() {
        for status in [
            UserStatus::WantCollaborate,
            UserStatus::ExploringOpportunities,
            UserStatus::OpenToCollaboration,
            UserStatus::AvailableForFeedback,
            UserStatus::LeadingProject,
            UserStatus::LookingForTeam,
            UserStatus::NotAvailable,
        ] {
            assert_eq!(UserStatus::from_str(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn test_user_status_serde_uses_screaming_snake() {
        let json = serde_json::to_string(&UserStatus::LookingForTeam).unwrap();
        assert_eq!(json, "\"LOOKING_FOR_TEAM\"");
        let back: UserStatus = serde_json::from_str("\"NOT_AVAILABLE\"").unwrap();
        assert_eq!(back, UserStatus::NotAvailable);
    }

    #[test]
    fn test_unknown_status_is_invalid_input() {
        assert!(matches!(
            UserStatus::from_str("BUSY"),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            ProjectStatus::from_str("HIDDEN"),
            Err(Error::InvalidInput(_))
        ));
    }

    fn project(status: ProjectStatus, code: Option<&str>) -> Project {
        Project {
            id: 1,
            organizer_id: Uuid::new_v4(),
            name: Some("p".to_string()),
            description: None,
            tags: vec![],
            participants: vec![],
            likes: vec![],
            invitation_code: code.map(str::to_string),
            status,
        }
    }

    #[test]
    fn test_public_project_joins_without_code() {
        let p = project(ProjectStatus::Public, Some("AB-CD-EF"));
        assert!(p.verify_join(None).is_ok());
        // A wrong code is irrelevant when the project is public.
        assert!(p.verify_join(Some("XX-XX-XX")).is_ok());
    }

    #[test]
    fn test_private_project_requires_exact_code() {
        let p = project(ProjectStatus::Private, Some("AB-CD-EF"));
        assert!(p.verify_join(Some("AB-CD-EF")).is_ok());
        assert!(matches!(
            p.verify_join(Some("ab-cd-ef")),
            Err(Error::AccessDenied(_))
        ));
        assert!(matches!(p.verify_join(None), Err(Error::AccessDenied(_))));
    }

    #[test]
    fn test_private_project_without_stored_code_rejects_all() {
        let p = project(ProjectStatus::Private, None);
        assert!(matches!(
            p.verify_join(Some("AB-CD-EF")),
            Err(Error::AccessDenied(_))
        ));
    }

    #[test]
    fn test_profile_response_star_projection() {
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();
        let profile = UserProfile {
            id: Uuid::new_v4(),
            first_name: Some("Ada".to_string()),
            last_name: None,
            description: None,
            status: Some(UserStatus::OpenToCollaboration),
            skills: vec!["rust".to_string()],
            interests: vec![],
            stars: vec![me, other],
        };
        let resp = UserProfileResponse::from_profile(profile.clone(), me);
        assert_eq!(resp.star_count, 2);
        assert!(resp.starred_by_current_user);

        let resp = UserProfileResponse::from_profile(profile, Uuid::new_v4());
        assert!(!resp.starred_by_current_user);
    }
}
