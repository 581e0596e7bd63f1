//! Project operations: CRUD, search, membership gated by invitation codes,
//! likes, and interest-driven recommendations.

use std::collections::HashMap;

use rand::Rng;
use tracing::info;
use uuid::Uuid;

use tandem_core::identity::Principal;
use tandem_core::models::{
    Project, ProjectRequest, ProjectResponse, UserProfile, UserProfileResponse,
};
use tandem_core::search::{ParticipantFilterRequest, ProjectSearchRequest};
use tandem_core::tags::{filter_by_overlap, TagMatch};
use tandem_core::{Error, Result};
use tandem_db::Database;

use super::{load_profile_map, participant_responses};

/// Alphabet for invitation codes.
const CODE_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate an `XX-XX-XX` invitation code.
pub fn generate_invitation_code() -> String {
    let mut rng = rand::thread_rng();
    let mut pick = || CODE_CHARS[rng.gen_range(0..CODE_CHARS.len())] as char;
    format!(
        "{}{}-{}{}-{}{}",
        pick(),
        pick(),
        pick(),
        pick(),
        pick(),
        pick()
    )
}

#[derive(Clone)]
pub struct ProjectService {
    db: Database,
}

impl ProjectService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        principal: &Principal,
        request: &ProjectRequest,
    ) -> Result<ProjectResponse> {
        let organizer_id = principal.user_uuid()?;
        if !self.db.profiles.exists(organizer_id).await? {
            return Err(Error::ProfileNotFound(organizer_id));
        }
        let code = generate_invitation_code();
        let project = self.db.projects.create(organizer_id, request, &code).await?;
        info!(op = "create_project", project_id = project.id, "Project created");
        self.to_response(project, &ParticipantFilterRequest::default(), organizer_id)
            .await
    }

    pub async fn get(
        &self,
        id: i64,
        filter: &ParticipantFilterRequest,
        current_user: Uuid,
    ) -> Result<ProjectResponse> {
        let project = self.db.projects.get(id).await?;
        self.to_response(project, filter, current_user).await
    }

    pub async fn list(&self, current_user: Uuid) -> Result<Vec<ProjectResponse>> {
        let projects = self.db.projects.list().await?;
        self.to_responses(projects, current_user).await
    }

    pub async fn update(
        &self,
        id: i64,
        request: &ProjectRequest,
        current_user: Uuid,
    ) -> Result<ProjectResponse> {
        let project = self.db.projects.update(id, request).await?;
        self.to_response(project, &ParticipantFilterRequest::default(), current_user)
            .await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.db.projects.delete(id).await
    }

    /// Search: SQL handles the name criterion; the tag overlap pass and the
    /// mine-only pass run here, in that order.
    pub async fn search(
        &self,
        request: &ProjectSearchRequest,
        principal: &Principal,
    ) -> Result<Vec<ProjectResponse>> {
        let projects = self.db.projects.search(request).await?;
        let before = projects.len();

        let mut projects = filter_by_overlap(
            projects,
            &request.tags,
            TagMatch::StoredContainsQuery,
            |p: &Project| &p.tags,
        );
        let tag_filtered = before - projects.len();

        if request.only_my_projects.unwrap_or(false) {
            let current = principal.user_uuid()?;
            projects.retain(|p| p.organizer_id == current);
        }

        info!(
            op = "search_projects",
            result_count = projects.len(),
            tag_filtered,
            "Project search complete"
        );
        self.to_responses(projects, principal.user_uuid()?).await
    }

    /// Recommend projects whose tags overlap the caller's profile interests.
    /// Unlike profile recommendations, the caller's own projects are not
    /// excluded.
    pub async fn recommendations(&self, principal: &Principal) -> Result<Vec<ProjectResponse>> {
        let user_id = principal.user_uuid()?;
        let current = self.db.profiles.get(user_id).await?;
        let Some(request) = recommendation_request(&current) else {
            return Ok(Vec::new());
        };
        self.search(&request, principal).await
    }

    /// Join a project. Public projects admit anyone with a profile; private
    /// projects require the exact invitation code.
    pub async fn join(
        &self,
        id: i64,
        invitation_code: Option<&str>,
        principal: &Principal,
    ) -> Result<ProjectResponse> {
        let user_id = principal.user_uuid()?;
        let project = self.db.projects.get(id).await?;
        if !self.db.profiles.exists(user_id).await? {
            return Err(Error::ProfileNotFound(user_id));
        }
        project.verify_join(invitation_code)?;
        self.db.projects.add_participant(id, user_id).await?;
        info!(op = "join_project", project_id = id, "Participant joined");
        self.get(id, &ParticipantFilterRequest::default(), user_id)
            .await
    }

    pub async fn leave(&self, id: i64, principal: &Principal) -> Result<ProjectResponse> {
        let user_id = principal.user_uuid()?;
        self.db.projects.get(id).await?;
        self.db.projects.remove_participant(id, user_id).await?;
        self.get(id, &ParticipantFilterRequest::default(), user_id)
            .await
    }

    /// Rotate the invitation code, invalidating the previous one.
    pub async fn rotate_invitation_code(&self, id: i64) -> Result<String> {
        let code = generate_invitation_code();
        self.db.projects.set_invitation_code(id, &code).await?;
        info!(op = "rotate_invitation_code", project_id = id, "Code rotated");
        Ok(code)
    }

    pub async fn like(&self, id: i64, principal: &Principal) -> Result<ProjectResponse> {
        let user_id = principal.user_uuid()?;
        self.db.projects.get(id).await?;
        if !self.db.profiles.exists(user_id).await? {
            return Err(Error::ProfileNotFound(user_id));
        }
        self.db.projects.like(id, user_id).await?;
        self.get(id, &ParticipantFilterRequest::default(), user_id)
            .await
    }

    pub async fn unlike(&self, id: i64, principal: &Principal) -> Result<ProjectResponse> {
        let user_id = principal.user_uuid()?;
        self.db.projects.get(id).await?;
        self.db.projects.unlike(id, user_id).await?;
        self.get(id, &ParticipantFilterRequest::default(), user_id)
            .await
    }

    async fn to_response(
        &self,
        project: Project,
        filter: &ParticipantFilterRequest,
        current_user: Uuid,
    ) -> Result<ProjectResponse> {
        let mut ids = vec![project.organizer_id];
        ids.extend_from_slice(&project.participants);
        let profile_map = load_profile_map(&self.db, &ids).await?;
        Ok(assemble(project, filter, &profile_map, current_user))
    }

    async fn to_responses(
        &self,
        projects: Vec<Project>,
        current_user: Uuid,
    ) -> Result<Vec<ProjectResponse>> {
        let mut ids: Vec<Uuid> = Vec::new();
        for project in &projects {
            ids.push(project.organizer_id);
            ids.extend_from_slice(&project.participants);
        }
        ids.sort_unstable();
        ids.dedup();
        let profile_map = load_profile_map(&self.db, &ids).await?;

        Ok(projects
            .into_iter()
            .map(|p| {
                assemble(
                    p,
                    &ParticipantFilterRequest::default(),
                    &profile_map,
                    current_user,
                )
            })
            .collect())
    }
}

/// Seed request for the recommendation flow: the caller's interests as the
/// tag query, everything else absent. `None` when the caller has no
/// interests, so an empty interest list never turns into a match-all search.
fn recommendation_request(profile: &UserProfile) -> Option<ProjectSearchRequest> {
    if profile.interests.is_empty() {
        return None;
    }
    Some(ProjectSearchRequest {
        tags: profile.interests.clone(),
        ..Default::default()
    })
}

fn assemble(
    project: Project,
    filter: &ParticipantFilterRequest,
    profile_map: &HashMap<Uuid, UserProfile>,
    current_user: Uuid,
) -> ProjectResponse {
    let organizer = profile_map
        .get(&project.organizer_id)
        .cloned()
        .map(|p| UserProfileResponse::from_profile(p, current_user));
    let participants =
        participant_responses(&project.participants, profile_map, filter, current_user);
    let liked = project.likes.contains(&current_user);

    // The code is the organizer's secret; everyone else sees null.
    let invitation_code = if project.organizer_id == current_user {
        project.invitation_code
    } else {
        None
    };

    ProjectResponse {
        id: project.id,
        organizer,
        name: project.name,
        description: project.description,
        tags: project.tags,
        participants,
        like_count: project.likes.len(),
        liked_by_current_user: liked,
        invitation_code,
        status: project.status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_core::models::{ProjectStatus, UserStatus};

    fn profile_with_interests(interests: &[&str]) -> UserProfile {
        UserProfile {
            id: Uuid::new_v4(),
            first_name: None,
            last_name: None,
            description: None,
            status: Some(UserStatus::LeadingProject),
            skills: vec![],
            interests: interests.iter().map(|s| s.to_string()).collect(),
            stars: vec![],
        }
    }

    #[test]
    fn test_empty_interests_yield_no_request() {
        assert!(recommendation_request(&profile_with_interests(&[])).is_none());
    }

    #[test]
    fn test_recommendation_request_is_tags_only() {
        let request = recommendation_request(&profile_with_interests(&["ml"])).unwrap();
        assert_eq!(request.tags, vec!["ml".to_string()]);
        assert!(!request.has_name());
        assert!(request.only_my_projects.is_none());
    }

    #[test]
    fn test_invitation_code_format() {
        for _ in 0..50 {
            let code = generate_invitation_code();
            let bytes: Vec<char> = code.chars().collect();
            assert_eq!(bytes.len(), 8);
            assert_eq!(bytes[2], '-');
            assert_eq!(bytes[5], '-');
            for (i, c) in bytes.iter().enumerate() {
                if i == 2 || i == 5 {
                    continue;
                }
                assert!(
                    c.is_ascii_uppercase() || c.is_ascii_digit(),
                    "unexpected char {c} in {code}"
                );
            }
        }
    }

    #[test]
    fn test_invitation_code_hidden_from_non_organizer() {
        let organizer = Uuid::new_v4();
        let viewer = Uuid::new_v4();
        let project = Project {
            id: 1,
            organizer_id: organizer,
            name: Some("p".to_string()),
            description: None,
            tags: vec![],
            participants: vec![],
            likes: vec![viewer],
            invitation_code: Some("AB-CD-EF".to_string()),
            status: ProjectStatus::Private,
        };

        let map = HashMap::new();
        let as_viewer = assemble(
            project.clone(),
            &ParticipantFilterRequest::default(),
            &map,
            viewer,
        );
        assert_eq!(as_viewer.invitation_code, None);
        assert!(as_viewer.liked_by_current_user);
        assert_eq!(as_viewer.like_count, 1);

        let as_organizer = assemble(
            project,
            &ParticipantFilterRequest::default(),
            &map,
            organizer,
        );
        assert_eq!(as_organizer.invitation_code.as_deref(), Some("AB-CD-EF"));
        assert!(!as_organizer.liked_by_current_user);
    }
}
