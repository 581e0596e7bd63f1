//! Profile operations, including search and the interest-overlap
//! recommendation flow.

use tracing::info;
use uuid::Uuid;

use tandem_core::identity::Principal;
use tandem_core::models::{UserProfile, UserProfileRequest, UserProfileResponse};
use tandem_core::search::UserProfileSearchRequest;
use tandem_core::tags::{filter_by_overlap, TagMatch};
use tandem_core::{Error, Result};
use tandem_db::Database;

#[derive(Clone)]
pub struct ProfileService {
    db: Database,
}

impl ProfileService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create (or replace) the caller's own profile. The profile id is the
    /// identity subject; callers cannot create profiles for other users.
    pub async fn create(
        &self,
        principal: &Principal,
        request: &UserProfileRequest,
    ) -> Result<UserProfileResponse> {
        let user_id = principal.user_uuid()?;
        let profile = self.db.profiles.upsert(user_id, request).await?;
        info!(op = "create_profile", profile_id = %user_id, "Profile created");
        Ok(UserProfileResponse::from_profile(profile, user_id))
    }

    pub async fn get(&self, id: Uuid, current_user: Uuid) -> Result<UserProfileResponse> {
        let profile = self.db.profiles.get(id).await?;
        Ok(UserProfileResponse::from_profile(profile, current_user))
    }

    pub async fn list(&self, current_user: Uuid) -> Result<Vec<UserProfileResponse>> {
        let profiles = self.db.profiles.list().await?;
        Ok(profiles
            .into_iter()
            .map(|p| UserProfileResponse::from_profile(p, current_user))
            .collect())
    }

    /// Search: SQL handles status and name text; skill and interest overlap
    /// are symmetric in-memory passes.
    pub async fn search(
        &self,
        request: &UserProfileSearchRequest,
        current_user: Uuid,
    ) -> Result<Vec<UserProfileResponse>> {
        let profiles = self.db.profiles.search(request).await?;
        let before = profiles.len();

        let profiles =
            filter_by_overlap(profiles, &request.skills, TagMatch::Symmetric, |p| &p.skills);
        let profiles = filter_by_overlap(profiles, &request.interests, TagMatch::Symmetric, |p| {
            &p.interests
        });

        info!(
            op = "search_profiles",
            result_count = profiles.len(),
            tag_filtered = before - profiles.len(),
            "Profile search complete"
        );
        Ok(profiles
            .into_iter()
            .map(|p| UserProfileResponse::from_profile(p, current_user))
            .collect())
    }

    /// Recommend profiles sharing interests with the caller. Requires the
    /// caller to have a profile; an empty interest list yields an empty
    /// result without searching.
    pub async fn recommendations(
        &self,
        principal: &Principal,
    ) -> Result<Vec<UserProfileResponse>> {
        let user_id = principal.user_uuid()?;
        let current = self.db.profiles.get(user_id).await?;
        let Some(request) = recommendation_request(&current) else {
            return Ok(Vec::new());
        };
        let results = self.search(&request, user_id).await?;
        Ok(exclude_self(results, user_id))
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: &UserProfileRequest,
        current_user: Uuid,
    ) -> Result<UserProfileResponse> {
        if !self.db.profiles.exists(id).await? {
            return Err(Error::ProfileNotFound(id));
        }
        let profile = self.db.profiles.upsert(id, request).await?;
        Ok(UserProfileResponse::from_profile(profile, current_user))
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.db.profiles.delete(id).await
    }

    /// Star `target` as the caller. Both profiles must exist.
    pub async fn star(&self, target: Uuid, principal: &Principal) -> Result<UserProfileResponse> {
        let from_user = principal.user_uuid()?;
        if !self.db.profiles.exists(from_user).await? {
            return Err(Error::ProfileNotFound(from_user));
        }
        if !self.db.profiles.exists(target).await? {
            return Err(Error::ProfileNotFound(target));
        }
        self.db.profiles.star(target, from_user).await?;
        self.get(target, from_user).await
    }

    pub async fn unstar(&self, target: Uuid, principal: &Principal) -> Result<UserProfileResponse> {
        let from_user = principal.user_uuid()?;
        self.db.profiles.unstar(target, from_user).await?;
        self.get(target, from_user).await
    }
}

/// Seed request for the recommendation flow: the caller's interests and
/// nothing else. `None` when the caller has no interests, so an empty
/// interest list never turns into a match-all search.
fn recommendation_request(profile: &UserProfile) -> Option<UserProfileSearchRequest> {
    if profile.interests.is_empty() {
        return None;
    }
    Some(UserProfileSearchRequest::by_interests(
        profile.interests.clone(),
    ))
}

/// Never recommend the caller to themselves.
fn exclude_self(
    results: Vec<UserProfileResponse>,
    user_id: Uuid,
) -> Vec<UserProfileResponse> {
    results.into_iter().filter(|p| p.id != user_id).collect()
}
