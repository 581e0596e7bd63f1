//! Event operations: CRUD, search with the tag and mine-only passes,
//! participation, likes, and interest-driven recommendations.

use std::collections::HashMap;

use tracing::info;
use uuid::Uuid;

use tandem_core::identity::Principal;
use tandem_core::models::{Event, EventRequest, EventResponse, UserProfile, UserProfileResponse};
use tandem_core::search::{EventSearchRequest, ParticipantFilterRequest};
use tandem_core::tags::{filter_by_overlap, TagMatch};
use tandem_core::{Error, Result};
use tandem_db::Database;

use super::{load_profile_map, participant_responses};

#[derive(Clone)]
pub struct EventService {
    db: Database,
}

impl EventService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        principal: &Principal,
        request: &EventRequest,
    ) -> Result<EventResponse> {
        let organizer_id = principal.user_uuid()?;
        if !self.db.profiles.exists(organizer_id).await? {
            return Err(Error::ProfileNotFound(organizer_id));
        }
        let event = self.db.events.create(organizer_id, request).await?;
        info!(op = "create_event", event_id = event.id, "Event created");
        self.to_response(event, &ParticipantFilterRequest::default(), organizer_id)
            .await
    }

    pub async fn get(
        &self,
        id: i64,
        filter: &ParticipantFilterRequest,
        current_user: Uuid,
    ) -> Result<EventResponse> {
        let event = self.db.events.get(id).await?;
        self.to_response(event, filter, current_user).await
    }

    pub async fn list(&self, current_user: Uuid) -> Result<Vec<EventResponse>> {
        let events = self.db.events.list().await?;
        self.to_responses(events, current_user).await
    }

    pub async fn update(
        &self,
        id: i64,
        request: &EventRequest,
        current_user: Uuid,
    ) -> Result<EventResponse> {
        let event = self.db.events.update(id, request).await?;
        self.to_response(event, &ParticipantFilterRequest::default(), current_user)
            .await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.db.events.delete(id).await
    }

    /// Search: SQL handles name, place, and the event-time day window; the
    /// tag overlap pass and the mine-only pass run here, in that order.
    pub async fn search(
        &self,
        request: &EventSearchRequest,
        principal: &Principal,
    ) -> Result<Vec<EventResponse>> {
        let events = self.db.events.search(request).await?;
        let before = events.len();

        let mut events = filter_by_overlap(
            events,
            &request.tags,
            TagMatch::StoredContainsQuery,
            |e: &Event| &e.tags,
        );
        let tag_filtered = before - events.len();

        if request.only_my_events.unwrap_or(false) {
            let current = principal.user_uuid()?;
            events.retain(|e| e.organizer_id == current);
        }

        info!(
            op = "search_events",
            result_count = events.len(),
            tag_filtered,
            "Event search complete"
        );
        self.to_responses(events, principal.user_uuid()?).await
    }

    /// Recommend events whose tags overlap the caller's profile interests.
    /// Unlike profile recommendations, the caller's own events are not
    /// excluded.
    pub async fn recommendations(&self, principal: &Principal) -> Result<Vec<EventResponse>> {
        let user_id = principal.user_uuid()?;
        let current = self.db.profiles.get(user_id).await?;
        let Some(request) = recommendation_request(&current) else {
            return Ok(Vec::new());
        };
        self.search(&request, principal).await
    }

    pub async fn join(&self, id: i64, principal: &Principal) -> Result<EventResponse> {
        let user_id = principal.user_uuid()?;
        // Surfaces EventNotFound before touching the join table.
        self.db.events.get(id).await?;
        if !self.db.profiles.exists(user_id).await? {
            return Err(Error::ProfileNotFound(user_id));
        }
        self.db.events.add_participant(id, user_id).await?;
        self.get(id, &ParticipantFilterRequest::default(), user_id)
            .await
    }

    pub async fn leave(&self, id: i64, principal: &Principal) -> Result<EventResponse> {
        let user_id = principal.user_uuid()?;
        self.db.events.get(id).await?;
        self.db.events.remove_participant(id, user_id).await?;
        self.get(id, &ParticipantFilterRequest::default(), user_id)
            .await
    }

    pub async fn like(&self, id: i64, principal: &Principal) -> Result<EventResponse> {
        let user_id = principal.user_uuid()?;
        self.db.events.get(id).await?;
        if !self.db.profiles.exists(user_id).await? {
            return Err(Error::ProfileNotFound(user_id));
        }
        self.db.events.like(id, user_id).await?;
        self.get(id, &ParticipantFilterRequest::default(), user_id)
            .await
    }

    pub async fn unlike(&self, id: i64, principal: &Principal) -> Result<EventResponse> {
        let user_id = principal.user_uuid()?;
        self.db.events.get(id).await?;
        self.db.events.unlike(id, user_id).await?;
        self.get(id, &ParticipantFilterRequest::default(), user_id)
            .await
    }

    async fn to_response(
        &self,
        event: Event,
        filter: &ParticipantFilterRequest,
        current_user: Uuid,
    ) -> Result<EventResponse> {
        let mut ids = vec![event.organizer_id];
        ids.extend_from_slice(&event.participants);
        let profile_map = load_profile_map(&self.db, &ids).await?;
        Ok(assemble(event, filter, &profile_map, current_user))
    }

    async fn to_responses(
        &self,
        events: Vec<Event>,
        current_user: Uuid,
    ) -> Result<Vec<EventResponse>> {
        let mut ids: Vec<Uuid> = Vec::new();
        for event in &events {
            ids.push(event.organizer_id);
            ids.extend_from_slice(&event.participants);
        }
        ids.sort_unstable();
        ids.dedup();
        let profile_map = load_profile_map(&self.db, &ids).await?;

        Ok(events
            .into_iter()
            .map(|e| {
                assemble(
                    e,
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
fn recommendation_request(profile: &UserProfile) -> Option<EventSearchRequest> {
    if profile.interests.is_empty() {
        return None;
    }
    Some(EventSearchRequest {
        tags: profile.interests.clone(),
        ..Default::default()
    })
}

fn assemble(
    event: Event,
    filter: &ParticipantFilterRequest,
    profile_map: &HashMap<Uuid, UserProfile>,
    current_user: Uuid,
) -> EventResponse {
    let organizer = profile_map
        .get(&event.organizer_id)
        .cloned()
        .map(|p| UserProfileResponse::from_profile(p, current_user));
    let participants =
        participant_responses(&event.participants, profile_map, filter, current_user);
    let liked = event.likes.contains(&current_user);

    EventResponse {
        id: event.id,
        organizer,
        name: event.name,
        description: event.description,
        event_time: event.event_time,
        place: event.place,
        tags: event.tags,
        participants,
        like_count: event.likes.len(),
        liked_by_current_user: liked,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_core::models::UserStatus;

    fn profile_with_interests(interests: &[&str]) -> UserProfile {
        UserProfile {
            id: Uuid::new_v4(),
            first_name: None,
            last_name: None,
            description: None,
            status: Some(UserStatus::LookingForTeam),
            skills: vec!["rust".to_string()],
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
        let request =
            recommendation_request(&profile_with_interests(&["ml", "hiking"])).unwrap();
        assert_eq!(
            request.tags,
            vec!["ml".to_string(), "hiking".to_string()]
        );
        assert!(!request.has_name() && !request.has_place() && !request.has_event_time());
        assert!(request.only_my_events.is_none());
    }
}
