//! Service layer: orchestration between the repositories, the in-memory
//! tag passes, and response assembly.

pub mod events;
pub mod profiles;
pub mod projects;

pub use events::EventService;
pub use profiles::ProfileService;
pub use projects::ProjectService;

use std::collections::HashMap;

use tandem_db::Database;
use tandem_core::models::{UserProfile, UserProfileResponse};
use tandem_core::search::ParticipantFilterRequest;
use tandem_core::tags::{filter_by_overlap, TagMatch};
use tandem_core::Result;
use uuid::Uuid;

/// Batch-load the profiles behind a set of ids into a lookup map. Ids with
/// no profile row are simply absent from the map.
pub(crate) async fn load_profile_map(
    db: &Database,
    ids: &[Uuid],
) -> Result<HashMap<Uuid, UserProfile>> {
    let profiles = db.profiles.get_many(ids).await?;
    Ok(profiles.into_iter().map(|p| (p.id, p)).collect())
}

/// Project the participant ids of an aggregate onto responses, applying the
/// optional skill/interest narrowing. Matching direction is stored-contains-
/// query, the same as entity tag search.
pub(crate) fn participant_responses(
    participant_ids: &[Uuid],
    profile_map: &HashMap<Uuid, UserProfile>,
    filter: &ParticipantFilterRequest,
    current_user: Uuid,
) -> Vec<UserProfileResponse> {
    let participants: Vec<UserProfile> = participant_ids
        .iter()
        .filter_map(|id| profile_map.get(id).cloned())
        .collect();

    let participants = filter_by_overlap(
        participants,
        &filter.skills,
        TagMatch::StoredContainsQuery,
        |p| &p.skills,
    );
    let participants = filter_by_overlap(
        participants,
        &filter.interests,
        TagMatch::StoredContainsQuery,
        |p| &p.interests,
    );

    participants
        .into_iter()
        .map(|p| UserProfileResponse::from_profile(p, current_user))
        .collect()
}
