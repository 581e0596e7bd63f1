//! HTTP handlers, grouped per entity.

pub mod events;
pub mod profiles;
pub mod projects;
pub mod security;

use serde::Deserialize;

use tandem_core::search::ParticipantFilterRequest;

/// Query-string form of the participant filter: comma-separated lists, since
/// the values arrive in a URL rather than a JSON body.
#[derive(Debug, Default, Deserialize)]
pub struct ParticipantFilterParams {
    pub skills: Option<String>,
    pub interests: Option<String>,
}

fn split_csv(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl From<ParticipantFilterParams> for ParticipantFilterRequest {
    fn from(params: ParticipantFilterParams) -> Self {
        ParticipantFilterRequest {
            skills: split_csv(params.skills.as_deref()),
            interests: split_csv(params.interests.as_deref()),
        }
    }
}
