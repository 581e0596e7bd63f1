//! Identity extraction: two upstream credential shapes resolved into one
//! canonical [`Principal`].
//!
//! Bearer-token clients arrive with signed JWT claims; browser clients arrive
//! with OIDC session claims captured at login. Both are folded into the same
//! `Principal` value once per request, so ownership checks, "mine only"
//! filtering, and recommendations never branch on which path authenticated
//! the caller.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Custom multi-valued claim carrying role grants. The name is part of the
/// contract with the identity provider.
pub const ROLES_CLAIM: &str = "spring_sec_roles";

/// Reserved marker on entries of [`ROLES_CLAIM`]; entries without it are
/// ignored.
pub const ROLE_PREFIX: &str = "ROLE_";

/// Prefix applied to authorities derived from the token's `scope` claim.
pub const SCOPE_PREFIX: &str = "SCOPE_";

/// Claims carried by a signed bearer token (resource-server path).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject id. Required; extraction fails without it.
    pub sub: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Display name (`name` claim).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Space-separated OAuth scopes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, rename = "spring_sec_roles")]
    pub roles: Vec<String>,
}

/// Claims captured from an OIDC login session (ID token subject + userinfo).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionClaims {
    /// ID-token subject. Required; extraction fails without it.
    pub sub: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
    #[serde(default, rename = "spring_sec_roles")]
    pub roles: Vec<String>,
}

/// Exactly one of the two upstream credential shapes.
#[derive(Debug, Clone)]
pub enum CredentialClaims {
    BearerToken(TokenClaims),
    OidcSession(SessionClaims),
}

/// Canonical request-scoped identity. Constructed once per request by
/// [`extract`], immutable, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Opaque stable subject id; identical for a user across both
    /// credential paths.
    pub user_id: String,
    pub username: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    /// Deduplicated, case-sensitive role set: union of scope-derived
    /// authorities (`SCOPE_*`) and custom-claim roles (`ROLE_*`).
    pub roles: BTreeSet<String>,
}

impl Principal {
    /// Parse the subject into the UUID used as the profile primary key.
    pub fn user_uuid(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.user_id)
            .map_err(|_| Error::InvalidInput(format!("subject is not a UUID: {}", self.user_id)))
    }

    /// Exact role-name membership check (no prefix matching).
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

/// Resolve one of the two credential shapes into a [`Principal`].
///
/// A missing or empty subject id is a hard failure; no other claim is
/// required.
pub fn extract(claims: CredentialClaims) -> Result<Principal> {
    match claims {
        CredentialClaims::BearerToken(token) => {
            let user_id = require_subject(token.sub.as_deref())?;
            let roles = scope_authorities(token.scope.as_deref())
                .chain(prefixed_roles(&token.roles))
                .collect();
            Ok(Principal {
                user_id,
                username: token.preferred_username,
                email: token.email,
                full_name: token.name,
                roles,
            })
        }
        CredentialClaims::OidcSession(session) => {
            let user_id = require_subject(session.sub.as_deref())?;
            let full_name = session
                .name
                .as_deref()
                .filter(|n| !n.trim().is_empty())
                .map(str::to_string)
                .or_else(|| join_name_parts(session.given_name.as_deref(), session.family_name.as_deref()));
            Ok(Principal {
                user_id,
                username: session.preferred_username,
                email: session.email,
                full_name,
                roles: prefixed_roles(&session.roles).collect(),
            })
        }
    }
}

fn require_subject(sub: Option<&str>) -> Result<String> {
    match sub {
        Some(s) if !s.trim().is_empty() => Ok(s.to_string()),
        _ => Err(Error::IdentityExtraction(
            "missing subject claim".to_string(),
        )),
    }
}

/// Authorities derived from a space-separated `scope` claim, as `SCOPE_<s>`.
fn scope_authorities(scope: Option<&str>) -> impl Iterator<Item = String> + '_ {
    scope
        .unwrap_or_default()
        .split_whitespace()
        .map(|s| format!("{SCOPE_PREFIX}{s}"))
        .collect::<Vec<_>>()
        .into_iter()
}

/// Custom-claim entries carrying the reserved role marker; all others are
/// ignored.
fn prefixed_roles(entries: &[String]) -> impl Iterator<Item = String> + '_ {
    entries
        .iter()
        .filter(|r| r.starts_with(ROLE_PREFIX))
        .cloned()
}

/// Join given/family name from whichever parts are present. Both absent
/// yields `None`.
fn join_name_parts(given: Option<&str>, family: Option<&str>) -> Option<String> {
    let joined = [given, family]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_claims() -> TokenClaims {
        TokenClaims {
            sub: Some("5f0e8f60-3f9f-4a1e-b0a1-2d8f6f1c9a11".to_string()),
            preferred_username: Some("ada".to_string()),
            email: Some("ada@example.com".to_string()),
            name: Some("Ada Lovelace".to_string()),
            scope: Some("profile email".to_string()),
            roles: vec![
                "ROLE_USER".to_string(),
                "offline_access".to_string(),
                "ROLE_ADMIN".to_string(),
            ],
        }
    }

    #[test]
    fn test_token_extraction_full() {
        let p = extract(CredentialClaims::BearerToken(token_claims())).unwrap();
        assert_eq!(p.user_id, "5f0e8f60-3f9f-4a1e-b0a1-2d8f6f1c9a11");
        assert_eq!(p.username.as_deref(), Some("ada"));
        assert_eq!(p.email.as_deref(), Some("ada@example.com"));
        assert_eq!(p.full_name.as_deref(), Some("Ada Lovelace"));
    }

    #[test]
    fn test_token_roles_union_and_filtering() {
        let p = extract(CredentialClaims::BearerToken(token_claims())).unwrap();
        assert!(p.has_role("ROLE_USER"));
        assert!(p.has_role("ROLE_ADMIN"));
        assert!(p.has_role("SCOPE_profile"));
        assert!(p.has_role("SCOPE_email"));
        // Unprefixed custom-claim entries are not roles.
        assert!(!p.has_role("offline_access"));
        assert_eq!(p.roles.len(), 4);
    }

    #[test]
    fn test_token_roles_deduplicated() {
        let mut claims = token_claims();
        claims.roles.push("ROLE_USER".to_string());
        let p = extract(CredentialClaims::BearerToken(claims)).unwrap();
        assert_eq!(p.roles.iter().filter(|r| *r == "ROLE_USER").count(), 1);
    }

    #[test]
    fn test_roles_are_case_sensitive() {
        let claims = TokenClaims {
            sub: Some("u1".to_string()),
            roles: vec!["role_user".to_string()],
            ..Default::default()
        };
        let p = extract(CredentialClaims::BearerToken(claims)).unwrap();
        assert!(p.roles.is_empty());
    }

    #[test]
    fn test_token_missing_subject_fails() {
        let claims = TokenClaims {
            sub: None,
            ..token_claims()
        };
        let err = extract(CredentialClaims::BearerToken(claims)).unwrap_err();
        assert!(matches!(err, Error::IdentityExtraction(_)));
    }

    #[test]
    fn test_blank_subject_fails() {
        let claims = TokenClaims {
            sub: Some("   ".to_string()),
            ..token_claims()
        };
        let err = extract(CredentialClaims::BearerToken(claims)).unwrap_err();
        assert!(matches!(err, Error::IdentityExtraction(_)));
    }

    #[test]
    fn test_extracted_user_id_never_empty() {
        // Property: extraction either fails or yields a non-empty user_id.
        for sub in [None, Some(""), Some(" "), Some("abc")] {
            let claims = TokenClaims {
                sub: sub.map(str::to_string),
                ..Default::default()
            };
            match extract(CredentialClaims::BearerToken(claims)) {
                Ok(p) => assert!(!p.user_id.is_empty()),
                Err(e) => assert!(matches!(e, Error::IdentityExtraction(_))),
            }
        }
    }

    #[test]
    fn test_session_extraction_prefers_userinfo_name() {
        let claims = SessionClaims {
            sub: Some("u2".to_string()),
            name: Some("Grace Hopper".to_string()),
            given_name: Some("Grace".to_string()),
            family_name: Some("Murray".to_string()),
            email: Some("grace@example.com".to_string()),
            preferred_username: Some("grace".to_string()),
            roles: vec!["ROLE_USER".to_string()],
        };
        let p = extract(CredentialClaims::OidcSession(claims)).unwrap();
        assert_eq!(p.full_name.as_deref(), Some("Grace Hopper"));
        assert_eq!(p.username.as_deref(), Some("grace"));
        assert!(p.has_role("ROLE_USER"));
    }

    #[test]
    fn test_session_name_joined_from_parts() {
        let claims = SessionClaims {
            sub: Some("u2".to_string()),
            given_name: Some("Grace".to_string()),
            family_name: Some("Hopper".to_string()),
            ..Default::default()
        };
        let p = extract(CredentialClaims::OidcSession(claims)).unwrap();
        assert_eq!(p.full_name.as_deref(), Some("Grace Hopper"));
    }

    #[test]
    fn test_session_name_tolerates_missing_parts() {
        let only_given = SessionClaims {
            sub: Some("u2".to_string()),
            given_name: Some("Grace".to_string()),
            ..Default::default()
        };
        let p = extract(CredentialClaims::OidcSession(only_given)).unwrap();
        assert_eq!(p.full_name.as_deref(), Some("Grace"));

        let neither = SessionClaims {
            sub: Some("u2".to_string()),
            ..Default::default()
        };
        let p = extract(CredentialClaims::OidcSession(neither)).unwrap();
        assert_eq!(p.full_name, None);
    }

    #[test]
    fn test_session_missing_subject_fails() {
        let err = extract(CredentialClaims::OidcSession(SessionClaims::default())).unwrap_err();
        assert!(matches!(err, Error::IdentityExtraction(_)));
    }

    #[test]
    fn test_both_paths_yield_same_shape() {
        // Same subject through either path resolves to the same user_id.
        let token = TokenClaims {
            sub: Some("11111111-2222-3333-4444-555555555555".to_string()),
            ..Default::default()
        };
        let session = SessionClaims {
            sub: Some("11111111-2222-3333-4444-555555555555".to_string()),
            ..Default::default()
        };
        let a = extract(CredentialClaims::BearerToken(token)).unwrap();
        let b = extract(CredentialClaims::OidcSession(session)).unwrap();
        assert_eq!(a.user_id, b.user_id);
        assert_eq!(a.user_uuid().unwrap(), b.user_uuid().unwrap());
    }

    #[test]
    fn test_user_uuid_rejects_non_uuid_subject() {
        let p = extract(CredentialClaims::BearerToken(TokenClaims {
            sub: Some("not-a-uuid".to_string()),
            ..Default::default()
        }))
        .unwrap();
        assert!(matches!(p.user_uuid(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_claims_deserialize_from_provider_json() {
        let json = r#"{
            "sub": "abc",
            "preferred_username": "ada",
            "scope": "profile",
            "spring_sec_roles": ["ROLE_USER", "uma_authorization"]
        }"#;
        let claims: TokenClaims = serde_json::from_str(json).unwrap();
        let p = extract(CredentialClaims::BearerToken(claims)).unwrap();
        assert!(p.has_role("ROLE_USER"));
        assert!(!p.has_role("uma_authorization"));
    }
}
