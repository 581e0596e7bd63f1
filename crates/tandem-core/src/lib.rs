//! # tandem-core
//!
//! Core types and domain logic for the tandem collaboration backend.
//!
//! This crate provides identity extraction, the authorization policy, the
//! domain model, search request shapes, and the tag overlap filter that the
//! db and api crates build on.

pub mod error;
pub mod identity;
pub mod logging;
pub mod models;
pub mod policy;
pub mod search;
pub mod tags;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use identity::{extract, CredentialClaims, Principal, SessionClaims, TokenClaims};
pub use models::*;
pub use policy::{authorize, decide, AccessRule};
pub use search::{
    EventSearchRequest, ParticipantFilterRequest, ProjectSearchRequest, UserProfileSearchRequest,
};
pub use tags::{filter_by_overlap, overlaps, TagMatch};
