//! Path-based authorization policy.
//!
//! Rules are evaluated first-match-wins over an ordered table, so the
//! specific role-gated paths are listed before the broad authenticated
//! prefix. Anything the table does not cover is permitted; the handler
//! layer still decides what such routes expose.

use crate::error::{Error, Result};
use crate::identity::Principal;

pub const ROLE_USER: &str = "ROLE_USER";
pub const ROLE_ADMIN: &str = "ROLE_ADMIN";
pub const ROLE_ROOT: &str = "ROLE_ROOT";

/// Access requirement for a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessRule {
    /// No credential required.
    Public,
    /// Any authenticated principal.
    Authenticated,
    /// Authenticated principal holding this exact role name.
    Role(&'static str),
}

/// Paths reachable without a credential: health/docs surfaces plus the
/// login and OIDC callback machinery.
const PUBLIC_PREFIXES: &[&str] = &["/health", "/docs", "/openapi", "/error", "/login", "/oauth2/"];

/// Map a request path to its access requirement.
pub fn decide(path: &str) -> AccessRule {
    if path == "/" || PUBLIC_PREFIXES.iter().any(|p| path.starts_with(p)) {
        return AccessRule::Public;
    }
    if let Some(rest) = path.strip_prefix("/api/security/") {
        match rest.split('/').next() {
            Some("user") => return AccessRule::Role(ROLE_USER),
            Some("admin") => return AccessRule::Role(ROLE_ADMIN),
            Some("root") => return AccessRule::Role(ROLE_ROOT),
            _ => {}
        }
    }
    if path.starts_with("/api/") {
        return AccessRule::Authenticated;
    }
    AccessRule::Public
}

/// Enforce the rule for `path` against an optionally-present principal.
///
/// Distinguishes the two failure modes: no credential at all versus an
/// authenticated caller lacking the required role.
pub fn authorize(path: &str, principal: Option<&Principal>) -> Result<()> {
    match decide(path) {
        AccessRule::Public => Ok(()),
        AccessRule::Authenticated => match principal {
            Some(_) => Ok(()),
            None => Err(Error::IdentityExtraction(
                "authentication required".to_string(),
            )),
        },
        AccessRule::Role(role) => match principal {
            Some(p) if p.has_role(role) => Ok(()),
            Some(_) => Err(Error::AccessDenied(format!("requires {role}"))),
            None => Err(Error::IdentityExtraction(
                "authentication required".to_string(),
            )),
        },
    }
}
