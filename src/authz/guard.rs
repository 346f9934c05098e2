//! Authorization guard
//!
//! Every role decision in the service goes through [`allow`]. API handlers
//! call [`require_role`] before touching the store; server-rendered pages call
//! [`render_guard`] and redirect instead of rendering. The page check is only
//! advisory, the handler check is the one that protects data.

use tracing::{debug, warn};

use super::role::Role;
use crate::auth::session::Session;

/// Exact, non-hierarchical role check: an `admin` session does not satisfy a
/// `moderator` requirement and vice versa.
pub fn allow(session: Option<&Session>, required: Role) -> bool {
    matches!(session, Some(s) if s.role == required)
}

/// Why a request was refused by [`require_role`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// No valid session at all
    Unauthenticated,
    /// Valid session holding a different role
    Forbidden,
}

/// Server-side form of the guard, used by every handler that reads or
/// mutates privileged data.
pub fn require_role(session: Option<&Session>, required: Role) -> Result<&Session, Denial> {
    match session {
        None => {
            warn!(required_role = %required, "Access denied: no session");
            Err(Denial::Unauthenticated)
        }
        Some(s) if allow(Some(s), required) => {
            debug!(user_id = %s.id, role = %s.role, "Access granted");
            Ok(s)
        }
        Some(s) => {
            warn!(
                user_id = %s.id,
                role = %s.role,
                required_role = %required,
                "Access denied: role mismatch"
            );
            Err(Denial::Forbidden)
        }
    }
}

/// What a guarded page should do for the current visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome<'a> {
    Render(&'a Session),
    RedirectToSignIn,
    RedirectHome,
}

/// Page-level form of the guard. Shares [`allow`] with the API so both
/// layers can never disagree.
pub fn render_guard(session: Option<&Session>, required: Role) -> GuardOutcome<'_> {
    match session {
        Some(s) if allow(Some(s), required) => GuardOutcome::Render(s),
        Some(_) => GuardOutcome::RedirectHome,
        None => GuardOutcome::RedirectToSignIn,
    }
}
