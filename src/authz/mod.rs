//! # Authorization Module
//!
//! Role model and the single authorization predicate shared by API handlers
//! and server-rendered pages.

pub mod guard;
pub mod role;


pub use guard::{allow, render_guard, require_role, Denial, GuardOutcome};
pub use role::{Role, UnknownRole};
