// src/admin/mod.rs
//! Role administration: admin-only role changes and the user listing

pub mod handlers;
pub mod models;
pub mod routes;
pub mod service;


pub use routes::admin_routes;
pub use service::{bootstrap_admins, AdminError, RoleStats};
