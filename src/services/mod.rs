// src/services/mod.rs
//
// Shared services used by the feature modules

pub mod email;
pub mod mailer;

// Re-export commonly used types for convenience
pub use mailer::{LogMailer, Mailer, SesMailer};
