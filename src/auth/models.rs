//! Authentication request payloads
//!
//! Missing string fields deserialize as empty so validation can answer with
//! a 400 and a readable message.

use serde::Deserialize;

use crate::common::{ValidationResult, Validator};

/// POST /api/register body
#[derive(Deserialize, Debug)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// POST /api/auth/login body
#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// POST /api/reset body
#[derive(Deserialize, Debug)]
pub struct ResetRequest {
    #[serde(default)]
    pub email: String,
}

/// POST /api/reset/:token body
#[derive(Deserialize, Debug)]
pub struct CompleteResetRequest {
    #[serde(default)]
    pub password: String,
}

/// Query string of the OAuth callback
#[derive(Deserialize, Debug, Default)]
pub struct OAuthCallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

pub struct RegisterValidator;

impl Validator<RegisterRequest> for RegisterValidator {
    fn validate(&self, data: &RegisterRequest) -> ValidationResult {
        let mut result = ValidationResult::new();
        result.require_non_empty("name", &data.name);
        result.require_email("email", &data.email);
        result.require_password("password", &data.password);
        result
    }
}

pub struct LoginValidator;

impl Validator<LoginRequest> for LoginValidator {
    fn validate(&self, data: &LoginRequest) -> ValidationResult {
        let mut result = ValidationResult::new();
        result.require_non_empty("email", &data.email);
        result.require_non_empty("password", &data.password);
        result
    }
}
