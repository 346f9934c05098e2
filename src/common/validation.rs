// Common validation types and traits

/// Minimum accepted password length for registration and reset
pub const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Debug)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

#[derive(Debug)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    pub fn add_error(&mut self, field: &str, message: &str) {
        self.is_valid = false;
        self.errors.push(ValidationError {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    /// Turn an invalid result into `Err(self)` so handlers can use `?`
    pub fn into_result(self) -> Result<(), ValidationResult> {
        if self.is_valid {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub fn require_non_empty(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add_error(field, "is required");
        }
    }

    /// Shallow shape check: exactly one `@` with something on both sides.
    pub fn require_email(&mut self, field: &str, value: &str) {
        let mut parts = value.trim().split('@');
        let valid = matches!(
            (parts.next(), parts.next(), parts.next()),
            (Some(local), Some(domain), None) if !local.is_empty() && !domain.is_empty()
        );
        if !valid {
            self.add_error(field, "must be a valid email address");
        }
    }

    pub fn require_password(&mut self, field: &str, value: &str) {
        if value.chars().count() < MIN_PASSWORD_LENGTH {
            self.add_error(field, "must be at least 6 characters long");
        }
    }
}

pub trait Validator<T> {
    fn validate(&self, data: &T) -> ValidationResult;
}
