//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the label prefix is a single path segment
//! - Check constraints use a known key and a value
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: Settings → Result<(), Vec<ValidationError>>
//! - The default rule template is not checked here; a broken template only
//!   disables default routers

use std::fmt;

use crate::config::schema::Settings;
use crate::constraints::TAG_KEY;

/// A semantic problem in the settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

pub fn validate_settings(settings: &Settings) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let provider = &settings.provider;

    if provider.prefix.is_empty() {
        errors.push(ValidationError::new("provider.prefix", "must not be empty"));
    } else if provider.prefix.contains('.') {
        errors.push(ValidationError::new("provider.prefix", "must not contain '.'"));
    }

    for (i, constraint) in provider.constraints.iter().enumerate() {
        let field = format!("provider.constraints[{}]", i);
        if constraint.key != TAG_KEY {
            errors.push(ValidationError::new(
                &field,
                format!("unknown key {:?}, only {:?} is supported", constraint.key, TAG_KEY),
            ));
        }
        if constraint.value.is_empty() {
            errors.push(ValidationError::new(&field, "value must not be empty"));
        }
    }

    if settings.watch.poll_interval_secs == 0 {
        errors.push(ValidationError::new("watch.poll_interval_secs", "must be greater than 0"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
