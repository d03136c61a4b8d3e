use serde::Serialize;

use crate::utils::is_object_id;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Shape checks run on request bodies before they reach a service.
pub trait Validate {
    fn validate(&self) -> Result<(), Vec<FieldError>>;
}

/// Accumulates every offending field instead of stopping at the first.
#[derive(Debug, Default)]
pub struct Violations(Vec<FieldError>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, ok: bool, field: impl Into<String>, message: impl Into<String>) {
        if !ok {
            self.0.push(FieldError {
                field: field.into(),
                message: message.into(),
            });
        }
    }

    pub fn not_blank(&mut self, value: &str, field: &str) {
        self.check(!value.trim().is_empty(), field, format!("{field} should not be empty"));
    }

    pub fn in_range(&mut self, value: i32, min: i32, max: i32, field: &str) {
        self.check(
            (min..=max).contains(&value),
            field,
            format!("{field} must be between {min} and {max}"),
        );
    }

    pub fn object_id(&mut self, value: &str, field: impl Into<String>) {
        let field = field.into();
        let message = format!("{field} must be a valid ID");
        self.check(is_object_id(value), field, message);
    }

    pub fn nest(&mut self, prefix: &str, inner: Result<(), Vec<FieldError>>) {
        if let Err(errors) = inner {
            self.0.extend(errors.into_iter().map(|e| FieldError {
                field: format!("{prefix}.{}", e.field),
                message: e.message,
            }));
        }
    }

    pub fn finish(self) -> Result<(), Vec<FieldError>> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self.0)
        }
    }
}
