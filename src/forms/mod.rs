//! Form definitions gating every write to the client record store.

use serde::Serialize;
use validator::ValidationErrors;

use crate::domain::types::TypeConstraintError;

pub mod client;

/// A single violated rule, addressed to form-level feedback.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    /// Field the violation belongs to.
    pub field: String,
    /// Stable machine-readable code (`tax_id_checksum`, `length`, ...).
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

impl FieldError {
    pub fn new(
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }

    /// Converts a value-object constraint failure into a field error.
    pub fn from_constraint(field: &str, err: &TypeConstraintError) -> Self {
        let code = match err {
            TypeConstraintError::MalformedTaxId => "tax_id_format",
            TypeConstraintError::TaxIdChecksum => "tax_id_checksum",
            TypeConstraintError::InvalidEmail => "email",
            TypeConstraintError::InvalidPhone => "phone",
            TypeConstraintError::InvalidUrl => "url",
            TypeConstraintError::EmptyString => "required",
            TypeConstraintError::TooLong(_) => "length",
            TypeConstraintError::NonPositiveId => "id",
        };
        Self::new(field, code, err.to_string())
    }
}

/// Flattens `validator` output into an ordered list of field errors.
///
/// `validator` collects violations per field in a map; callers pass the
/// form's declaration order so the result is deterministic and every
/// simultaneous violation is surfaced, never only the first.
pub fn flatten_errors(errors: &ValidationErrors, field_order: &[&str]) -> Vec<FieldError> {
    let by_field = errors.field_errors();
    let mut flat = Vec::new();
    for field in field_order {
        if let Some(violations) = by_field.get(*field) {
            for violation in violations.iter() {
                let message = violation
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("invalid value for {field}"));
                flat.push(FieldError::new(*field, violation.code.to_string(), message));
            }
        }
    }
    flat
}
