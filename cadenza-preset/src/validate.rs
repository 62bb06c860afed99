//! Field-level validation errors

use thiserror::Error;

/// A field holding a value outside the canonical model's ranges
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field}: {value}")]
pub struct ValidationError {
    /// Name of the offending field
    pub field: &'static str,
    /// Offending value, rendered for diagnostics
    pub value: String,
}

impl ValidationError {
    pub fn new(field: &'static str, value: impl ToString) -> Self {
        Self {
            field,
            value: value.to_string(),
        }
    }
}
