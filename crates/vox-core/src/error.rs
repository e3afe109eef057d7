//! Error types for the entity model.
//!
//! Binding-level errors (conversion failures, registration and invocation
//! errors) are defined in `vox-framework`.

use thiserror::Error;

/// Errors raised by the scalar converters and entity parsers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntityError {
    /// The input is not a recognised ISO-8601 date, time or datetime.
    #[error("invalid datetime: '{0}'")]
    InvalidDateTime(String),

    /// The input is not a recognised ISO-8601 duration.
    #[error("invalid duration '{input}': {reason}")]
    InvalidDuration {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The input is not one of the recognised on/off spellings.
    #[error("invalid boolean value: '{0}'")]
    InvalidBoolean(String),

    /// The input is neither an ordinal keyword nor an integer.
    #[error("invalid rank: '{0}'")]
    InvalidRank(String),

    /// A string was required but a different JSON type was supplied.
    #[error("expected a string, got {found}")]
    ExpectedString {
        /// JSON type name of the supplied value.
        found: &'static str,
    },

    /// A typed attribute mapping could not be deserialized.
    #[error("invalid attribute: {0}")]
    InvalidAttribute(String),

    /// The input is not a `begin/end` interval.
    #[error("invalid time range '{input}': {reason}")]
    InvalidTimeRange {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The input is not a supported recurring time expression.
    #[error("invalid time set '{input}': {reason}")]
    InvalidTimeSet {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The step unit name is not recognised.
    #[error("unknown step unit: '{0}'")]
    UnknownStepUnit(String),

    /// A datetime computation left the representable range.
    #[error("datetime overflow")]
    Overflow,
}

impl EntityError {
    pub(crate) fn time_range(input: &str, reason: impl Into<String>) -> Self {
        Self::InvalidTimeRange {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn time_set(input: &str, reason: impl Into<String>) -> Self {
        Self::InvalidTimeSet {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// Returns the JSON type name of a value, for error messages.
pub fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Result type for entity operations.
pub type EntityResult<T> = Result<T, EntityError>;
