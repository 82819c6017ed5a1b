//! Error types for schema declaration and resolution
//!
//! These are the fatal, declaration-time errors. Problems with the data being
//! validated are never reported here; they come back as an
//! [`ErrorTree`](crate::report::ErrorTree).

use thiserror::Error;

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Schema declaration errors
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Undefined validator `{name}'{}", did_you_mean(.suggestion))]
    UndefinedValidator {
        name: String,
        suggestion: Option<String>,
    },

    #[error("Undefined check `{name}'{}", did_you_mean(.suggestion))]
    UndefinedCheck {
        name: String,
        suggestion: Option<String>,
    },

    #[error("'{field}' cannot have checks as it is not a primitive")]
    ChecksOnNonPrimitive { field: String },

    #[error("Malformed check specification: {0}")]
    MalformedCheck(String),

    #[error("Circular reference: {}", .0.join(" -> "))]
    CircularReference(Vec<String>),

    #[error("Schema is not resolved; call `resolve` before validating")]
    NotResolved,

    #[error("Schema failed to resolve with {} errors: {}", .0.len(), join_errors(.0))]
    Unresolved(Vec<SchemaError>),

    #[error("Invalid schema document: {0}")]
    InvalidDocument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl SchemaError {
    /// Collapse a batch of resolution problems into a single error.
    pub(crate) fn from_batch(mut errors: Vec<SchemaError>) -> Option<SchemaError> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(SchemaError::Unresolved(errors)),
        }
    }

    /// Every undefined name mentioned by this error, flattened.
    pub fn undefined_names(&self) -> Vec<&str> {
        match self {
            SchemaError::UndefinedValidator { name, .. }
            | SchemaError::UndefinedCheck { name, .. } => vec![name.as_str()],
            SchemaError::Unresolved(errors) => {
                errors.iter().flat_map(|e| e.undefined_names()).collect()
            }
            _ => Vec::new(),
        }
    }
}

fn did_you_mean(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(" (did you mean `{}'?)", s),
        None => String::new(),
    }
}

fn join_errors(errors: &[SchemaError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
