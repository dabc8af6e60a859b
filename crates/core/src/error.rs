//! Error types for Shelfmark
//!
//! A single `AppError` enum covers every failure the catalog can surface.
//! Errors are classified into three response categories so a transport
//! layer can map them to status codes without inspecting messages:
//! - **BadRequest**: validation failures and business-rule violations
//! - **NotFound**: a referenced entity does not exist
//! - **Internal**: storage faults and programming errors

use std::fmt;
use thiserror::Error;

/// Convenience alias used throughout the workspace
pub type Result<T> = std::result::Result<T, AppError>;

/// Response category an error maps to at the transport boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Client sent something invalid (validation, duplicate, bad parameter)
    BadRequest,
    /// Referenced entity does not exist
    NotFound,
    /// Server-side fault; logged and surfaced generically
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadRequest => write!(f, "Bad Request"),
            Self::NotFound => write!(f, "Not Found"),
            Self::Internal => write!(f, "Internal Error"),
        }
    }
}

/// Main error type for Shelfmark
#[derive(Error, Debug)]
pub enum AppError {
    /// Field-level contract violation (required field, uniqueness, bad reference)
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    /// Business-rule violation detected by the service layer
    #[error("{message}")]
    BadRequest { message: String },

    /// The (parent, child) pair already has an association row.
    ///
    /// Kept distinct from `BadRequest` so the import engine can swallow
    /// exactly this case and nothing else.
    #[error("{child} {child_id} is already associated with {parent} {parent_id}")]
    DuplicateAssociation {
        parent: String,
        parent_id: String,
        child: String,
        child_id: String,
    },

    /// Referenced entity does not exist (by id, or by exact-name lookup
    /// yielding other than one match)
    #[error("Missing {entity} {identifier}")]
    NotFound { entity: String, identifier: String },

    /// A query parameter failed to parse
    #[error("Invalid value for parameter {name}: '{value}'")]
    InvalidParameter { name: String, value: String },

    /// Database operation failed
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    /// Returns the response category for this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation { .. }
            | Self::BadRequest { .. }
            | Self::DuplicateAssociation { .. }
            | Self::InvalidParameter { .. } => ErrorCategory::BadRequest,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Database { .. } | Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns true if this error is the client's fault
    pub fn is_client_error(&self) -> bool {
        !matches!(self.category(), ErrorCategory::Internal)
    }

    /// Helper to create a validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Helper to create a bad-request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Helper to create a not-found error
    pub fn not_found(entity: impl fmt::Display, identifier: impl fmt::Display) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
            identifier: identifier.to_string(),
        }
    }

    /// Helper to create a database error from any error type
    pub fn database<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::Database {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Helper to create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_format() {
        let err = AppError::not_found("Author", "abc-123");
        assert_eq!(err.to_string(), "Missing Author abc-123");
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[test]
    fn test_duplicate_association_message() {
        let err = AppError::DuplicateAssociation {
            parent: "Series".to_string(),
            parent_id: "s-1".to_string(),
            child: "Story".to_string(),
            child_id: "t-1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Story t-1 is already associated with Series s-1"
        );
        assert_eq!(err.category(), ErrorCategory::BadRequest);
    }

    #[test]
    fn test_category_classification() {
        assert_eq!(
            AppError::validation("name", "required").category(),
            ErrorCategory::BadRequest
        );
        assert_eq!(
            AppError::bad_request("nope").category(),
            ErrorCategory::BadRequest
        );
        assert_eq!(
            AppError::internal("boom").category(),
            ErrorCategory::Internal
        );
        assert!(AppError::bad_request("nope").is_client_error());
        assert!(!AppError::internal("boom").is_client_error());
    }

    #[test]
    fn test_invalid_parameter_names_value() {
        let err = AppError::InvalidParameter {
            name: "limit".to_string(),
            value: "abc".to_string(),
        };
        assert!(err.to_string().contains("'abc'"));
    }
}
