//! Shared error type for Colloquy

use thiserror::Error;

/// Errors surfaced by every Colloquy component
///
/// Components never recover locally; the caller decides how to present the
/// failure. The only defaulting in the crate is the zero sum for empty
/// aggregation groups, which is not an error path.
#[derive(Error, Debug)]
pub enum ColloquyError {
    /// Referenced user, question, answer or tag does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Caller supplied a value outside the accepted domain
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Underlying persistence is unreachable or rejected the operation
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Startup configuration is inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ColloquyError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::InvalidArgument(_) => 400,
            Self::StoreUnavailable(_) => 503,
            Self::Config(_) | Self::Io(_) => 500,
        }
    }
}

impl From<mongodb::error::Error> for ColloquyError {
    fn from(e: mongodb::error::Error) -> Self {
        Self::StoreUnavailable(e.to_string())
    }
}

impl From<bson::oid::Error> for ColloquyError {
    fn from(e: bson::oid::Error) -> Self {
        Self::InvalidArgument(format!("malformed object id: {}", e))
    }
}

pub type Result<T> = std::result::Result<T, ColloquyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ColloquyError::not_found("user", "u1").status_code(), 404);
        assert_eq!(ColloquyError::InvalidArgument("x".into()).status_code(), 400);
        assert_eq!(ColloquyError::StoreUnavailable("down".into()).status_code(), 503);
    }

    #[test]
    fn test_not_found_message() {
        let err = ColloquyError::not_found("question", "abc");
        assert_eq!(err.to_string(), "question not found: abc");
    }

    #[test]
    fn test_malformed_object_id() {
        let err: ColloquyError = bson::oid::ObjectId::parse_str("nope").unwrap_err().into();
        assert!(matches!(err, ColloquyError::InvalidArgument(_)));
    }
}
