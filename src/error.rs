//! Crate-level error type

use crate::forms::ValidationError;
use crate::store::StoreError;

/// What a user sees when a collection cannot be read or written
pub const STORAGE_FAILURE: &str = "Could not save or read data, please try again";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
}

impl Error {
    /// Message safe to show to whoever submitted the form.
    /// Storage failures collapse to a generic message; the detail goes to the log.
    pub fn user_message(&self) -> String {
        match self {
            Error::Store(_) => STORAGE_FAILURE.to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_are_generic_for_users() {
        let err = Error::Store(StoreError::Io {
            path: "/nope/checkins.json".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        });
        assert!(!err.user_message().contains("/nope"));
        assert!(err.to_string().contains("/nope/checkins.json"));
    }

    #[test]
    fn test_validation_errors_pass_through() {
        let err = Error::from(ValidationError::MissingProblemDescription);
        assert_eq!(err.user_message(), err.to_string());
    }
}
