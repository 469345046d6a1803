//! Error taxonomy of the data layer.

use mvtool_core::validation::ValidationError;
use mvtool_jira::JiraError;
use mvtool_storage::StorageError;

/// Errors raised by imports and record services.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// The caller sent something unusable, e.g. a record without a parent.
    #[error("{message}")]
    ClientInput { message: String },

    /// A referenced row or external entity does not exist.
    #[error("No {kind} with {field}={value}.")]
    NotFound {
        kind: String,
        field: &'static str,
        value: String,
    },

    /// Jira failed for a reason other than a missing or hidden entity.
    #[error(transparent)]
    External(#[from] JiraError),

    #[error(transparent)]
    Storage(StorageError),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DataError>;

impl DataError {
    // -- Constructors --------------------------------------------------------

    pub fn client_input(message: impl Into<String>) -> Self {
        Self::ClientInput {
            message: message.into(),
        }
    }

    pub fn not_found(kind: impl Into<String>, field: &'static str, value: impl ToString) -> Self {
        Self::NotFound {
            kind: kind.into(),
            field,
            value: value.to_string(),
        }
    }

    // -- Predicates ----------------------------------------------------------

    pub fn is_client_input(&self) -> bool {
        matches!(self, Self::ClientInput { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// HTTP-style status code for the error class.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::ClientInput { .. } => 400,
            Self::NotFound { .. } => 404,
            Self::External(_) => 502,
            Self::Storage(_) => 500,
        }
    }
}

impl From<StorageError> for DataError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { entity, id } => Self::NotFound {
                kind: entity,
                field: "id",
                value: id,
            },
            StorageError::Validation { message } => Self::ClientInput { message },
            other => Self::Storage(other),
        }
    }
}

impl From<ValidationError> for DataError {
    fn from(err: ValidationError) -> Self {
        Self::client_input(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn storage_not_found_names_kind_and_id() {
        let err = DataError::from(StorageError::not_found("catalog module", "5"));
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "No catalog module with id=5.");
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn status_codes_by_class() {
        assert_eq!(DataError::client_input("bad").status_code(), 400);
        assert_eq!(DataError::from(JiraError::status(500)).status_code(), 502);
        assert_eq!(
            DataError::from(StorageError::Internal("boom".into())).status_code(),
            500
        );
    }

    #[test]
    fn validation_errors_are_client_input() {
        let err = DataError::from(ValidationError::Required { field: "title" });
        assert!(err.is_client_input());
        assert_eq!(err.to_string(), "title is required");
    }
}
