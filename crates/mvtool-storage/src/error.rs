//! Storage error types.

/// Errors raised by [`SqliteStore`](crate::SqliteStore) and
/// [`Session`](crate::Session).
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No row of `entity` has the id that was asked for.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A row was rejected before it reached the database.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// The database file could not be opened or configured.
    #[error("connection error: {0}")]
    Connection(String),

    /// Beginning, committing or rolling back failed.
    #[error("transaction error: {0}")]
    Transaction(String),

    /// Creating the tables failed.
    #[error("schema error: {0}")]
    Schema(String),

    #[error("query error: {0}")]
    Query(#[from] rusqlite::Error),

    /// A session invariant was broken, e.g. a key used after its row was
    /// deleted.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Convenience alias used throughout the storage crate.
pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    // -- Constructors --------------------------------------------------------

    /// Creates a [`StorageError::NotFound`] for the given entity kind and id.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a [`StorageError::Validation`] with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    // -- Predicates ----------------------------------------------------------

    /// Returns `true` if this is a [`StorageError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
