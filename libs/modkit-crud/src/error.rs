use sea_orm::DbErr;
use thiserror::Error;

/// Library-local result type.
pub type RepoResult<T> = Result<T, RepoError>;

/// Errors surfaced by the generic repository.
///
/// Store failures are passed through untouched apart from the name of the
/// repository operation that produced them. Nothing is retried.
#[derive(Debug, Error)]
pub enum RepoError {
    /// Caller input rejected before reaching the store
    /// (zero identifier, unknown relation, negative offset, ...).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// No row with the given identifier.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: u64 },

    /// Any failure reported by the store: constraint violation, connectivity,
    /// malformed filter or order expression.
    #[error("{op} failed: {source}")]
    Store {
        op: &'static str,
        #[source]
        source: DbErr,
    },

    #[error("invalid configuration: {0}")]
    Config(#[from] Box<figment::Error>),
}

impl RepoError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub(crate) fn not_found(entity: &str, id: u64) -> Self {
        Self::NotFound {
            entity: entity.to_owned(),
            id,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

impl From<figment::Error> for RepoError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

/// Attach the originating operation to a store error.
pub(crate) trait StoreContext<T> {
    fn store_ctx(self, op: &'static str) -> RepoResult<T>;
}

impl<T> StoreContext<T> for Result<T, DbErr> {
    fn store_ctx(self, op: &'static str) -> RepoResult<T> {
        self.map_err(|source| RepoError::Store { op, source })
    }
}
