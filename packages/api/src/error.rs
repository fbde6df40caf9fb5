//! # Error taxonomy
//!
//! | Enum | Raised by | Surface |
//! |------|-----------|---------|
//! | [`StorageError`] | [`crate::db`] | generic failure page, logged |
//! | [`AuthError`] | [`crate::auth`] | one "invalid username or password" message for every credential failure |
//! | [`RouteError`] | [`crate::router`] | redirect to the login page (401 for JSON callers) |

/// Datastore failures. Never fatal for the process, only for the request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("datastore unavailable: {0}")]
    Unavailable(String),
    #[error("query failed: {0}")]
    QueryFailed(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StorageError::Unavailable(e.to_string())
            }
            other => StorageError::QueryFailed(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StorageError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        StorageError::QueryFailed(e.to_string())
    }
}

/// Authentication and session failures.
///
/// `UnknownUser` and `BadPassword` are kept apart for logs only; clients see
/// [`AuthError::public_message`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("unknown user")]
    UnknownUser,
    #[error("bad password")]
    BadPassword,
    #[error("session expired")]
    Expired,
    #[error("session not found")]
    NotFound,
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl AuthError {
    /// Message safe to show to the caller.
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::UnknownUser | AuthError::BadPassword => "Invalid username or password",
            AuthError::Expired | AuthError::NotFound => "Please log in again",
            AuthError::Hashing(_) | AuthError::Storage(_) => "Something went wrong",
        }
    }

    /// True for failures caused by what the caller sent rather than by the server.
    pub fn is_credential_failure(&self) -> bool {
        matches!(self, AuthError::UnknownUser | AuthError::BadPassword)
    }
}

/// Navigation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("unauthorized")]
    Unauthorized,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_failures_share_public_message() {
        assert_eq!(
            AuthError::UnknownUser.public_message(),
            AuthError::BadPassword.public_message()
        );
        assert!(AuthError::UnknownUser.is_credential_failure());
        assert!(!AuthError::Expired.is_credential_failure());
    }

    #[test]
    fn test_pool_timeout_is_unavailable() {
        let err = StorageError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, StorageError::Unavailable(_)));

        let err = StorageError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StorageError::QueryFailed(_)));
    }
}
