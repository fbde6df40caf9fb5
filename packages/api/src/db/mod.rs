//! # Database module — the datastore collaborator
//!
//! Everything the session manager and the page router need from storage goes
//! through the [`Datastore`] trait, so neither of them knows about SQL. The
//! production implementation is [`SqlStore`] (SQLite through `sqlx`), where
//! every statement binds its arguments; no query text is ever assembled from
//! user input.
//!
//! ## Pool
//!
//! [`connect`] opens a pool from [`DatabaseSettings`](crate::settings::DatabaseSettings)
//! and runs the embedded migrations. The pool is created once by the binary and
//! handed to [`SqlStore`]; it is the only state shared between requests.
//!
//! ## Bounded calls
//!
//! Each [`SqlStore`] call is wrapped in a timeout; a call that exceeds it fails
//! with [`StorageError::Unavailable`](crate::StorageError::Unavailable) instead
//! of blocking the request.

mod pool;
mod sqlite;

use std::future::Future;

pub use pool::{connect, MIGRATOR};
pub use sqlite::SqlStore;

use crate::error::StorageError;
use crate::models::{Album, Image, Session, User};

/// Async interface to users, sessions, albums and images.
pub trait Datastore: Send + Sync {
    /// Exact, case-sensitive username lookup.
    fn user_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Option<User>, StorageError>> + Send;

    fn user_by_id(&self, id: i64) -> impl Future<Output = Result<Option<User>, StorageError>> + Send;

    /// Every user that is not an administrator.
    fn regular_users(&self) -> impl Future<Output = Result<Vec<User>, StorageError>> + Send;

    fn album_by_id(&self, id: i64)
        -> impl Future<Output = Result<Option<Album>, StorageError>> + Send;

    fn albums_for(&self, owner_id: i64)
        -> impl Future<Output = Result<Vec<Album>, StorageError>> + Send;

    /// Images of `album_id` that also belong to `owner_id`.
    fn images_in(
        &self,
        album_id: i64,
        owner_id: i64,
    ) -> impl Future<Output = Result<Vec<Image>, StorageError>> + Send;

    /// Atomically drop every session of `session.user_id` and store `session`.
    fn replace_session(
        &self,
        session: &Session,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn session_by_token(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Option<Session>, StorageError>> + Send;

    /// Returns the number of rows removed.
    fn delete_session(&self, token: &str) -> impl Future<Output = Result<u64, StorageError>> + Send;

    /// Returns the number of rows removed.
    fn delete_sessions_for(
        &self,
        user_id: i64,
    ) -> impl Future<Output = Result<u64, StorageError>> + Send;
}
