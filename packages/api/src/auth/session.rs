//! # Session manager
//!
//! [`SessionManager`] turns credentials into sessions and session tokens back
//! into users:
//!
//! | Method | Does |
//! |--------|------|
//! | [`validate_credentials`](SessionManager::validate_credentials) | username lookup + Argon2 verification |
//! | [`issue_session`](SessionManager::issue_session) | new random token, replacing any earlier session of the user |
//! | [`resolve_session`](SessionManager::resolve_session) | token → user, deleting the row once it is older than the TTL |
//! | [`revoke_session`](SessionManager::revoke_session) | delete every session of a user |
//! | [`login`](SessionManager::login) / [`authenticate`](SessionManager::authenticate) / [`end_session`](SessionManager::end_session) | the three request-level entry points used by the HTTP layer |
//!
//! ## One session per user
//!
//! Issuing and revoking for the same user are serialised by a per-user async
//! lock, and the replacement itself is a single transaction in the datastore.
//! Two racing logins therefore run one after the other and only the second
//! token survives.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::TimeDelta;
use rand::rngs::OsRng;
use rand::RngCore;
use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

use super::clock::{Clock, SystemClock};
use super::context::AuthContext;
use super::password::Passwords;
use crate::db::Datastore;
use crate::error::{AuthError, StorageError};
use crate::models::{Session, User};

/// Verified instead of a real hash when the username is unknown, so both
/// failure paths cost one Argon2 run.
const DECOY_PASSWORD: &str = "photobook-decoy-password";

pub struct SessionManager<S> {
    store: S,
    passwords: Passwords,
    ttl: TimeDelta,
    clock: Arc<dyn Clock>,
    user_locks: Mutex<HashMap<i64, Arc<AsyncMutex<()>>>>,
    decoy_hash: String,
}

impl<S> std::fmt::Debug for SessionManager<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("ttl", &self.ttl)
            .field("passwords", &self.passwords)
            .finish_non_exhaustive()
    }
}

/// 128 random bits from the OS, written as a hyphenated UUID.
fn new_token() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    Uuid::from_bytes(bytes).hyphenated().to_string()
}

impl<S: Datastore> SessionManager<S> {
    pub fn new(store: S, passwords: Passwords, ttl: TimeDelta) -> Result<Self, AuthError> {
        let decoy_hash = passwords.hash(DECOY_PASSWORD)?;
        Ok(Self {
            store,
            passwords,
            ttl,
            clock: Arc::new(SystemClock),
            user_locks: Mutex::new(HashMap::new()),
            decoy_hash,
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn passwords(&self) -> &Passwords {
        &self.passwords
    }

    /// Check a username/password pair.
    ///
    /// `UnknownUser` and `BadPassword` are distinct here for logging; show
    /// callers [`AuthError::public_message`] only.
    pub async fn validate_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let user = self.store.user_by_username(username).await?;
        let hash = match &user {
            Some(user) => user.password_hash.clone(),
            None => self.decoy_hash.clone(),
        };
        let matches = match self.verify(password, hash).await {
            Ok(matches) => matches,
            // an unreadable stored hash must look like any other wrong password
            Err(AuthError::Hashing(reason)) if user.is_some() => {
                tracing::error!(
                    user_id = user.as_ref().map(|u| u.id),
                    %reason,
                    "stored password hash unusable"
                );
                false
            }
            Err(e) => return Err(e),
        };

        match user {
            None => {
                tracing::warn!(username, "login rejected: unknown user");
                Err(AuthError::UnknownUser)
            }
            Some(user) if !matches => {
                tracing::warn!(user_id = user.id, "login rejected: bad password");
                Err(AuthError::BadPassword)
            }
            Some(user) => Ok(user),
        }
    }

    /// Start a new session for `user`, ending any earlier one.
    pub async fn issue_session(&self, user: &User) -> Result<Session, AuthError> {
        let session = self
            .serialized(user.id, move || async move {
                let session = Session {
                    token: new_token(),
                    user_id: user.id,
                    created_at: self.clock.now(),
                };
                self.store.replace_session(&session).await?;
                Ok::<_, StorageError>(session)
            })
            .await?;
        tracing::info!(user_id = user.id, "session issued");
        Ok(session)
    }

    /// Look up the user behind `token`.
    pub async fn resolve_session(&self, token: &str) -> Result<User, AuthError> {
        let session = self
            .store
            .session_by_token(token)
            .await?
            .ok_or(AuthError::NotFound)?;

        if session.is_expired(self.clock.now(), self.ttl) {
            self.store.delete_session(token).await?;
            tracing::debug!(user_id = session.user_id, "session expired");
            return Err(AuthError::Expired);
        }

        self.store
            .user_by_id(session.user_id)
            .await?
            .ok_or(AuthError::NotFound)
    }

    /// Delete every session of `user_id`. Returns how many were removed.
    pub async fn revoke_session(&self, user_id: i64) -> Result<u64, AuthError> {
        let removed = self
            .serialized(user_id, move || self.store.delete_sessions_for(user_id))
            .await?;
        tracing::info!(user_id, removed, "sessions revoked");
        Ok(removed)
    }

    /// Validate credentials and issue a session in one step.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(Session, AuthContext), AuthError> {
        let user = self.validate_credentials(username, password).await?;
        let session = self.issue_session(&user).await?;
        let ctx = AuthContext::for_session(user, session.token.clone());
        Ok((session, ctx))
    }

    /// Build the request context from an optional session token.
    ///
    /// Missing, unknown and expired tokens all give an anonymous context;
    /// only storage failures are errors.
    pub async fn authenticate(&self, token: Option<&str>) -> Result<AuthContext, StorageError> {
        let Some(token) = token else {
            return Ok(AuthContext::anonymous());
        };

        match self.resolve_session(token).await {
            Ok(user) => Ok(AuthContext::for_session(user, token.to_string())),
            Err(AuthError::Storage(e)) => Err(e),
            Err(e) => {
                tracing::debug!(error = %e, "session not usable, continuing anonymously");
                Ok(AuthContext::anonymous())
            }
        }
    }

    /// Revoke all sessions of whoever owns `token`, expired or not.
    pub async fn end_session(&self, token: &str) -> Result<Option<i64>, AuthError> {
        let Some(session) = self.store.session_by_token(token).await? else {
            return Ok(None);
        };
        self.revoke_session(session.user_id).await?;
        Ok(Some(session.user_id))
    }

    async fn verify(&self, password: &str, hash: String) -> Result<bool, AuthError> {
        let passwords = self.passwords.clone();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || passwords.verify(&password, &hash))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
    }

    async fn serialized<T, F, Fut>(&self, user_id: i64, op: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let lock = self.locks().entry(user_id).or_default().clone();
        let out = {
            let _guard = lock.lock().await;
            op().await
        };

        let mut locks = self.locks();
        // the map and `lock` are the last two owners: nobody is waiting
        if Arc::strong_count(&lock) == 2 {
            locks.remove(&user_id);
        }
        out
    }

    fn locks(&self) -> MutexGuard<'_, HashMap<i64, Arc<AsyncMutex<()>>>> {
        self.user_locks.lock().unwrap_or_else(|e| e.into_inner())
    }
}
