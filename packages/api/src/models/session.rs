//! # Session record
//!
//! One row of the `session` table: an opaque token, the user it belongs to
//! and the moment it was issued. Validity is purely a function of age, see
//! [`Session::is_expired`].

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// A session stays valid while `now - created_at <= ttl`.
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: TimeDelta) -> bool {
        now - self.created_at > ttl
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_boundary() {
        let created_at = Utc::now();
        let session = Session {
            token: "t".into(),
            user_id: 1,
            created_at,
        };
        let ttl = TimeDelta::seconds(120);
        assert!(!session.is_expired(created_at, ttl));
        assert!(!session.is_expired(created_at + ttl, ttl));
        assert!(session.is_expired(created_at + ttl + TimeDelta::seconds(1), ttl));
    }
}
