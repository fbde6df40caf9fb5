//! Per-request authentication state.

use crate::models::{Role, User};

/// Who is making the current request.
///
/// Built fresh for every request from the session cookie (or from a
/// successful login) and dropped with it. The constructors keep
/// `authenticated`, `user` and `session_token` consistent.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    authenticated: bool,
    user: Option<User>,
    session_token: Option<String>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn for_session(user: User, session_token: String) -> Self {
        Self {
            authenticated: true,
            user: Some(user),
            session_token: Some(session_token),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|u| u.role)
    }

    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }
}
