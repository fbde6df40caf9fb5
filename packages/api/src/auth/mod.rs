//! # Authentication — credentials, sessions and the per-request context
//!
//! | Item | Purpose |
//! |------|---------|
//! | [`Passwords`] | Argon2id hashing with an optional server-side pepper |
//! | [`SessionManager`] | credential checks, session issue/resolve/revoke |
//! | [`AuthContext`] | who the current request belongs to |
//! | [`Clock`] | time source for expiry ([`SystemClock`], [`ManualClock`]) |

mod clock;
mod context;
mod password;
mod session;

pub use clock::{Clock, ManualClock, SystemClock};
pub use context::AuthContext;
pub use password::Passwords;
pub use session::SessionManager;

/// Argon2 cost parameters, for [`Passwords::with_params`].
pub use argon2::Params as HashParams;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "sessionToken";
