//! # API crate — sessions, role routing and storage for PhotoBook
//!
//! Everything the HTTP front end needs to decide *who* is asking and *what*
//! they may see lives here; the `web` crate only translates requests and
//! responses.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`auth`] | Argon2 password checks, session issue/resolve/revoke, per-request [`AuthContext`](auth::AuthContext) |
//! | [`router`] | Role-gated navigation over the `fsm` transition table, ownership checks |
//! | [`db`] | [`Datastore`](db::Datastore) trait, SQLite implementation, pool and migrations |
//! | [`models`] | `User`, `Role`, `Session`, `Album`, `Image`, `Table` |
//! | [`settings`] | Layered configuration (defaults, `photobook.toml`, environment) |
//! | [`bootstrap`] | Creates the configured administrator on first start |
//! | [`error`] | `StorageError`, `AuthError`, `RouteError` |
//!
//! ## Request flow
//!
//! 1. The session cookie is resolved by
//!    [`SessionManager::authenticate`](auth::SessionManager::authenticate) into
//!    an [`AuthContext`](auth::AuthContext) (anonymous when missing or expired).
//! 2. [`PageRouter::route`](router::PageRouter::route) turns the context and
//!    the requested action into a [`PageState`](router::PageState) or
//!    `Unauthorized`.
//! 3. [`PageRouter::page_data`](router::PageRouter::page_data) loads the table
//!    the page shows.

pub mod auth;
pub mod bootstrap;
pub mod db;
pub mod error;
pub mod models;
pub mod router;
pub mod settings;

pub use error::{AuthError, RouteError, StorageError};
