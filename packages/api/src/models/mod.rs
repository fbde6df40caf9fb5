//! Data models for the application.

mod catalog;
mod session;
mod user;

pub use catalog::{Album, Image, Row, Table};
pub use session::Session;
pub use user::{NewUser, Role, User};
