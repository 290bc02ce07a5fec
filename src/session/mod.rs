//! Stored sessions: identifiers, discovery and whole-session persistence.

pub mod catalog;
mod id;
mod store;
mod summary;

pub use catalog::{catalog_from_names, list_sessions, SessionCatalog};
pub use id::{SessionId, SessionIdError};
pub use store::{SessionError, SessionStore};
pub use summary::SessionSummary;
