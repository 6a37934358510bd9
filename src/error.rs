//! Crate-wide error taxonomy.
//!
//! Every failure is terminal for the triggering operation: callers surface
//! the message and the user re-invokes the action. No automatic retry or
//! backoff anywhere.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Invalid credentials, or an operation that requires a session was
    /// invoked without one. Surfaced inline next to the login form.
    #[error("authentication failed: {0}")]
    AuthFailure(String),

    /// A list/create/update/delete call against the document store failed.
    /// Logged at the call site and surfaced as a blocking notice.
    #[error("document store error: {0}")]
    StoreIo(String),

    /// Bulk export was requested with nothing selected in the visible set.
    /// A user-facing warning, not a system fault.
    #[error("no orders selected")]
    EmptySelection,

    /// Missing or malformed endpoint configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
