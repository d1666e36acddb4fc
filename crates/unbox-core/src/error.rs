//! Failure taxonomy for the unbox pipeline
//!
//! Most functions return `anyhow::Result` with call-site context attached;
//! the variants here are the typed root causes callers can match on via
//! `Error::downcast_ref`. IO and permission failures stay plain
//! `std::io::Error` under their anyhow context.

use thiserror::Error;

/// Typed root causes surfaced by the unbox pipeline
#[derive(Debug, Error)]
pub enum UnboxError {
    /// The named box source does not exist (local path missing, HTTP 404)
    #[error("box source not found: {name}")]
    SourceNotFound { name: String },

    /// The remote source could not be reached; not retried automatically
    #[error("could not reach {url}: {reason}")]
    Connectivity { url: String, reason: String },

    /// The box configuration and the filesystem disagree (malformed spec
    /// shape, escaping path, move source missing at apply time)
    #[error("recipe mismatch for '{path}': {reason}")]
    ConfigMismatch { path: String, reason: String },
}

impl UnboxError {
    /// Shorthand for a `ConfigMismatch` about the given path
    pub fn mismatch(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigMismatch {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
