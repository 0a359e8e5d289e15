//! Error types for the serving pipeline.
//!
//! [`ServeError`] is the single error type flowing through handlers,
//! middlewares and the file serving core. Hosts translate it into responses:
//! `NotFound` becomes the host's not-found page, `RangeNotSatisfiable`
//! becomes a 416 reply, `Cancelled` is silent, and everything else goes to
//! the host's error page — unless the response body was already started, in
//! which case the connection is simply terminated.

use std::error::Error;
use std::io;
use thiserror::Error;

/// The error type returned by request handlers and the file serving core.
#[derive(Debug, Error)]
pub enum ServeError {
    /// The requested file does not exist and no hook could synthesize it.
    #[error("not found: {path}")]
    NotFound { path: String },

    /// The resolved path escaped the base directory, or a directory was
    /// requested as a file.
    #[error("forbidden: {reason}")]
    Forbidden { reason: String },

    /// The `Range` header was malformed or outside the resource.
    #[error("range not satisfiable: {range}")]
    RangeNotSatisfiable { range: String },

    /// An open/read/seek/write failed while producing the response.
    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    /// Building the pre-compressed variant failed twice.
    #[error("compression failed: {source}")]
    Compression { source: io::Error },

    /// A user hook returned an error.
    #[error("hook error: {source}")]
    Hook { source: Box<dyn Error + Send + Sync> },

    /// The request's stop flag was raised.
    #[error("request cancelled")]
    Cancelled,
}

impl ServeError {
    /// Creates a new NotFound error
    pub fn not_found<S: ToString>(path: S) -> Self {
        Self::NotFound { path: path.to_string() }
    }

    /// Creates a new Forbidden error
    pub fn forbidden<S: ToString>(reason: S) -> Self {
        Self::Forbidden { reason: reason.to_string() }
    }

    /// Creates a new RangeNotSatisfiable error
    pub fn range_not_satisfiable<S: ToString>(range: S) -> Self {
        Self::RangeNotSatisfiable { range: range.to_string() }
    }

    /// Creates a new I/O error
    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    /// Creates a new Compression error
    pub fn compression(source: io::Error) -> Self {
        Self::Compression { source }
    }

    /// Creates a new Hook error
    pub fn hook<E: Into<Box<dyn Error + Send + Sync>>>(e: E) -> Self {
        Self::Hook { source: e.into() }
    }
}
