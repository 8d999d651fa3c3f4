//! Error types for socket-warden.
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`].
//!
//! Detection logic itself never errors: a misclassified connection degrades
//! to an unnecessary reconnect, not a failure. The variants below cover
//! configuration mistakes and the transport seam.
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::InvalidUrl`] |
//! | Pool | [`Error::EndpointNotFound`] |
//! | Transport | [`Error::Transport`], [`Error::QueueEntryParse`] |
//! | External | [`Error::Io`], [`Error::Json`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;

use crate::identifiers::EndpointUrl;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when pool builder configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Endpoint URL failed validation.
    #[error("Invalid endpoint URL {input:?}: {source}")]
    InvalidUrl {
        /// The rejected input.
        input: String,
        /// Parse error from the `url` crate.
        source: url::ParseError,
    },

    // ========================================================================
    // Pool Errors
    // ========================================================================
    /// No connection record exists for the endpoint.
    #[error("Endpoint not found: {url}")]
    EndpointNotFound {
        /// The missing endpoint.
        url: EndpointUrl,
    },

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// Failure reported by the transport collaborator.
    ///
    /// Covers connect, close, and send failures. The transport owns retry
    /// semantics; the pool only logs and moves on.
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// A queue entry could not be decoded into transport-ready data.
    #[error("Queue entry parse failed: {message}")]
    QueueEntryParse {
        /// Description of the decode failure.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an endpoint not found error.
    #[inline]
    pub fn endpoint_not_found(url: EndpointUrl) -> Self {
        Self::EndpointNotFound { url }
    }

    /// Creates a transport error.
    #[inline]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a queue entry parse error.
    #[inline]
    pub fn queue_entry_parse(message: impl Into<String>) -> Self {
        Self::QueueEntryParse {
            message: message.into(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
