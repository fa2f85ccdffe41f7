//! Error types for monument
//!
//! Two classes of failure exist:
//! - [`MonumentError`] is fatal. It is propagated to `main`, which logs it and
//!   terminates the process.
//! - [`ShareRejection`] is advisory. A rejected share is dropped from the
//!   recovery session and collection continues.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias for fallible monument operations
pub type Result<T> = std::result::Result<T, MonumentError>;

/// Verdict of a single reconstruction attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// Not enough distinct valid shares (or the result is not recognisable yet)
    Insufficient,
    /// The most recently added share was rejected
    InvalidShare,
    /// The secret was reconstructed
    Success,
}

impl fmt::Display for RecoveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Insufficient => write!(f, "insufficient shares"),
            Self::InvalidShare => write!(f, "invalid share"),
            Self::Success => write!(f, "success"),
        }
    }
}

/// Fatal failures
#[derive(Debug, Error)]
pub enum MonumentError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("OpenPGP {operation} failed")]
    Pgp {
        operation: &'static str,
        #[source]
        source: pgp::errors::Error,
    },

    #[error("Secret sharing failed: {0}")]
    Sharing(String),

    #[error("Private key could not be recovered: {0}")]
    Recovery(RecoveryOutcome),

    #[error("Malformed document: {0}")]
    Document(String),

    #[error("{} already holds files, refusing to mix artifact sets", .0.display())]
    OutputOccupied(PathBuf),

    #[error("I/O error while {context}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl MonumentError {
    pub(crate) fn pgp(operation: &'static str) -> impl FnOnce(pgp::errors::Error) -> Self {
        move |source| Self::Pgp { operation, source }
    }

    pub(crate) fn io(context: impl Into<String>) -> impl FnOnce(io::Error) -> Self {
        let context = context.into();
        move |source| Self::Io { context, source }
    }
}

/// Reasons a candidate share is refused during recovery
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShareRejection {
    #[error("share is malformed: {0}")]
    Malformed(String),

    #[error("checksum verification failed: expected 0x{expected:08x}, got 0x{actual:08x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("share has inconsistent threshold: expected {expected}, got {found}")]
    InconsistentThreshold { expected: u8, found: u8 },

    #[error("share has inconsistent length: expected {expected} bytes, got {found}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("share #{index} was already collected")]
    Duplicate { index: u8 },

    #[error("share #{index} conflicts with a previously collected share")]
    Conflicting { index: u8 },
}
