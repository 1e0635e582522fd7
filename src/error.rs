//! Centralized error types for planemail.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the planemail library.
#[derive(Error, Debug)]
pub enum PlanemailError {
    /// I/O error with the associated file path.
    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The specified file does not exist.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// The file does not appear to be a valid MBOX.
    #[error("File does not appear to be a valid MBOX: {0}")]
    InvalidMbox(PathBuf),

    /// The mailbox no longer holds a message with this id.
    #[error("Message not found: {0}")]
    NotFound(String),

    /// The account credential was rejected by the mailbox provider.
    #[error("Credential expired or rejected for '{0}'")]
    AuthExpired(String),

    /// Any other failure while listing or fetching messages.
    #[error("Mailbox transport error: {0}")]
    Transport(String),

    /// A date range that is not two ISO dates separated by one space.
    #[error("Invalid date range '{0}': expected \"YYYY-MM-DD YYYY-MM-DD\"")]
    InvalidDateRange(String),

    /// An airport reference table could not be loaded.
    #[error("Invalid airport table: {0}")]
    InvalidAirportTable(String),

    /// The accounts file is unreadable or an account lookup failed.
    #[error("Account store error: {0}")]
    AccountStore(String),

    /// An export operation failed.
    #[error("Export error: {0}")]
    ExportError(String),
}

/// Convenience alias for `Result<T, PlanemailError>`.
pub type Result<T> = std::result::Result<T, PlanemailError>;

impl PlanemailError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error means the requested message vanished.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Allow `?` on `std::io::Error` when no path context is available
/// (rare, prefer `PlanemailError::io`).
impl From<std::io::Error> for PlanemailError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::from("<unknown>"),
            source,
        }
    }
}
