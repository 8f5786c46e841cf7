//! Error classification for the public API.
//!
//! Internal helpers build `anyhow` chains with `.context(..)`. At the public boundary the chain is
//! wrapped in an [`Error`] that carries an [`ErrorType`], so callers can tell a rejected input from
//! a missing record or a failed disk.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

/// The category of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The input was rejected before anything was written.
    Validation,
    /// The targeted id or position does not exist.
    NotFound,
    /// Stored data holds a value the model cannot represent.
    Corrupt,
    /// A file or database operation failed.
    Io,
    /// The home directory or its config file is missing or invalid.
    Config,
}

serde_plain::derive_display_from_serialize!(ErrorType);
serde_plain::derive_fromstr_from_deserialize!(ErrorType);

/// The public error type.
pub struct Error {
    error_type: ErrorType,
    inner: anyhow::Error,
}

/// The public result type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn new(error_type: ErrorType, inner: impl Into<anyhow::Error>) -> Self {
        Self {
            error_type,
            inner: inner.into(),
        }
    }

    pub(crate) fn validation(message: impl Display) -> Self {
        Self::new(ErrorType::Validation, anyhow::anyhow!("{message}"))
    }

    pub(crate) fn not_found(message: impl Display) -> Self {
        Self::new(ErrorType::NotFound, anyhow::anyhow!("{message}"))
    }

    pub(crate) fn corrupt(message: impl Display) -> Self {
        Self::new(ErrorType::Corrupt, anyhow::anyhow!("{message}"))
    }

    /// What kind of failure this is.
    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }

    pub fn is_validation(&self) -> bool {
        self.error_type == ErrorType::Validation
    }

    pub fn is_not_found(&self) -> bool {
        self.error_type == ErrorType::NotFound
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error: {:?}", self.error_type, self.inner)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#}", self.inner)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

/// Converts internal results into the public [`Result`] with a classification.
pub(crate) trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| Error::new(error_type, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_pub_result_keeps_context_chain() {
        let res: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no such file",
        ));
        let err = res
            .context("Unable to read expenses.csv")
            .pub_result(ErrorType::Io)
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Io);
        let message = err.to_string();
        assert!(message.contains("Unable to read expenses.csv"));
        assert!(message.contains("no such file"));
    }

    #[test]
    fn test_error_type_display() {
        assert_eq!(ErrorType::NotFound.to_string(), "not_found");
        assert_eq!(
            "validation".parse::<ErrorType>().unwrap(),
            ErrorType::Validation
        );
    }

    #[test]
    fn test_constructors() {
        assert!(Error::validation("bad").is_validation());
        assert!(Error::not_found("gone").is_not_found());
        assert_eq!(Error::corrupt("odd").error_type(), ErrorType::Corrupt);
    }
}
