//! Error types.

use std::fmt;

use derive_more::{Display, From};

use crate::models::{BoardId, PostId, TopicId};

/// A single failed field constraint on user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// The name of the form field, e.g. "subject".
    pub field: &'static str,
    /// What was wrong with it.
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}: {}", self.field, self.message)
    }
}

/// All of the field constraints that failed for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(pub Vec<FieldError>);

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The error for a given field, if that field failed.
    pub fn field(&self, field: &str) -> Option<&FieldError> {
        self.0.iter().find(|err| err.field == field)
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let mut first = true;

        for err in &self.0 {
            if !first {
                write!(fmt, ", ")?;
            }
            write!(fmt, "{}", err)?;
            first = false;
        }

        Ok(())
    }
}

/// Our error type.
#[derive(Debug, Display, From)]
pub enum Error {
    #[display(fmt = "Invalid input: {}", errors)]
    Validation { errors: FieldErrors },
    #[display(fmt = "Board #{} not found", board_id)]
    BoardNotFound { board_id: BoardId },
    #[display(fmt = "Topic #{} not found", topic_id)]
    TopicNotFound { topic_id: TopicId },
    #[display(fmt = "Post #{} not found", post_id)]
    PostNotFound { post_id: PostId },
    #[display(fmt = "Tried to post without an authenticated identity")]
    NotAuthenticated,
    #[display(fmt = "JSON error: {}", _0)]
    #[from]
    JsonError(serde_json::error::Error),
    #[display(fmt = "YAML error: {}", _0)]
    #[from]
    YamlError(serde_yaml::Error),
    #[display(fmt = "Couldn't initialize logging: {}", _0)]
    #[from]
    LogError(log::SetLoggerError),
    #[display(fmt = "Database connection pool error: {}", _0)]
    #[from]
    R2d2Error(r2d2::Error),
    #[display(fmt = "Database error: {}", _0)]
    #[from]
    DatabaseError(diesel::result::Error),
    #[display(fmt = "Database migration error: {}", message)]
    MigrationError { message: String },
    #[display(fmt = "Couldn't connect to the PostgreSQL database: {}", _0)]
    #[from]
    ConnectionError(diesel::ConnectionError),
    #[display(fmt = "I/O error: {}", _0)]
    #[from]
    IoError(std::io::Error),
    #[display(fmt = "I/O error: {}: {}", msg, cause)]
    IoErrorMsg { cause: std::io::Error, msg: String },
}

impl Error {
    pub fn from_io_error<S>(cause: std::io::Error, msg: S) -> Error
    where
        S: Into<String>,
    {
        Error::IoErrorMsg {
            cause,
            msg: msg.into(),
        }
    }

    /// Whether this error is an expected, user-recoverable failure rather
    /// than a storage or infrastructure fault.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Validation { .. }
                | Error::BoardNotFound { .. }
                | Error::TopicNotFound { .. }
                | Error::PostNotFound { .. }
                | Error::NotAuthenticated
        )
    }
}

impl std::error::Error for Error {}

/// Our result type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_errors_are_recoverable() {
        assert!(Error::NotAuthenticated.is_recoverable());
        assert!(Error::TopicNotFound { topic_id: 1 }.is_recoverable());
        assert!(Error::Validation {
            errors: FieldErrors::default(),
        }
        .is_recoverable());
    }

    #[test]
    fn infrastructure_errors_are_not_recoverable() {
        assert!(!Error::DatabaseError(
            diesel::result::Error::RollbackTransaction
        )
        .is_recoverable());
        assert!(!Error::MigrationError {
            message: "out of order".into(),
        }
        .is_recoverable());
    }
}
