use crate::store::{command::AdminCommand, context::Interrupted};
use std::num::ParseIntError;
use thiserror::Error;

/// Raised when the admin console client cannot be configured.
#[derive(Debug, Error)]
#[error("failed to configure admin console connection: {source}")]
pub struct ConnectionError {
    #[from]
    source: sqlx::Error,
}

/// A row that does not match the shape expected for its command.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("missing column `{column}`")]
    MissingColumn { column: &'static str },

    #[error("unexpected column `{column}`")]
    UnexpectedColumn { column: String },

    #[error("column `{column}` is null")]
    NullValue { column: &'static str },

    #[error("column `{column}` value {value:?} is not a 64-bit integer: {source}")]
    InvalidInteger {
        column: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
}

/// Failure of one of the read operations.
///
/// Every variant names the command that failed. Decoding failures carry the
/// zero-based index of the offending row.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("{command} failed: {source}")]
    Transport {
        command: AdminCommand,
        #[source]
        source: sqlx::Error,
    },

    #[error("{command} cancelled")]
    Cancelled { command: AdminCommand },

    #[error("{command} deadline exceeded")]
    DeadlineExceeded { command: AdminCommand },

    #[error("{command} returned an undecodable row {row}: {source}")]
    Decode {
        command: AdminCommand,
        row: usize,
        #[source]
        source: DecodeError,
    },
}

impl QueryError {
    pub(crate) const fn interrupted(command: AdminCommand, reason: Interrupted) -> Self {
        match reason {
            Interrupted::Cancelled => Self::Cancelled { command },
            Interrupted::DeadlineExceeded => Self::DeadlineExceeded { command },
        }
    }

    #[must_use]
    pub const fn command(&self) -> AdminCommand {
        match self {
            Self::Transport { command, .. }
            | Self::Cancelled { command }
            | Self::DeadlineExceeded { command }
            | Self::Decode { command, .. } => *command,
        }
    }

    /// True when the caller's context ended the operation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. } | Self::DeadlineExceeded { .. })
    }
}

/// Failure of the liveness probe.
#[derive(Debug, Error)]
pub enum HealthError {
    #[error("health probe failed: {source}")]
    Transport {
        #[source]
        source: sqlx::Error,
    },

    #[error("health probe cancelled")]
    Cancelled,

    #[error("health probe deadline exceeded")]
    DeadlineExceeded,
}

impl HealthError {
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }
}

impl From<Interrupted> for HealthError {
    fn from(reason: Interrupted) -> Self {
        match reason {
            Interrupted::Cancelled => Self::Cancelled,
            Interrupted::DeadlineExceeded => Self::DeadlineExceeded,
        }
    }
}

/// Raised when the connection cannot be released, including a second close.
#[derive(Debug, Error)]
#[error("failed to close admin console connection: {source}")]
pub struct CloseError {
    #[from]
    source: sqlx::Error,
}
