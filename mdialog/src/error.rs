//! Error types for dialog sessions.

use mdialog_proto::{DecodeError, EncodeError, EventKind, ValueType};

/// Alias for `Result<T, mdialog::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by [`Session`](crate::Session) operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The incoming stream violated the wire grammar.
    #[error("protocol violation: {0}")]
    Protocol(#[source] DecodeError),

    /// The incoming stream ended while an event was expected.
    #[error("unexpected connection termination")]
    ConnectionTerminated,

    /// A command was answered with a well-formed event of the wrong kind.
    #[error("{operation}: unexpected event {event}")]
    UnexpectedEvent {
        /// The operation that was waiting.
        operation: &'static str,
        /// Rendering of the received event.
        event: String,
        /// Kind of the received event.
        kind: EventKind,
    },

    /// `environment_set` was given a value whose shape disagrees with the
    /// prompt the installer opened.
    #[error("{name}: prompt expects {expected}, got {actual}")]
    ShapeMismatch {
        /// Environment key.
        name: String,
        /// Shape the prompt accepts.
        expected: &'static str,
        /// Type of the supplied value.
        actual: ValueType,
    },

    /// The reply was rejected before anything was written.
    #[error("invalid reply: {0}")]
    Invalid(#[source] EncodeError),

    /// The session already ended.
    #[error("dialog session is closed")]
    Closed,

    /// An I/O error on either stream.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Grammar violation on the incoming stream.
    pub const fn is_protocol_violation(&self) -> bool {
        matches!(self, Self::Protocol(_))
    }

    /// Wrong event for a convenience operation.
    pub const fn is_unexpected_event(&self) -> bool {
        matches!(self, Self::UnexpectedEvent { .. })
    }

    /// A reply the caller built that cannot be encoded.
    pub const fn is_caller_error(&self) -> bool {
        matches!(self, Self::Invalid(_) | Self::ShapeMismatch { .. })
    }
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        match e {
            DecodeError::ConnectionTerminated => Self::ConnectionTerminated,
            DecodeError::Io(io) => Self::Io(io),
            other => Self::Protocol(other),
        }
    }
}

impl From<EncodeError> for Error {
    fn from(e: EncodeError) -> Self {
        match e {
            EncodeError::Io(io) => Self::Io(io),
            other => Self::Invalid(other),
        }
    }
}
