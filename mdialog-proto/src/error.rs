//! Codec errors.

use std::num::ParseIntError;

/// Failure to decode the next event from the incoming stream.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DecodeError {
    /// Reading the incoming stream failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The stream ended before an event was decoded.
    #[error("unexpected connection termination")]
    ConnectionTerminated,

    /// A line carried neither the note nor the request prefix.
    #[error("invalid data received: {line:?}")]
    NotARequest {
        /// The offending line.
        line: String,
    },

    /// The request carried an unknown command token.
    #[error("unsupported command '{command}'")]
    Unsupported {
        /// First token of the request.
        command: String,
    },

    /// A known command with missing or extra fields.
    #[error("malformed {command} request: {line:?}")]
    Malformed {
        /// Command token.
        command: &'static str,
        /// The request, prefix stripped.
        line: String,
    },

    /// A log line with a severity outside the known table.
    #[error("unknown log severity '{token}'")]
    UnknownSeverity {
        /// The severity token, including its `L:` prefix.
        token: String,
    },

    /// A `D:VALUE` line with an unknown or non-scalar type tag.
    #[error("invalid variable type '{tag}' for {name}")]
    UnknownType {
        /// Variable name.
        name: String,
        /// The type tag as received.
        tag: String,
    },

    /// A `D:VALUE` line typed `int` whose value does not parse.
    #[error("invalid integer {text:?} for {name}")]
    InvalidInteger {
        /// Variable name.
        name: String,
        /// Value text as received.
        text: String,
        /// Parser error.
        source: ParseIntError,
    },

    /// The stream ended inside a multi-line payload.
    #[error("stream ended before boundary {boundary:?} of {name}")]
    TruncatedPayload {
        /// Variable name.
        name: String,
        /// Expected boundary line.
        boundary: String,
    },
}

impl DecodeError {
    /// Whether the error is a violation of the wire grammar, as opposed to
    /// an I/O failure or a closed stream.
    pub const fn is_protocol_violation(&self) -> bool {
        !matches!(self, Self::Io(_) | Self::ConnectionTerminated)
    }
}

/// Reply rejected before anything was written, or a failed write.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum EncodeError {
    /// The reply field was not set.
    #[error("value for {name} cannot be empty")]
    MissingValue {
        /// Prompt name.
        name: String,
    },

    /// The reply would break line framing.
    #[error("value for {name} cannot contain new lines")]
    NewLine {
        /// Prompt name.
        name: String,
    },

    /// Writing the outgoing stream failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
