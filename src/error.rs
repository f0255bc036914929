//! Error taxonomy for the FocusFlow core.
//!
//! Errors are grouped by how a caller is expected to react to them:
//! protocol errors come from the byte stream, connection errors end a
//! connection attempt or a live connection, sample errors are per-payload
//! and recoverable, and state errors reject a call without side effects.

use thiserror::Error;

/// Failures while encoding or decoding the GazeFlow wire format.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("stream closed before a complete value was read")]
    StreamClosed,

    #[error("payload is not valid UTF-8: {0}")]
    Utf8Decode(#[from] std::string::FromUtf8Error),

    #[error("varint exceeds 64 bits")]
    VarintOverflow,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures that end a connection attempt or a live connection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("connection rejected by tracker: {reason}")]
    ConnectionRejected { reason: String },

    #[error("connection to tracker lost")]
    ConnectionLost,
}

/// A single payload could not be turned into a gaze sample.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SampleError {
    #[error("malformed sample: {reason}")]
    MalformedSample { reason: String },
}

/// A call was rejected because of the current state. No side effects.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateError {
    #[error("a session is active")]
    SessionActive,

    #[error("not connected to tracker")]
    NotConnected,

    #[error("no areas of interest defined")]
    NoAoisDefined,

    #[error("rectangle has zero width or height")]
    InvalidGeometry,

    #[error("client is already connected")]
    AlreadyConnected,

    #[error("no session is active")]
    NoActiveSession,
}

/// Crate-level error.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Sample(#[from] SampleError),

    #[error(transparent)]
    State(#[from] StateError),
}

impl Error {
    /// Whether polling may continue on the same connection after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Sample(_))
    }

    /// Whether this error means the connection is gone.
    pub fn is_connection_lost(&self) -> bool {
        matches!(self, Error::Connection(ConnectionError::ConnectionLost))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
