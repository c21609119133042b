use std::io;
use std::time::Duration;
use thiserror::Error;

/// The primary error type for the `markspace-lib` library.
#[derive(Error, Debug)]
pub enum MarkSpaceError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Short write: expected {expected} bytes, line accepted {written}")]
    ShortWrite { expected: usize, written: usize },

    #[error("Cannot frame an empty message")]
    EmptyFrame,

    #[error("Protocol error - {0}")]
    Protocol(#[from] ProtocolError),

    #[error(
        "Given summation result({received} = {received:#X}) does not match internally calculated result({expected} = {expected:#X})"
    )]
    Verification { expected: i32, received: i32 },

    #[error("You have exceeded the time limit of {} seconds", .0.as_secs_f32())]
    Timeout(Duration),

    #[error("Capacity exceeded: requested {requested} bytes, {available} available")]
    CapacityExceeded { requested: usize, available: usize },

    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Unsupported baud rate {0}")]
    UnsupportedBaud(u32),
}

/// Violations of the mark/space receive framing.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("got bad escape code {0:#04X}")]
    BadEscape(u8),

    #[error("received invalid parity for non-first byte")]
    DuplicateStartMarker,

    #[error("received invalid parity for first byte")]
    MissingStartMarker,

    #[error("too many bytes have been received, frame holds {expected}")]
    PayloadOverrun { expected: usize },
}

/// Coarse classification used by callers deciding how to report a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Protocol,
    Verification,
    Timeout,
    /// Buffer or configuration misuse by the caller
    Usage,
}

impl MarkSpaceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MarkSpaceError::Io(_) | MarkSpaceError::ShortWrite { .. } => ErrorKind::Io,
            MarkSpaceError::Protocol(_) => ErrorKind::Protocol,
            MarkSpaceError::Verification { .. } => ErrorKind::Verification,
            MarkSpaceError::Timeout(_) => ErrorKind::Timeout,
            MarkSpaceError::EmptyFrame
            | MarkSpaceError::CapacityExceeded { .. }
            | MarkSpaceError::InvalidLength { .. }
            | MarkSpaceError::UnsupportedBaud(_) => ErrorKind::Usage,
        }
    }
}

pub type Result<T> = std::result::Result<T, MarkSpaceError>;
