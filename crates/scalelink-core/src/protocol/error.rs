//! Protocol errors

use std::io;
use thiserror::Error;

/// Errors that can occur while talking to the scale
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// The serial backend refused an operation
    #[error("Serial port error: {0}")]
    SerialError(String),

    /// No device behind the configured port name
    #[error("Port not found: {0}")]
    PortNotFound(String),

    /// Read or write failure on an open stream
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
}

impl ProtocolError {
    /// True when the error only means an I/O window expired
    pub fn is_timeout(&self) -> bool {
        match self {
            ProtocolError::IoError(e) => is_timeout_kind(e.kind()),
            _ => false,
        }
    }
}

/// Read-window expiry as reported by serial and socket backends
pub(crate) fn is_timeout_kind(kind: io::ErrorKind) -> bool {
    matches!(kind, io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
}

/// Errors produced while classifying a frame payload
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Start marker directly followed by the terminator
    #[error("Empty frame payload")]
    Empty,

    /// Neither a weight nor a status answer
    #[error("Unrecognized frame payload: {payload:02x?}")]
    Unrecognized {
        /// The offending payload
        payload: Vec<u8>,
    },

    /// Looked like a weight but did not parse as one
    #[error("Invalid weight value: {0}")]
    InvalidWeight(String),
}
