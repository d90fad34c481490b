//! Serial Protocol Communication
//!
//! Implements the Mettler-Toledo 8217 request/response protocol.
//!
//! A poll is the single request byte `W`. The scale answers with a frame
//! `STX payload CR`, where the payload is either a weight such as `00.000`
//! or `?` followed by a status byte.

pub mod decode;
mod error;
pub mod frame;
pub mod serial;
pub mod stream;

pub use decode::{decode, Decoded, StatusByte};
pub use error::{DecodeError, ProtocolError};
pub use frame::{FrameScanner, FrameState, ScanOutcome, SCAN_BUDGET_FACTOR};
pub use serial::{list_ports, open_port, PortInfo};
pub use stream::{ScaleStream, SerialChannel, SerialStreamFactory, StreamFactory};

/// Request byte asking the scale for its current weight
pub const WEIGHT_REQUEST: u8 = b'W';

/// Start-of-frame marker (STX)
pub const FRAME_START: u8 = 0x02;

/// End-of-frame marker (CR)
pub const FRAME_END: u8 = b'\r';

/// Prefix of a status answer payload
pub const STATUS_PREFIX: u8 = b'?';

/// Default baud rate for the scale
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default per-byte read timeout in milliseconds
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 1000;

/// Maximum payload length kept while waiting for a terminator
pub const MAX_FRAME_LEN: usize = 64;
