//! Byte streams to a scale
//!
//! The supervisor and poll driver only see [`ScaleStream`]s handed out by
//! a [`StreamFactory`]. The serial implementation lives here; tests plug in
//! scripted streams through the closure impl.

use serialport::SerialPort;
use std::io::{self, Read, Write};

use super::{serial::open_port, ProtocolError};
use crate::config::ScaleConfig;

/// Duplex byte stream to a scale.
///
/// Reads are expected to time out (`TimedOut`/`WouldBlock`) when no byte
/// arrives within the stream's read window.
pub trait ScaleStream: Read + Write + Send {
    /// Whether the underlying transport is still usable
    fn is_active(&mut self) -> bool;
}

/// Opens a fresh stream to the scale.
///
/// Dropping the returned stream releases the transport.
pub trait StreamFactory: Send {
    /// Stream type produced by this factory
    type Stream: ScaleStream;

    /// Open the transport
    fn open(&self) -> Result<Self::Stream, ProtocolError>;
}

impl<F, S> StreamFactory for F
where
    F: Fn() -> Result<S, ProtocolError> + Send,
    S: ScaleStream,
{
    type Stream = S;

    fn open(&self) -> Result<S, ProtocolError> {
        self()
    }
}

/// Serial port wrapper implementing ScaleStream
pub struct SerialChannel {
    port: Box<dyn SerialPort>,
}

impl SerialChannel {
    /// Wrap an already opened port
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        Self { port }
    }

    /// Name of the underlying port, if the backend knows it
    pub fn name(&self) -> Option<String> {
        self.port.name()
    }
}

impl Read for SerialChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read(buf)
    }
}

impl Write for SerialChannel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.port.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }
}

impl ScaleStream for SerialChannel {
    fn is_active(&mut self) -> bool {
        // A vanished device (unplugged USB adapter) fails the ioctl
        self.port.bytes_to_read().is_ok()
    }
}

/// Opens serial ports from a [`ScaleConfig`]
#[derive(Debug, Clone)]
pub struct SerialStreamFactory {
    config: ScaleConfig,
}

impl SerialStreamFactory {
    /// Factory opening the port described by `config`
    pub fn new(config: ScaleConfig) -> Self {
        Self { config }
    }
}

impl StreamFactory for SerialStreamFactory {
    type Stream = SerialChannel;

    fn open(&self) -> Result<SerialChannel, ProtocolError> {
        open_port(&self.config)
    }
}
