//! Frame scanning
//!
//! Pulls bytes one at a time from the stream and cuts out the payload
//! between a start marker and a terminator. Each call to
//! [`FrameScanner::scan`] starts fresh: the scale answers exactly once
//! per request, so nothing is carried from one poll to the next.
//!
//! A scan reads at most [`SCAN_BUDGET_FACTOR`] times the payload guard.
//! A line that keeps chattering without ever closing a frame therefore
//! still ends the scan, even though no single read times out.

use std::io::{self, Read};

use super::{error::is_timeout_kind, ProtocolError, FRAME_END, FRAME_START, MAX_FRAME_LEN};

/// Bytes a single scan may consume, as a multiple of the payload guard
pub const SCAN_BUDGET_FACTOR: usize = 4;

/// Framing state of the frame currently being scanned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    /// Waiting for a start marker
    Idle,
    /// Start marker seen, collecting payload
    InFrame,
    /// Terminator seen, payload complete
    Terminated,
    /// Read window expired (or the byte budget ran out) before a
    /// complete frame
    TimedOut,
}

/// Result of one scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// A complete payload, delimiters stripped
    Complete(Vec<u8>),
    /// No complete frame arrived within the read window or byte budget
    Incomplete,
}

/// Byte-at-a-time frame scanner
#[derive(Debug, Clone)]
pub struct FrameScanner {
    start: u8,
    end: u8,
    max_len: usize,
    state: FrameState,
    payload: Vec<u8>,
}

impl Default for FrameScanner {
    fn default() -> Self {
        Self::new(FRAME_START, FRAME_END)
    }
}

impl FrameScanner {
    /// Create a scanner for the given start and end markers
    pub fn new(start: u8, end: u8) -> Self {
        Self {
            start,
            end,
            max_len: MAX_FRAME_LEN,
            state: FrameState::Idle,
            payload: Vec::with_capacity(MAX_FRAME_LEN),
        }
    }

    /// Override the payload length guard
    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len.max(1);
        self
    }

    /// State reached by the last scan
    pub fn state(&self) -> FrameState {
        self.state
    }

    /// Scan one frame from `reader`.
    ///
    /// Returns [`ScanOutcome::Incomplete`] when the reader times out (or
    /// reports end of stream) before a terminator follows a start marker.
    /// The same holds once the byte budget is spent without a complete
    /// frame. Any other I/O failure is returned as an error.
    pub fn scan<R: Read + ?Sized>(&mut self, reader: &mut R) -> Result<ScanOutcome, ProtocolError> {
        self.state = FrameState::Idle;
        self.payload.clear();

        let budget = self.byte_budget();
        let mut consumed = 0usize;
        let mut byte = [0u8; 1];
        loop {
            if consumed >= budget {
                tracing::debug!("no frame within {} bytes, giving up on this scan", budget);
                return Ok(self.time_out());
            }
            match reader.read(&mut byte) {
                Ok(0) => return Ok(self.time_out()),
                Ok(_) => {
                    consumed += 1;
                    if let Some(payload) = self.push(byte[0]) {
                        return Ok(ScanOutcome::Complete(payload));
                    }
                }
                Err(e) if is_timeout_kind(e.kind()) => return Ok(self.time_out()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(ProtocolError::IoError(e)),
            }
        }
    }

    /// Feed one byte. Returns the payload once a frame is terminated.
    fn push(&mut self, byte: u8) -> Option<Vec<u8>> {
        if byte == self.start {
            // A fresh start marker drops whatever partial payload we had
            self.payload.clear();
            self.state = FrameState::InFrame;
            return None;
        }

        match self.state {
            FrameState::InFrame if byte == self.end => {
                self.state = FrameState::Terminated;
                Some(std::mem::take(&mut self.payload))
            }
            FrameState::InFrame => {
                if self.payload.len() >= self.max_len {
                    tracing::debug!(
                        "frame exceeded {} bytes without terminator, discarding",
                        self.max_len
                    );
                    self.payload.clear();
                    self.state = FrameState::Idle;
                } else {
                    self.payload.push(byte);
                }
                None
            }
            // Noise (and stray terminators) outside a frame
            _ => None,
        }
    }

    /// Most bytes one scan reads before giving up
    pub fn byte_budget(&self) -> usize {
        self.max_len.saturating_mul(SCAN_BUDGET_FACTOR)
    }

    fn time_out(&mut self) -> ScanOutcome {
        self.state = FrameState::TimedOut;
        self.payload.clear();
        ScanOutcome::Incomplete
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Reader that hands out its bytes, then reports a timeout
    struct TimeoutAfter(Cursor<Vec<u8>>);

    impl Read for TimeoutAfter {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.0.read(buf)? {
                0 => Err(io::Error::new(io::ErrorKind::TimedOut, "read timed out")),
                n => Ok(n),
            }
        }
    }

    fn reader(bytes: &[u8]) -> TimeoutAfter {
        TimeoutAfter(Cursor::new(bytes.to_vec()))
    }

    #[test]
    fn test_weight_frame() {
        let mut scanner = FrameScanner::default();
        let outcome = scanner.scan(&mut reader(b"\x0200.000\r")).unwrap();
        assert_eq!(outcome, ScanOutcome::Complete(b"00.000".to_vec()));
        assert_eq!(scanner.state(), FrameState::Terminated);
    }

    #[test]
    fn test_second_start_marker_restarts_payload() {
        let mut scanner = FrameScanner::default();
        let outcome = scanner.scan(&mut reader(b"\x0212.3\x0204.560\r")).unwrap();
        assert_eq!(outcome, ScanOutcome::Complete(b"04.560".to_vec()));
    }

    #[test]
    fn test_noise_and_stray_terminator_before_start() {
        let mut scanner = FrameScanner::default();
        let outcome = scanner.scan(&mut reader(b"xy\r\r\x02?A\r")).unwrap();
        assert_eq!(outcome, ScanOutcome::Complete(b"?A".to_vec()));
    }

    #[test]
    fn test_missing_terminator_is_incomplete() {
        let mut scanner = FrameScanner::default();
        let outcome = scanner.scan(&mut reader(b"\x0200.0")).unwrap();
        assert_eq!(outcome, ScanOutcome::Incomplete);
        assert_eq!(scanner.state(), FrameState::TimedOut);
    }

    #[test]
    fn test_no_bytes_is_incomplete() {
        let mut scanner = FrameScanner::default();
        assert_eq!(scanner.scan(&mut reader(b"")).unwrap(), ScanOutcome::Incomplete);
    }

    #[test]
    fn test_end_of_stream_is_incomplete() {
        let mut scanner = FrameScanner::default();
        let mut cursor = Cursor::new(b"\x0201".to_vec());
        assert_eq!(scanner.scan(&mut cursor).unwrap(), ScanOutcome::Incomplete);
    }

    #[test]
    fn test_scan_starts_fresh_each_call() {
        let mut scanner = FrameScanner::default();
        assert_eq!(scanner.scan(&mut reader(b"\x0299")).unwrap(), ScanOutcome::Incomplete);
        // The dangling "99" must not leak into the next frame
        let outcome = scanner.scan(&mut reader(b"1.5\r\x021.5\r")).unwrap();
        assert_eq!(outcome, ScanOutcome::Complete(b"1.5".to_vec()));
    }

    #[test]
    fn test_overlong_payload_is_discarded() {
        let mut scanner = FrameScanner::default().with_max_len(4);
        let outcome = scanner.scan(&mut reader(b"\x02123456\r\x021.0\r")).unwrap();
        assert_eq!(outcome, ScanOutcome::Complete(b"1.0".to_vec()));
    }

    #[test]
    fn test_endless_noise_ends_the_scan() {
        /// Line that never goes quiet and never sends a start marker
        struct Chatter {
            served: usize,
        }
        impl Read for Chatter {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                buf[0] = b'x';
                self.served += 1;
                Ok(1)
            }
        }

        let mut scanner = FrameScanner::default();
        let mut line = Chatter { served: 0 };
        assert_eq!(scanner.scan(&mut line).unwrap(), ScanOutcome::Incomplete);
        assert_eq!(scanner.state(), FrameState::TimedOut);
        assert_eq!(line.served, scanner.byte_budget());
    }

    #[test]
    fn test_endless_unterminated_frames_end_the_scan() {
        // Start markers keep arriving but no terminator ever does
        let mut line = io::repeat(FRAME_START);
        let mut scanner = FrameScanner::default().with_max_len(8);
        assert_eq!(scanner.scan(&mut line).unwrap(), ScanOutcome::Incomplete);
        assert_eq!(scanner.byte_budget(), 32);
    }

    #[test]
    fn test_hard_io_error_propagates() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"))
            }
        }

        let mut scanner = FrameScanner::default();
        let err = scanner.scan(&mut Broken).unwrap_err();
        assert!(matches!(err, ProtocolError::IoError(_)));
        assert!(!err.is_timeout());
    }
}
