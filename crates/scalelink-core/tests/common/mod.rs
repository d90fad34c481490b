#![allow(dead_code)]

use scalelink_core::protocol::ScaleStream;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Mock scale answering each `W` request with the next scripted response
pub struct MockScale {
    responses: VecDeque<Vec<u8>>,
    repeat: Option<Vec<u8>>,
    pending: VecDeque<u8>,
    pub sent: Vec<u8>,
    writes_before_failure: Option<usize>,
    broken: bool,
    drops: Option<Arc<AtomicUsize>>,
}

impl MockScale {
    pub fn new() -> Self {
        Self {
            responses: VecDeque::new(),
            repeat: None,
            pending: VecDeque::new(),
            sent: Vec::new(),
            writes_before_failure: None,
            broken: false,
            drops: None,
        }
    }

    /// Answer requests with `responses` in order, then stay silent
    pub fn with_responses<I, B>(responses: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let mut mock = Self::new();
        mock.responses = responses.into_iter().map(|r| r.as_ref().to_vec()).collect();
        mock
    }

    /// Answer every request with the same bytes
    pub fn repeating(response: &[u8]) -> Self {
        let mut mock = Self::new();
        mock.repeat = Some(response.to_vec());
        mock
    }

    /// Fail every write after `n` successful ones; the port then reports inactive
    pub fn fail_after(mut self, n: usize) -> Self {
        self.writes_before_failure = Some(n);
        self
    }

    /// Count drops of this stream in `counter`
    pub fn count_drops(mut self, counter: Arc<AtomicUsize>) -> Self {
        self.drops = Some(counter);
        self
    }
}

impl Read for MockScale {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.broken {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device gone"));
        }
        match self.pending.pop_front() {
            Some(byte) if !buf.is_empty() => {
                buf[0] = byte;
                Ok(1)
            }
            Some(byte) => {
                self.pending.push_front(byte);
                Ok(0)
            }
            None => Err(io::Error::new(io::ErrorKind::TimedOut, "read timed out")),
        }
    }
}

impl Write for MockScale {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(remaining) = self.writes_before_failure.as_mut() {
            if *remaining == 0 {
                self.broken = true;
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device gone"));
            }
            *remaining -= 1;
        }
        for &byte in buf {
            self.sent.push(byte);
            if byte == b'W' {
                let answer = self.responses.pop_front().or_else(|| self.repeat.clone());
                if let Some(answer) = answer {
                    self.pending.extend(answer);
                }
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ScaleStream for MockScale {
    fn is_active(&mut self) -> bool {
        !self.broken
    }
}

impl Drop for MockScale {
    fn drop(&mut self) {
        if let Some(counter) = &self.drops {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Install a test subscriber once so `RUST_LOG` works under `cargo test`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
