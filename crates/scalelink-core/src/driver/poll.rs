//! Poll driver
//!
//! One poll cycle: wait for the next slot, send the request byte, scan the
//! answer, decode it and merge it into the store. Framing timeouts and
//! decode mismatches end the cycle quietly; I/O errors are returned to the
//! caller, which owns recovery.

use std::io::Write;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::MAX_POLL_INTERVAL_SECS;
use crate::protocol::{
    decode, FrameScanner, ProtocolError, ScaleStream, ScanOutcome, WEIGHT_REQUEST,
};
use crate::reading::{Reading, ReadingStore};

/// What a single poll cycle produced
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The store was updated; carries the merged reading
    Updated(Reading),
    /// A status frame with no relevant flag; store untouched
    Ignored,
    /// A frame that matched neither payload shape; store untouched
    Rejected,
    /// No complete frame within the read window; store untouched
    NoFrame,
}

/// Drift-compensated poll cadence.
///
/// Each deadline is the previous deadline plus the interval, not the
/// previous wake-up plus the interval, so slow cycles do not push the
/// whole schedule back. A late cycle runs immediately; when the schedule
/// falls more than a full interval behind (a long stall) it is
/// re-anchored one interval after the current instant instead of
/// bursting to catch up.
///
/// Intervals are capped at [`MAX_POLL_INTERVAL_SECS`].
#[derive(Debug, Clone)]
pub struct PollSchedule {
    interval: Duration,
    next: Option<Instant>,
}

impl PollSchedule {
    /// Schedule whose first slot is immediate
    pub fn new(interval: Duration) -> Self {
        let interval = interval.min(Duration::from_secs(MAX_POLL_INTERVAL_SECS));
        Self { interval, next: None }
    }

    /// Spacing between slots
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Forget the current deadline; the next cycle runs at once
    pub fn reset(&mut self) {
        self.next = None;
    }

    /// Claim the next slot as of `now`, returning how long to sleep
    /// before it starts.
    pub fn advance(&mut self, now: Instant) -> Duration {
        let slot = self.next.unwrap_or(now);
        let following = slot + self.interval;
        self.next = Some(if following < now {
            now + self.interval
        } else {
            following
        });
        slot.saturating_duration_since(now)
    }

    /// Block until the next slot
    pub fn wait(&mut self) {
        let delay = self.advance(Instant::now());
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }
}

/// Drives request/response cycles against one stream
#[derive(Debug, Clone)]
pub struct PollDriver {
    schedule: PollSchedule,
    scanner: FrameScanner,
    request: u8,
}

impl PollDriver {
    /// Create a driver polling at `interval` with the weight request
    pub fn new(interval: Duration) -> Self {
        Self {
            schedule: PollSchedule::new(interval),
            scanner: FrameScanner::default(),
            request: WEIGHT_REQUEST,
        }
    }

    /// Restart the cadence, e.g. after a reconnect
    pub fn reset(&mut self) {
        self.schedule.reset();
    }

    /// Cadence of this driver
    pub fn schedule(&self) -> &PollSchedule {
        &self.schedule
    }

    /// Run one cycle against `stream`, merging the result into `store`
    pub fn poll_once<S>(
        &mut self,
        stream: &mut S,
        store: &ReadingStore,
    ) -> Result<PollOutcome, ProtocolError>
    where
        S: ScaleStream + ?Sized,
    {
        self.schedule.wait();

        stream.write_all(&[self.request])?;
        stream.flush()?;

        let payload = match self.scanner.scan(stream)? {
            ScanOutcome::Complete(payload) => payload,
            ScanOutcome::Incomplete => {
                tracing::debug!("no complete frame within read window");
                return Ok(PollOutcome::NoFrame);
            }
        };

        let decoded = match decode(&payload) {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::debug!("skipping frame: {}", e);
                return Ok(PollOutcome::Rejected);
            }
        };

        match decoded.update() {
            Some(update) => {
                store.update(update);
                let reading = store.read();
                tracing::trace!(?update, ?reading, "reading updated");
                Ok(PollOutcome::Updated(reading))
            }
            None => {
                tracing::trace!(?decoded, "status frame without relevant flags");
                Ok(PollOutcome::Ignored)
            }
        }
    }
}
