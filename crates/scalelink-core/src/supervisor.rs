//! Connection supervision
//!
//! Owns the connection lifecycle of one scale: connect, poll, tell a
//! passing I/O hiccup from a dead transport, tear down and reconnect.
//! There is no terminal state; [`ConnectionSupervisor::run`] never returns.

use serde::{Deserialize, Serialize};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::DEFAULT_RECONNECT_BACKOFF_MS;
use crate::driver::ScaleDriver;
use crate::protocol::ProtocolError;

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// No connection; next step attempts one
    Disconnected,
    /// Connection attempt in progress
    Connecting,
    /// Connected and polling
    Connected,
}

/// Counters kept by the supervisor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SupervisorStats {
    /// Calls to `establish_connection`
    pub connect_attempts: u64,
    /// Failed calls to `establish_connection`
    pub connect_failures: u64,
    /// Connections torn down after being declared dead
    pub connections_closed: u64,
    /// Poll errors absorbed on a still-active connection
    pub transient_errors: u64,
    /// Poll cycles that completed without an I/O error
    pub polls: u64,
}

/// Drives a [`ScaleDriver`] through connect, poll and reconnect
pub struct ConnectionSupervisor<D: ScaleDriver> {
    driver: D,
    connection: Option<D::Connection>,
    state: ConnectionState,
    backoff: Duration,
    consecutive_failures: u64,
    stats: SupervisorStats,
}

impl<D: ScaleDriver> ConnectionSupervisor<D> {
    /// Create a supervisor with the default reconnect backoff
    pub fn new(driver: D) -> Self {
        Self::with_backoff(driver, Duration::from_millis(DEFAULT_RECONNECT_BACKOFF_MS))
    }

    /// Create a supervisor waiting `backoff` after each failed connection attempt
    pub fn with_backoff(driver: D, backoff: Duration) -> Self {
        Self {
            driver,
            connection: None,
            state: ConnectionState::Disconnected,
            backoff,
            consecutive_failures: 0,
            stats: SupervisorStats::default(),
        }
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Counters since construction
    pub fn stats(&self) -> SupervisorStats {
        self.stats
    }

    /// The supervised driver
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Supervise forever
    pub fn run(&mut self) -> ! {
        info!("scale supervisor started");
        loop {
            self.step();
        }
    }

    /// Perform one transition: a connection attempt while disconnected,
    /// one poll cycle while connected. Returns the resulting state.
    pub fn step(&mut self) -> ConnectionState {
        let Some(connection) = self.connection.as_mut() else {
            self.connect();
            return self.state;
        };

        let error = match self.driver.acquire_data(connection) {
            Ok(_) => {
                self.stats.polls += 1;
                return self.state;
            }
            Err(e) => e,
        };

        if self.driver.is_connection_active(connection) {
            // Transport still up: try again next cycle on the same connection
            self.stats.transient_errors += 1;
            if error.is_timeout() {
                debug!("scale request timed out: {}", error);
            } else {
                warn!("error while acquiring scale data: {}", error);
            }
            return self.state;
        }

        self.release(error);
        self.state
    }

    fn connect(&mut self) {
        self.state = ConnectionState::Connecting;
        self.stats.connect_attempts += 1;

        match self.driver.establish_connection() {
            Ok(connection) => {
                info!(
                    "scale connected after {} attempt(s)",
                    self.consecutive_failures + 1
                );
                self.connection = Some(connection);
                self.consecutive_failures = 0;
                self.state = ConnectionState::Connected;
            }
            Err(e) => {
                self.stats.connect_failures += 1;
                self.consecutive_failures += 1;
                self.state = ConnectionState::Disconnected;
                warn!(
                    "failed to connect to scale (attempt {}): {}; retrying in {}ms",
                    self.consecutive_failures,
                    e,
                    self.backoff.as_millis()
                );
                thread::sleep(self.backoff);
            }
        }
    }

    /// Force-close the current connection
    fn release(&mut self, error: ProtocolError) {
        warn!("scale connection lost: {}", error);
        self.driver.connection_lost(&error);
        // Dropping the connection closes the underlying transport
        drop(self.connection.take());
        self.stats.connections_closed += 1;
        self.state = ConnectionState::Disconnected;
    }
}
