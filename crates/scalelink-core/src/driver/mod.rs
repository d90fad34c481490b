//! Scale drivers
//!
//! A driver knows how to open a connection to one kind of scale, how to
//! tell whether that connection is still alive and how to pull one round
//! of data over it. The [`ConnectionSupervisor`](crate::supervisor::ConnectionSupervisor)
//! drives any [`ScaleDriver`] through connect, poll and reconnect.

mod mettler;
mod poll;

pub use mettler::Mettler8217Driver;
pub use poll::{PollDriver, PollOutcome, PollSchedule};

use crate::protocol::ProtocolError;
use crate::reading::Reading;

/// Capabilities a scale driver provides to the supervisor
pub trait ScaleDriver {
    /// Live connection handed out by [`establish_connection`](Self::establish_connection).
    ///
    /// Dropping it must release the underlying transport.
    type Connection;

    /// Open a new connection to the device
    fn establish_connection(&mut self) -> Result<Self::Connection, ProtocolError>;

    /// Whether `connection` is still usable after an error
    fn is_connection_active(&mut self, connection: &mut Self::Connection) -> bool;

    /// Run one acquisition cycle over `connection`
    fn acquire_data(
        &mut self,
        connection: &mut Self::Connection,
    ) -> Result<PollOutcome, ProtocolError>;

    /// Most recent reading
    fn latest_reading(&self) -> Reading;

    /// Called once a connection has been declared dead, before it is released
    fn connection_lost(&mut self, _error: &ProtocolError) {}
}
