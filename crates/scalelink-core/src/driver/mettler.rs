//! Mettler-Toledo 8217 driver

use std::time::Duration;

use super::{PollDriver, PollOutcome, ScaleDriver};
use crate::config::ScaleConfig;
use crate::protocol::{ProtocolError, ScaleStream, SerialStreamFactory, StreamFactory};
use crate::reading::{Reading, ReadingStore, ReadingUpdate, ScaleStatus};

/// Driver for the Mettler-Toledo 8217 request/response protocol.
///
/// Generic over the stream factory so tests can substitute scripted
/// streams for a serial port.
pub struct Mettler8217Driver<F: StreamFactory> {
    factory: F,
    poller: PollDriver,
    store: ReadingStore,
}

impl Mettler8217Driver<SerialStreamFactory> {
    /// Driver talking to the serial port named in `config`
    pub fn serial(config: &ScaleConfig, store: ReadingStore) -> Self {
        Self::new(
            SerialStreamFactory::new(config.clone()),
            config.poll_interval(),
            store,
        )
    }
}

impl<F: StreamFactory> Mettler8217Driver<F> {
    /// Driver opening streams through `factory`, polling every `poll_interval`
    pub fn new(factory: F, poll_interval: Duration, store: ReadingStore) -> Self {
        Self {
            factory,
            poller: PollDriver::new(poll_interval),
            store,
        }
    }

    /// Store this driver writes
    pub fn store(&self) -> &ReadingStore {
        &self.store
    }
}

impl<F: StreamFactory> ScaleDriver for Mettler8217Driver<F> {
    type Connection = F::Stream;

    fn establish_connection(&mut self) -> Result<F::Stream, ProtocolError> {
        let stream = self.factory.open()?;
        self.poller.reset();
        Ok(stream)
    }

    fn is_connection_active(&mut self, connection: &mut F::Stream) -> bool {
        connection.is_active()
    }

    fn acquire_data(
        &mut self,
        connection: &mut F::Stream,
    ) -> Result<PollOutcome, ProtocolError> {
        self.poller.poll_once(connection, &self.store)
    }

    fn latest_reading(&self) -> Reading {
        self.store.read()
    }

    fn connection_lost(&mut self, _error: &ProtocolError) {
        // Weight is kept; the status tells readers it is no longer live
        self.store.update(ReadingUpdate::Status(ScaleStatus::Error));
    }
}
