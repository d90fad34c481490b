//! # ScaleLink Core Library
//!
//! Core functionality for polling a weighing scale over a serial line.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - Byte-stream framing and decoding of scale responses
//! - A lock-guarded store holding the latest reading
//! - Drift-compensated polling of the device
//! - Connection supervision with reconnect and backoff
//! - A supervised background worker with idempotent start
//!
//! ## Supported Scales
//!
//! - Mettler-Toledo 8217 (request `W`, framed `STX … CR` answers)
//!
//! ## Example
//!
//! ```rust,ignore
//! use scalelink_core::{config::ScaleConfig, service::ScaleService};
//!
//! let config = ScaleConfig::load("scale.json")?;
//! let service = ScaleService::from_config(&config);
//!
//! // Starts the worker on first use, restarts it if it died
//! let reading = service.latest_reading();
//! println!("{:?} {:?}", reading.status, reading.value);
//! ```

pub mod config;
pub mod driver;
pub mod protocol;
pub mod reading;
pub mod service;
pub mod supervisor;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::ScaleConfig;
    pub use crate::driver::{Mettler8217Driver, PollOutcome, ScaleDriver};
    pub use crate::protocol::{ProtocolError, ScaleStream, StreamFactory};
    pub use crate::reading::{Reading, ReadingStore, ReadingUpdate, ScaleStatus};
    pub use crate::service::ScaleService;
    pub use crate::supervisor::{ConnectionState, ConnectionSupervisor};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
