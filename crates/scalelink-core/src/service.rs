//! Supervised scale worker
//!
//! [`ScaleService`] owns the one background thread running the connection
//! supervisor and the store that thread writes. Request handlers go
//! through [`ScaleService::latest_reading`], which first makes sure a
//! worker is alive (starting or restarting it if needed) and then returns
//! a snapshot of the store. The read path never fails.

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::config::ScaleConfig;
use crate::driver::{Mettler8217Driver, ScaleDriver};
use crate::reading::{Reading, ReadingStore};
use crate::supervisor::ConnectionSupervisor;

type DriverBuilder<D> = dyn Fn(ReadingStore) -> D + Send + Sync;
type WorkerSpawner = dyn Fn(ReadingStore) -> io::Result<JoinHandle<()>> + Send + Sync;

/// Handle to the background worker of one scale
pub struct ScaleService {
    store: ReadingStore,
    spawner: Box<WorkerSpawner>,
    worker: Mutex<Option<JoinHandle<()>>>,
    starts: AtomicU64,
}

impl ScaleService {
    /// Service for a Mettler-Toledo 8217 on the serial port from `config`
    pub fn from_config(config: &ScaleConfig) -> Self {
        let config = config.clone();
        let backoff = config.reconnect_backoff();
        Self::new(
            move |store| Mettler8217Driver::serial(&config, store),
            backoff,
        )
    }

    /// Service whose worker supervises drivers built by `make_driver`.
    ///
    /// A fresh driver is built inside each worker thread, so neither the
    /// driver nor its connection ever leaves that thread.
    pub fn new<D, F>(make_driver: F, backoff: Duration) -> Self
    where
        D: ScaleDriver + 'static,
        F: Fn(ReadingStore) -> D + Send + Sync + 'static,
    {
        let make_driver: Arc<DriverBuilder<D>> = Arc::new(make_driver);
        let spawner = move |store: ReadingStore| {
            let make_driver = Arc::clone(&make_driver);
            thread::Builder::new()
                .name("scale-worker".to_string())
                .spawn(move || {
                    let driver = make_driver(store);
                    ConnectionSupervisor::with_backoff(driver, backoff).run();
                })
        };

        Self {
            store: ReadingStore::new(),
            spawner: Box::new(spawner),
            worker: Mutex::new(None),
            starts: AtomicU64::new(0),
        }
    }

    /// Start the worker unless one is already alive.
    ///
    /// Returns `true` when a worker was (re)started by this call.
    pub fn ensure_running(&self) -> io::Result<bool> {
        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);

        match worker.as_ref() {
            Some(handle) if !handle.is_finished() => return Ok(false),
            Some(_) => tracing::warn!("scale worker died, restarting"),
            None => tracing::info!("starting scale worker"),
        }

        // Reap the dead worker, surfacing its panic in the log
        if let Some(handle) = worker.take() {
            if handle.join().is_err() {
                tracing::warn!("scale worker panicked");
            }
        }

        let handle = (self.spawner)(self.store.clone())?;
        *worker = Some(handle);
        self.starts.fetch_add(1, Ordering::Relaxed);
        Ok(true)
    }

    /// Whether a worker thread is currently alive
    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Number of times a worker has been started
    pub fn start_count(&self) -> u64 {
        self.starts.load(Ordering::Relaxed)
    }

    /// Latest reading, after making sure the worker is alive
    pub fn latest_reading(&self) -> Reading {
        if let Err(e) = self.ensure_running() {
            tracing::warn!("failed to start scale worker: {}", e);
        }
        self.store.read()
    }

    /// The store written by the worker
    pub fn store(&self) -> &ReadingStore {
        &self.store
    }
}
