//! Scale readings and the latest-reading store
//!
//! The store is a single lock-guarded [`Reading`] shared between the one
//! polling worker that writes it and any number of request handlers that
//! read it. Readers only ever copy the value out, so the lock is held for
//! the time it takes to copy a few words.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};

/// Condition of the scale as last reported
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScaleStatus {
    /// Stable weight, value is trustworthy
    Fixed,
    /// Scale in motion, value is stale
    Acquiring,
    /// Device fault (over capacity, under zero) or lost connection
    Error,
    /// Nothing received yet
    #[default]
    Unset,
}

/// Normalized scale reading.
///
/// `value` is only meaningful while `status` is [`ScaleStatus::Fixed`].
/// Status-only updates leave the last weight in place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Last decoded weight, in the scale's unit (kg)
    pub value: Option<f64>,
    /// Current status
    pub status: ScaleStatus,
    /// When the reading was last changed
    pub updated_at: Option<DateTime<Utc>>,
}

impl Reading {
    /// Weight, only when the scale reports it as stable
    pub fn stable_weight(&self) -> Option<f64> {
        match self.status {
            ScaleStatus::Fixed => self.value,
            _ => None,
        }
    }

    /// Apply a partial update in place
    pub fn merge(&mut self, update: ReadingUpdate, at: DateTime<Utc>) {
        match update {
            ReadingUpdate::Weight(value) => {
                self.value = Some(value);
                self.status = ScaleStatus::Fixed;
            }
            ReadingUpdate::Status(status) => {
                self.status = status;
            }
        }
        self.updated_at = Some(at);
    }
}

/// Partial update produced by one decoded frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReadingUpdate {
    /// New stable weight (implies [`ScaleStatus::Fixed`])
    Weight(f64),
    /// Status change, weight left untouched
    Status(ScaleStatus),
}

/// Shared handle to the latest reading.
///
/// Cloning the handle shares the same cell.
#[derive(Debug, Clone, Default)]
pub struct ReadingStore {
    inner: Arc<RwLock<Reading>>,
}

impl ReadingStore {
    /// Create a store holding an unset reading
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a partial update; last writer wins
    pub fn update(&self, update: ReadingUpdate) {
        let now = Utc::now();
        let mut reading = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        reading.merge(update, now);
    }

    /// Consistent snapshot of the current reading
    pub fn read(&self) -> Reading {
        *self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }
}
