//! Frame payload decoding
//!
//! A payload is either a weight (`DD.DDD`) or a status answer (`?` plus one
//! status byte). The two shapes are checked separately; a payload is never
//! both.
//!
//! Status byte layout (bit 6 is always set so the byte stays printable):
//!
//! | Bit | Meaning        |
//! |-----|----------------|
//! | 0   | in motion      |
//! | 1   | over capacity  |
//! | 2   | under zero     |
//! | 4   | center of zero |
//!
//! Motion is checked first and wins over every other flag. Only over
//! capacity and under zero count as faults; center of zero on its own is
//! a normal condition and produces no update.

use regex::bytes::Regex;
use std::sync::OnceLock;

use super::{DecodeError, STATUS_PREFIX};
use crate::reading::{ReadingUpdate, ScaleStatus};

fn weight_pattern() -> &'static Regex {
    static WEIGHT: OnceLock<Regex> = OnceLock::new();
    WEIGHT.get_or_init(|| Regex::new(r"^[0-9]+\.[0-9]+$").expect("weight pattern is valid"))
}

/// Status byte sent by the scale instead of a weight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusByte(pub u8);

impl StatusByte {
    /// Scale in motion
    pub const IN_MOTION: u8 = 0b0000_0001;
    /// Load above capacity
    pub const OVER_CAPACITY: u8 = 0b0000_0010;
    /// Load below zero
    pub const UNDER_ZERO: u8 = 0b0000_0100;
    /// Scale resting at center of zero
    pub const CENTER_OF_ZERO: u8 = 0b0001_0000;
    /// Flags reported as a device fault
    pub const ERROR_MASK: u8 = Self::OVER_CAPACITY | Self::UNDER_ZERO;

    /// Raw byte
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Bit 0
    pub fn in_motion(self) -> bool {
        self.0 & Self::IN_MOTION != 0
    }

    /// Bit 1
    pub fn over_capacity(self) -> bool {
        self.0 & Self::OVER_CAPACITY != 0
    }

    /// Bit 2
    pub fn under_zero(self) -> bool {
        self.0 & Self::UNDER_ZERO != 0
    }

    /// Bit 4
    pub fn center_of_zero(self) -> bool {
        self.0 & Self::CENTER_OF_ZERO != 0
    }

    /// Status this byte maps to, if any.
    ///
    /// Motion is transient and layered over the persistent fault flags,
    /// so it is checked first.
    pub fn status(self) -> Option<ScaleStatus> {
        if self.in_motion() {
            Some(ScaleStatus::Acquiring)
        } else if self.0 & Self::ERROR_MASK != 0 {
            Some(ScaleStatus::Error)
        } else {
            None
        }
    }
}

/// A classified frame payload
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decoded {
    /// Numeric weight
    Weight(f64),
    /// Status answer
    Status(StatusByte),
}

impl Decoded {
    /// Store update carried by this payload.
    ///
    /// `None` for a status byte with no relevant flag set; the previous
    /// reading should be kept.
    pub fn update(&self) -> Option<ReadingUpdate> {
        match *self {
            Decoded::Weight(value) => Some(ReadingUpdate::Weight(value)),
            Decoded::Status(byte) => byte.status().map(ReadingUpdate::Status),
        }
    }
}

/// Classify and decode a frame payload
pub fn decode(payload: &[u8]) -> Result<Decoded, DecodeError> {
    match payload {
        [] => Err(DecodeError::Empty),
        [STATUS_PREFIX, status] => Ok(Decoded::Status(StatusByte(*status))),
        _ if weight_pattern().is_match(payload) => {
            // The pattern only admits ASCII digits and one '.'
            let text = std::str::from_utf8(payload)
                .map_err(|_| DecodeError::InvalidWeight(String::from_utf8_lossy(payload).into_owned()))?;
            text.parse::<f64>()
                .map(Decoded::Weight)
                .map_err(|_| DecodeError::InvalidWeight(text.to_string()))
        }
        _ => Err(DecodeError::Unrecognized {
            payload: payload.to_vec(),
        }),
    }
}
