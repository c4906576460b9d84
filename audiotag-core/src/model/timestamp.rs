// audiotag
// Copyright (c) 2026 The audiotag developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! [`AudioTimestamp`]: a non-negative duration with millisecond precision.

use std::fmt;

use crate::errors::{AudioTagError, ModelError, Result};

/// A non-negative duration, stored internally as fractional seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioTimestamp {
    seconds: f64,
}

impl AudioTimestamp {
    /// Builds a timestamp from a seconds value, clamping negatives to zero.
    pub fn from_seconds(seconds: f64) -> Self {
        AudioTimestamp { seconds: seconds.max(0.0) }
    }

    pub fn from_millis(millis: u64) -> Self {
        AudioTimestamp { seconds: millis as f64 / 1000.0 }
    }

    pub fn as_seconds(&self) -> f64 {
        self.seconds
    }

    pub fn as_millis(&self) -> u64 {
        (self.seconds * 1000.0).round() as u64
    }

    fn parts(&self) -> (u64, u64, u64, u64) {
        let total_ms = self.as_millis();
        let ms = total_ms % 1000;
        let total_secs = total_ms / 1000;
        let secs = total_secs % 60;
        let total_mins = total_secs / 60;
        let mins = total_mins % 60;
        let hours = total_mins / 60;
        (hours, mins, secs, ms)
    }

    /// Parses `MM:SS[.mmm]` or `HH:MM:SS[.mmm]`.
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = || AudioTagError::Model(ModelError::TimestampInvalidFormat(text.to_string()));

        let (head, frac) = match text.split_once('.') {
            Some((h, f)) => (h, Some(f)),
            None => (text, None),
        };

        let fields: Vec<&str> = head.split(':').collect();
        let (hours, mins, secs) = match fields.as_slice() {
            [m, s] => (0u64, m.parse::<u64>().map_err(|_| invalid())?, s.parse::<u64>().map_err(|_| invalid())?),
            [h, m, s] => (
                h.parse::<u64>().map_err(|_| invalid())?,
                m.parse::<u64>().map_err(|_| invalid())?,
                s.parse::<u64>().map_err(|_| invalid())?,
            ),
            _ => return Err(invalid()),
        };

        let millis = match frac {
            Some(f) if f.len() <= 3 && !f.is_empty() => {
                let padded = format!("{f:0<3}");
                padded.parse::<u64>().map_err(|_| invalid())?
            }
            Some(_) => return Err(invalid()),
            None => 0,
        };

        let total_ms = ((hours * 3600 + mins * 60 + secs) * 1000) + millis;
        Ok(AudioTimestamp::from_millis(total_ms))
    }
}

impl fmt::Display for AudioTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (hours, mins, secs, ms) = self.parts();
        write!(f, "{hours:02}:{mins:02}:{secs:02}.{ms:03}")
    }
}

impl AudioTimestamp {
    /// `HH:MM:SS.mmm`, or `HH:MM:SS` when the fractional part rounds to zero.
    pub fn to_display_string(&self) -> String {
        let (hours, mins, secs, ms) = self.parts();
        if ms == 0 {
            format!("{hours:02}:{mins:02}:{secs:02}")
        } else {
            format!("{hours:02}:{mins:02}:{secs:02}.{ms:03}")
        }
    }
}
