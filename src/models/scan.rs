//! Scan event model.
//!
//! A scan event is appended every time the public landing page for a
//! business is loaded. Events are never edited or reordered.

use std::fmt;

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::business::BusinessId;

/// Canonical string layout of a scan time, local wall clock, no offset.
const CANONICAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Point in time at which a scan happened.
///
/// Stored as its canonical string form `YYYY-MM-DD HH:MM:SS.ffffff`. The
/// calendar day used for bucketing is everything before the first space, so
/// no timezone normalization happens and bucket boundaries follow the wall
/// clock the event was recorded with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanTimestamp(String);

impl ScanTimestamp {
    /// Current local time.
    pub fn now() -> Self {
        Self::from(Local::now().naive_local())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Calendar-day key: the prefix up to (not including) the first space.
    ///
    /// A value without any space is its own day key.
    pub fn day_key(&self) -> &str {
        match self.0.split_once(' ') {
            Some((day, _)) => day,
            None => &self.0,
        }
    }
}

impl From<NaiveDateTime> for ScanTimestamp {
    fn from(value: NaiveDateTime) -> Self {
        Self(value.format(CANONICAL_FORMAT).to_string())
    }
}

impl From<String> for ScanTimestamp {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ScanTimestamp {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ScanTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded visit of a business's landing page.
///
/// `business_id` is a weak reference: the event survives deletion of the
/// business unless scans are purged explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanEvent {
    pub business_id: BusinessId,

    pub time: ScanTimestamp,
}

impl ScanEvent {
    pub fn new(business_id: BusinessId, time: ScanTimestamp) -> Self {
        Self { business_id, time }
    }
}
