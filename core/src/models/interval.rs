//! Date interval value
//!
//! A closed `[start, end]` range of timestamps stored as a single column value.

use std::fmt::{Display, Formatter, Result as FmtResult};

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};
use super::row::StorageKind;

/// A pair of timestamps with `start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "(NaiveDateTime, NaiveDateTime)", into = "(NaiveDateTime, NaiveDateTime)")]
pub struct DateInterval {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl DateInterval {
    /// Create a new interval, failing when `start` is after `end`
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self> {
        if start > end {
            return Err(ValidationError::InvalidInterval { start, end });
        }
        Ok(DateInterval { start, end })
    }

    /// Storage representation used when this type appears as a column
    pub fn storage_kind() -> StorageKind {
        StorageKind::Interval
    }

    /// Interval start
    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Interval end
    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Length of the interval
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Whether `ts` lies within the interval, both ends included
    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        self.start <= ts && ts <= self.end
    }
}

impl TryFrom<(NaiveDateTime, NaiveDateTime)> for DateInterval {
    type Error = ValidationError;

    fn try_from((start, end): (NaiveDateTime, NaiveDateTime)) -> Result<Self> {
        DateInterval::new(start, end)
    }
}

impl From<DateInterval> for (NaiveDateTime, NaiveDateTime) {
    fn from(interval: DateInterval) -> Self {
        (interval.start, interval.end)
    }
}

impl Display for DateInterval {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}
