use std::fmt::Display;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::link_speed::LinkSpeedError;

/// a GTFS scheduled time normalized onto a 24-hour clock plus a day offset.
///
/// GTFS writes post-midnight service as hours past 23 (`25:10:00` is 1:10am
/// on the day after the service day). ordering compares the day offset
/// first, so `25:10:00` sorts after `23:59:00`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServiceTime {
    /// number of days past the service day
    pub day_offset: u32,
    pub time_of_day: NaiveTime,
}

impl ServiceTime {
    pub const SECONDS_PER_DAY: u32 = 86_400;

    /// builds a time from seconds after the start of the service day.
    pub fn from_seconds(seconds: u32) -> Result<ServiceTime, LinkSpeedError> {
        let day_offset = seconds / Self::SECONDS_PER_DAY;
        let remainder = seconds % Self::SECONDS_PER_DAY;
        let time_of_day = NaiveTime::from_num_seconds_from_midnight_opt(remainder, 0)
            .ok_or_else(|| LinkSpeedError::InvalidTimeError(format!("{seconds} seconds")))?;
        Ok(ServiceTime {
            day_offset,
            time_of_day,
        })
    }

    /// parses a raw `HH:MM:SS` GTFS time where the hour may exceed 23.
    pub fn parse(raw: &str) -> Result<ServiceTime, LinkSpeedError> {
        let seconds = parse_gtfs_seconds(raw)?;
        Self::from_seconds(seconds)
    }

    /// seconds after the start of the service day, day offset included.
    pub fn total_seconds(&self) -> u32 {
        self.day_offset * Self::SECONDS_PER_DAY + self.seconds_of_day()
    }

    /// seconds after midnight on the 24-hour clock, ignoring the day offset.
    pub fn seconds_of_day(&self) -> u32 {
        self.time_of_day.num_seconds_from_midnight()
    }

    /// renders this time back to the raw GTFS form, e.g. `25:10:00`.
    pub fn to_gtfs_string(&self) -> String {
        format_gtfs_seconds(self.total_seconds())
    }
}

impl Display for ServiceTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.time_of_day.format("%H:%M:%S"))?;
        if self.day_offset > 0 {
            write!(f, "+{}", self.day_offset)?;
        }
        Ok(())
    }
}

/// parses `H:MM:SS` or `HH:MM:SS` into seconds, allowing hours beyond 23.
pub fn parse_gtfs_seconds(raw: &str) -> Result<u32, LinkSpeedError> {
    let invalid = || LinkSpeedError::InvalidTimeError(raw.to_string());
    let mut parts = raw.trim().split(':');
    let (h, m, s) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(h), Some(m), Some(s), None) => (h, m, s),
        _ => return Err(invalid()),
    };
    let hours = h.parse::<u32>().map_err(|_| invalid())?;
    let minutes = m.parse::<u32>().map_err(|_| invalid())?;
    let seconds = s.parse::<u32>().map_err(|_| invalid())?;
    if m.len() != 2 || s.len() != 2 || minutes > 59 || seconds > 59 {
        return Err(invalid());
    }
    hours
        .checked_mul(3600)
        .and_then(|h| h.checked_add(minutes * 60 + seconds))
        .ok_or_else(invalid)
}

/// inverse of [`parse_gtfs_seconds`].
pub fn format_gtfs_seconds(seconds: u32) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}
