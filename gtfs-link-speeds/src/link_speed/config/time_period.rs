use serde::{Deserialize, Serialize};

use crate::link_speed::service_time::parse_gtfs_seconds;
use crate::link_speed::{LinkSpeedError, ServiceTime};

/// a configured time-of-day bucket covering `[start, end)`, both written as
/// `HH:MM:SS`. `end` may be `24:00:00` to close the day.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TimePeriod {
    pub label: String,
    pub start: String,
    pub end: String,
}

impl TimePeriod {
    pub fn new(label: &str, start: &str, end: &str) -> TimePeriod {
        TimePeriod {
            label: label.to_string(),
            start: start.to_string(),
            end: end.to_string(),
        }
    }
}

/// assigns departure times to the first configured period that contains
/// them, or to the catch-all label when none does.
#[derive(Debug, Clone)]
pub struct PeriodClassifier {
    bounds: Vec<(String, u32, u32)>,
    unclassified_label: String,
}

impl PeriodClassifier {
    pub fn new(
        periods: &[TimePeriod],
        unclassified_label: &str,
    ) -> Result<PeriodClassifier, LinkSpeedError> {
        let bounds = periods
            .iter()
            .map(|p| {
                let invalid = |msg: String| {
                    LinkSpeedError::ConfigurationError(format!("period '{}': {msg}", p.label))
                };
                if p.label.trim().is_empty() {
                    return Err(invalid(String::from("label must not be empty")));
                }
                let start = parse_gtfs_seconds(&p.start).map_err(|e| invalid(e.to_string()))?;
                let end = parse_gtfs_seconds(&p.end).map_err(|e| invalid(e.to_string()))?;
                if end > ServiceTime::SECONDS_PER_DAY {
                    return Err(invalid(format!("end {} is past 24:00:00", p.end)));
                }
                if start >= end {
                    return Err(invalid(format!(
                        "start {} must precede end {}",
                        p.start, p.end
                    )));
                }
                Ok((p.label.clone(), start, end))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PeriodClassifier {
            bounds,
            unclassified_label: unclassified_label.to_string(),
        })
    }

    /// the period label for a departure, using only its time of day.
    pub fn classify(&self, time: &ServiceTime) -> &str {
        let t = time.seconds_of_day();
        self.bounds
            .iter()
            .find(|(_, start, end)| *start <= t && t < *end)
            .map(|(label, _, _)| label.as_str())
            .unwrap_or(&self.unclassified_label)
    }

    pub fn unclassified_label(&self) -> &str {
        &self.unclassified_label
    }

    /// length in seconds of a configured period. the catch-all label has no
    /// fixed length.
    pub fn period_seconds(&self, label: &str) -> Option<u32> {
        self.bounds
            .iter()
            .find(|(l, _, _)| l == label)
            .map(|(_, start, end)| end - start)
    }
}
