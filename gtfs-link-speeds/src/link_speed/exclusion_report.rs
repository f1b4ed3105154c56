use std::collections::BTreeMap;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::link_speed::{LinkSpeedError, RecordStatus, TripLinkRecord};

/// categories of data that were left out of (or flagged in) the link speed
/// outputs. trip and stop level errors remove data, record level flags keep
/// the record but remove it from the speed statistics.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionKind {
    MissingGeometry,
    SnapFailure,
    DegenerateSplit,
    MissingStopLocation,
    MissingStopTime,
    InvalidTime,
    InvalidDuration,
    UndefinedSpeed,
    ZeroLengthLink,
    /// the trip ran without a trip level error but every link was skipped
    NoLinks,
}

impl Display for ExclusionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ExclusionKind::MissingGeometry => "missing_geometry",
            ExclusionKind::SnapFailure => "snap_failure",
            ExclusionKind::DegenerateSplit => "degenerate_split",
            ExclusionKind::MissingStopLocation => "missing_stop_location",
            ExclusionKind::MissingStopTime => "missing_stop_time",
            ExclusionKind::InvalidTime => "invalid_time",
            ExclusionKind::InvalidDuration => "invalid_duration",
            ExclusionKind::UndefinedSpeed => "undefined_speed",
            ExclusionKind::ZeroLengthLink => "zero_length_link",
            ExclusionKind::NoLinks => "no_links",
        };
        write!(f, "{s}")
    }
}

/// per-batch accounting of everything that kept data out of the outputs.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ExclusionReport {
    /// trips offered to the engine
    pub trips_total: usize,
    /// trips that produced at least one link record
    pub trips_with_links: usize,
    /// trips that produced no records. each one is counted under exactly one
    /// trip level kind, `no_links` when no trip level error explains it
    pub trips_excluded: usize,
    /// link records produced, flagged ones included
    pub records: usize,
    pub exclusions: BTreeMap<ExclusionKind, usize>,
}

impl ExclusionReport {
    pub fn increment(&mut self, kind: ExclusionKind) {
        *self.exclusions.entry(kind).or_insert(0) += 1;
    }

    pub fn count(&self, kind: ExclusionKind) -> usize {
        self.exclusions.get(&kind).copied().unwrap_or_default()
    }

    /// records an error isolated to one trip. returns the error back when it
    /// is not a per-trip condition so the caller can surface it.
    pub fn add_error(&mut self, error: LinkSpeedError) -> Result<(), LinkSpeedError> {
        match error.exclusion_kind() {
            Some(kind) => {
                self.increment(kind);
                Ok(())
            }
            None => Err(error),
        }
    }

    /// counts a trip that produced no records, under its trip level error
    /// when there is one.
    pub fn add_excluded_trip(&mut self, error: Option<LinkSpeedError>) -> Result<(), LinkSpeedError> {
        self.trips_excluded += 1;
        match error {
            Some(error) => self.add_error(error),
            None => {
                self.increment(ExclusionKind::NoLinks);
                Ok(())
            }
        }
    }

    /// counts the flags carried by a record that was kept in the detail table.
    pub fn add_record(&mut self, record: &TripLinkRecord) {
        self.records += 1;
        match record.status {
            RecordStatus::Valid => {}
            RecordStatus::InvalidDuration => self.increment(ExclusionKind::InvalidDuration),
            RecordStatus::UndefinedSpeed => self.increment(ExclusionKind::UndefinedSpeed),
        }
        if record.zero_length {
            self.increment(ExclusionKind::ZeroLengthLink);
        }
    }
}

impl Display for ExclusionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} trips ({} with links, {} excluded), {} records",
            self.trips_total, self.trips_with_links, self.trips_excluded, self.records
        )?;
        for (kind, count) in self.exclusions.iter() {
            write!(f, ", {kind}: {count}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::{ExclusionKind, ExclusionReport};
    use crate::link_speed::LinkSpeedError;

    #[test]
    fn test_trip_errors_are_counted() {
        let mut report = ExclusionReport::default();
        let missing = LinkSpeedError::MissingGeometryError {
            trip_id: String::from("t1"),
        };
        assert!(report.add_error(missing).is_ok());
        assert!(report
            .add_error(LinkSpeedError::InvalidTimeError(String::from("8am")))
            .is_ok());
        assert_eq!(report.count(ExclusionKind::MissingGeometry), 1);
        assert_eq!(report.count(ExclusionKind::InvalidTime), 1);
        assert_eq!(report.count(ExclusionKind::SnapFailure), 0);
    }

    #[test]
    fn test_batch_errors_are_returned() {
        let mut report = ExclusionReport::default();
        let result = report.add_error(LinkSpeedError::OutputError(String::from("disk full")));
        assert!(result.is_err());
        assert!(report.exclusions.is_empty());
    }

    #[test]
    fn test_every_excluded_trip_has_a_kind() {
        let mut report = ExclusionReport::default();
        let missing = LinkSpeedError::MissingGeometryError {
            trip_id: String::from("t1"),
        };
        assert!(report.add_excluded_trip(Some(missing)).is_ok());
        assert!(report.add_excluded_trip(None).is_ok());
        assert_eq!(report.trips_excluded, 2);
        assert_eq!(report.count(ExclusionKind::MissingGeometry), 1);
        assert_eq!(report.count(ExclusionKind::NoLinks), 1);
    }

    #[test]
    fn test_serializes_kinds_in_snake_case() {
        let mut report = ExclusionReport::default();
        report.increment(ExclusionKind::ZeroLengthLink);
        let json = serde_json::to_string(&report).expect("report should serialize");
        assert!(json.contains("\"zero_length_link\":1"));
    }
}
