use crate::link_speed::ExclusionKind;

#[derive(thiserror::Error, Debug)]
pub enum LinkSpeedError {
    #[error("Failed to parse gtfs bundle file into `Gtfs` struct: {0}")]
    BundleReadError(#[from] gtfs_structures::Error),
    #[error("Trip {trip_id} has neither a shape nor two distinct stop visits")]
    MissingGeometryError { trip_id: String },
    #[error("Stop {stop_id} (sequence {stop_sequence}) on trip {trip_id} is {offset:.3} from its path, beyond tolerance {tolerance:.3}")]
    SnapFailureError {
        trip_id: String,
        stop_id: String,
        stop_sequence: u32,
        offset: f64,
        tolerance: f64,
    },
    #[error("Snapped positions of trip {trip_id} decrease at stop sequence {stop_sequence}: {previous} then {current}")]
    DegenerateSplitError {
        trip_id: String,
        stop_sequence: u32,
        previous: f64,
        current: f64,
    },
    #[error("Missing lon,lat data and parent_location for stop {stop_id} on trip {trip_id}")]
    MissingStopLocationError { trip_id: String, stop_id: String },
    #[error("Missing both arrival and departure times for stop {stop_id} (sequence {stop_sequence}) on trip {trip_id}")]
    MissingStopTimeError {
        trip_id: String,
        stop_id: String,
        stop_sequence: u32,
    },
    #[error("Invalid GTFS time '{0}', expected HH:MM:SS")]
    InvalidTimeError(String),
    #[error("Invalid configuration: {0}")]
    ConfigurationError(String),
    #[error("No link records to aggregate: {0}")]
    EmptyInputError(String),
    #[error("Failed writing output: {0}")]
    OutputError(String),
    #[error("{0}")]
    OtherError(String),
}

impl LinkSpeedError {
    /// the exclusion report category for errors that are isolated to a
    /// single trip. batch-level errors have no category and abort the run.
    pub fn exclusion_kind(&self) -> Option<ExclusionKind> {
        match self {
            LinkSpeedError::MissingGeometryError { .. } => Some(ExclusionKind::MissingGeometry),
            LinkSpeedError::SnapFailureError { .. } => Some(ExclusionKind::SnapFailure),
            LinkSpeedError::DegenerateSplitError { .. } => Some(ExclusionKind::DegenerateSplit),
            LinkSpeedError::MissingStopLocationError { .. } => {
                Some(ExclusionKind::MissingStopLocation)
            }
            LinkSpeedError::MissingStopTimeError { .. } => Some(ExclusionKind::MissingStopTime),
            LinkSpeedError::InvalidTimeError(_) => Some(ExclusionKind::InvalidTime),
            _ => None,
        }
    }
}
