use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::link_speed::{
    distance_calculator::LinkDistance, link_splitter::Link, shape_resolver::GeometryProvenance,
    ServiceTime,
};

/// data quality of a record's travel time.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Valid,
    /// arrival precedes departure after normalization; speed is undefined
    InvalidDuration,
    /// zero travel time; speed is undefined
    UndefinedSpeed,
}

/// route, agency and calendar attributes shared by every link of a trip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripAttributes {
    pub route_short_name: Option<String>,
    pub agency_name: Option<String>,
    pub calendar_start: Option<NaiveDate>,
    pub calendar_end: Option<NaiveDate>,
}

/// one link traversed by one trip.
#[derive(Debug, Clone)]
pub struct TripLinkRecord {
    pub trip_id: String,
    pub route_id: String,
    pub service_id: String,
    pub direction_id: Option<u8>,
    pub shape_key: String,
    pub provenance: GeometryProvenance,
    pub attributes: TripAttributes,
    pub link: Link,
    pub distance: LinkDistance,
    pub begin_departure: ServiceTime,
    pub end_arrival: ServiceTime,
    /// signed; negative when the record has an invalid duration
    pub travel_time_hours: f64,
    /// distance units per hour, `None` unless the record is valid
    pub speed: Option<f64>,
    pub period: String,
    pub status: RecordStatus,
    pub zero_length: bool,
}
