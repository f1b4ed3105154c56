use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use wkt::ToWkt;

use crate::link_speed::{
    config::DistanceUnit,
    distance_calculator::DistanceSource,
    geometry::Projection,
    link_aggregator::LinkSummary,
    trip_link_record::{RecordStatus, TripLinkRecord},
};

/// a row in the link speed detail file: one link traversed by one trip.
/// geometry is WKT in WGS84 longitude, latitude.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DetailRow {
    pub trip_id: String,
    pub route_id: String,
    pub route_short_name: Option<String>,
    pub agency_name: Option<String>,
    pub service_id: String,
    pub calendar_start: Option<NaiveDate>,
    pub calendar_end: Option<NaiveDate>,
    pub direction_id: Option<u8>,
    pub shape_id: String,
    pub link_id: String,
    pub begin_stop_id: String,
    pub end_stop_id: String,
    pub begin_stop_sequence: u32,
    pub end_stop_sequence: u32,
    /// normalized time, with `+N` when it falls N days after the service day
    pub begin_departure: String,
    pub end_arrival: String,
    pub travel_time_hours: f64,
    pub distance: f64,
    pub distance_unit: DistanceUnit,
    pub distance_source: DistanceSource,
    /// distance units per hour
    pub speed: Option<f64>,
    pub period: String,
    pub status: RecordStatus,
    pub zero_length: bool,
    pub geometry: String,
}

impl DetailRow {
    pub fn new(record: &TripLinkRecord, projection: &Projection, unit: DistanceUnit) -> DetailRow {
        DetailRow {
            trip_id: record.trip_id.clone(),
            route_id: record.route_id.clone(),
            route_short_name: record.attributes.route_short_name.clone(),
            agency_name: record.attributes.agency_name.clone(),
            service_id: record.service_id.clone(),
            calendar_start: record.attributes.calendar_start,
            calendar_end: record.attributes.calendar_end,
            direction_id: record.direction_id,
            shape_id: record.shape_key.clone(),
            link_id: record.link.link_id.clone(),
            begin_stop_id: record.link.begin_stop_id.clone(),
            end_stop_id: record.link.end_stop_id.clone(),
            begin_stop_sequence: record.link.begin_sequence,
            end_stop_sequence: record.link.end_sequence,
            begin_departure: record.begin_departure.to_string(),
            end_arrival: record.end_arrival.to_string(),
            travel_time_hours: record.travel_time_hours,
            distance: record.distance.value,
            distance_unit: unit,
            distance_source: record.distance.source,
            speed: record.speed,
            period: record.period.clone(),
            status: record.status,
            zero_length: record.zero_length,
            geometry: projection
                .unproject_linestring(&record.link.geometry)
                .wkt_string(),
        }
    }
}

/// a row in the link speed summary file: speed statistics for one link in
/// one period, with the link's representative geometry.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SummaryRow {
    pub link_id: String,
    pub begin_stop_id: String,
    pub end_stop_id: String,
    pub period: String,
    pub included: usize,
    pub excluded: usize,
    pub min_speed: Option<f64>,
    pub max_speed: Option<f64>,
    pub mean_speed: Option<f64>,
    pub stdev_speed: Option<f64>,
    pub distance: f64,
    pub distance_unit: DistanceUnit,
    pub distance_source: DistanceSource,
    pub geometry: String,
}

impl SummaryRow {
    pub fn new(summary: &LinkSummary, projection: &Projection, unit: DistanceUnit) -> SummaryRow {
        SummaryRow {
            link_id: summary.link_id.clone(),
            begin_stop_id: summary.begin_stop_id.clone(),
            end_stop_id: summary.end_stop_id.clone(),
            period: summary.period.clone(),
            included: summary.included,
            excluded: summary.excluded,
            min_speed: summary.min_speed,
            max_speed: summary.max_speed,
            mean_speed: summary.mean_speed,
            stdev_speed: summary.stdev_speed,
            distance: summary.distance.value,
            distance_unit: unit,
            distance_source: summary.distance.source,
            geometry: projection.unproject_linestring(&summary.geometry).wkt_string(),
        }
    }
}
