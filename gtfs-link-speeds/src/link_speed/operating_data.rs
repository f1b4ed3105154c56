use std::collections::BTreeMap;

use chrono::NaiveDate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::link_speed::{
    config::PeriodClassifier,
    dataset::{DatasetProvider, StopVisit, TripRecord},
    LinkSpeedError, ServiceTime,
};

/// a row in the operating data file: the trips of one route pattern that
/// start within one time-of-day period.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OperatingDataRow {
    pub route_id: String,
    pub route_short_name: Option<String>,
    pub shape_id: Option<String>,
    pub direction_id: Option<u8>,
    pub service_id: String,
    pub period: String,
    /// trips whose first departure falls in the period
    pub trips: usize,
    pub first_trip_start: String,
    pub last_trip_start: String,
    /// minutes from the first to the last trip start
    pub service_span_minutes: f64,
    /// period length over trip count. empty for the catch-all period.
    pub headway_minutes: Option<f64>,
    /// mean gap between consecutive trip starts. empty for a single trip.
    pub span_headway_minutes: Option<f64>,
    /// summed first departure to last arrival of each trip
    pub vehicle_service_hours: f64,
    pub calendar_start: Option<NaiveDate>,
    pub calendar_end: Option<NaiveDate>,
}

/// start and end of one trip on the service day.
#[derive(Debug, Clone, Copy, PartialEq)]
struct TripSpan {
    start: ServiceTime,
    end: ServiceTime,
}

impl TripSpan {
    /// first departure and last arrival of the trip, each falling back to
    /// the other time at the same stop.
    fn new(trip: &TripRecord, visits: &[StopVisit]) -> Result<TripSpan, LinkSpeedError> {
        let (Some(first), Some(last)) = (visits.first(), visits.last()) else {
            return Err(LinkSpeedError::OtherError(format!(
                "trip {} has no stop times",
                trip.trip_id
            )));
        };
        let time = |visit: &StopVisit, raw: Option<&String>| {
            raw.ok_or_else(|| LinkSpeedError::MissingStopTimeError {
                trip_id: trip.trip_id.clone(),
                stop_id: visit.stop_id.clone(),
                stop_sequence: visit.stop_sequence,
            })
            .and_then(|t| ServiceTime::parse(t))
        };
        let start = time(first, first.departure_time.as_ref().or(first.arrival_time.as_ref()))?;
        let end = time(last, last.arrival_time.as_ref().or(last.departure_time.as_ref()))?;
        Ok(TripSpan { start, end })
    }

    fn hours(&self) -> f64 {
        (self.end.total_seconds() as f64 - self.start.total_seconds() as f64) / 3600.0
    }
}

type PatternKey = (String, Option<String>, Option<u8>, String, String);

/// counts trips, headways and vehicle service hours per route, shape,
/// direction, service id and the period each trip starts in.
///
/// trips without usable times at their first or last stop are skipped.
pub fn operating_data(
    dataset: &dyn DatasetProvider,
    classifier: &PeriodClassifier,
) -> Vec<OperatingDataRow> {
    let mut groups: BTreeMap<PatternKey, Vec<TripSpan>> = BTreeMap::new();
    for trip in dataset.trips() {
        let span = match TripSpan::new(trip, dataset.stop_visits(&trip.trip_id)) {
            Ok(span) => span,
            Err(e) => {
                log::warn!("no operating data for trip {}: {e}", trip.trip_id);
                continue;
            }
        };
        let key = (
            trip.route_id.clone(),
            trip.shape_id.clone(),
            trip.direction_id,
            trip.service_id.clone(),
            classifier.classify(&span.start).to_string(),
        );
        groups.entry(key).or_default().push(span);
    }

    groups
        .into_iter()
        .filter_map(|((route_id, shape_id, direction_id, service_id, period), spans)| {
            let (first, last) = spans.iter().map(|s| s.start).minmax().into_option()?;
            let trips = spans.len();
            let service_span_minutes =
                (last.total_seconds() as f64 - first.total_seconds() as f64) / 60.0;
            let route = dataset.route(&route_id);
            let calendar = dataset.calendar(&service_id);
            Some(OperatingDataRow {
                route_short_name: route.and_then(|r| r.short_name.clone()),
                shape_id,
                direction_id,
                period: period.clone(),
                trips,
                first_trip_start: first.to_gtfs_string(),
                last_trip_start: last.to_gtfs_string(),
                service_span_minutes,
                headway_minutes: classifier
                    .period_seconds(&period)
                    .map(|s| s as f64 / 60.0 / trips as f64),
                span_headway_minutes: if trips > 1 {
                    Some(service_span_minutes / (trips - 1) as f64)
                } else {
                    None
                },
                vehicle_service_hours: spans.iter().map(TripSpan::hours).sum(),
                calendar_start: calendar.map(|c| c.start_date),
                calendar_end: calendar.map(|c| c.end_date),
                route_id,
                service_id,
            })
        })
        .collect_vec()
}
