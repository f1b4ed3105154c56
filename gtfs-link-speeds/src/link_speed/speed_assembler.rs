use uom::si::f64::Time;
use uom::si::time::{hour, second};

use crate::link_speed::{
    config::PeriodClassifier,
    dataset::{StopVisit, TripRecord},
    distance_calculator::LinkDistance,
    link_splitter::Link,
    shape_resolver::TripGeometry,
    trip_link_record::{RecordStatus, TripAttributes, TripLinkRecord},
    LinkSpeedError, ServiceTime,
};

/// pairs link distances with scheduled stop times.
pub struct SpeedAssembler<'a> {
    classifier: &'a PeriodClassifier,
}

impl<'a> SpeedAssembler<'a> {
    pub fn new(classifier: &'a PeriodClassifier) -> SpeedAssembler<'a> {
        SpeedAssembler { classifier }
    }

    /// builds the record for `link`, bounded by the `begin` and `end` visits.
    ///
    /// negative and zero travel times still produce a record, flagged by its
    /// [`RecordStatus`] and carrying no speed.
    #[allow(clippy::too_many_arguments)]
    pub fn assemble(
        &self,
        trip: &TripRecord,
        geometry: &TripGeometry,
        attributes: &TripAttributes,
        link: Link,
        distance: LinkDistance,
        begin: &StopVisit,
        end: &StopVisit,
    ) -> Result<TripLinkRecord, LinkSpeedError> {
        let departure_raw = begin
            .departure_time
            .as_deref()
            .or(begin.arrival_time.as_deref())
            .ok_or_else(|| missing_times(begin))?;
        let arrival_raw = end
            .arrival_time
            .as_deref()
            .or(end.departure_time.as_deref())
            .ok_or_else(|| missing_times(end))?;
        let begin_departure = ServiceTime::parse(departure_raw)?;
        let end_arrival = ServiceTime::parse(arrival_raw)?;

        let elapsed = end_arrival.total_seconds() as i64 - begin_departure.total_seconds() as i64;
        let travel_time_hours = Time::new::<second>(elapsed as f64).get::<hour>();
        let (status, speed) = match elapsed {
            e if e < 0 => {
                log::warn!(
                    "trip {} arrives at {} ({end_arrival}) before departing {} ({begin_departure})",
                    trip.trip_id,
                    end.stop_id,
                    begin.stop_id
                );
                (RecordStatus::InvalidDuration, None)
            }
            0 => (RecordStatus::UndefinedSpeed, None),
            _ => (RecordStatus::Valid, Some(distance.value / travel_time_hours)),
        };

        Ok(TripLinkRecord {
            trip_id: trip.trip_id.clone(),
            route_id: trip.route_id.clone(),
            service_id: trip.service_id.clone(),
            direction_id: trip.direction_id,
            shape_key: geometry.shape_key.clone(),
            provenance: geometry.provenance,
            attributes: attributes.clone(),
            zero_length: distance.zero_length,
            link,
            distance,
            begin_departure,
            end_arrival,
            travel_time_hours,
            speed,
            period: self.classifier.classify(&begin_departure).to_string(),
            status,
        })
    }
}

fn missing_times(visit: &StopVisit) -> LinkSpeedError {
    LinkSpeedError::MissingStopTimeError {
        trip_id: visit.trip_id.clone(),
        stop_id: visit.stop_id.clone(),
        stop_sequence: visit.stop_sequence,
    }
}
