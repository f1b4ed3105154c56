use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// a row of stops.txt
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StopRecord {
    pub stop_id: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// station this stop belongs to, used when the stop has no location
    pub parent_station: Option<String>,
}

impl StopRecord {
    pub fn new(stop_id: &str, longitude: f64, latitude: f64) -> StopRecord {
        StopRecord {
            stop_id: stop_id.to_string(),
            latitude: Some(latitude),
            longitude: Some(longitude),
            parent_station: None,
        }
    }
}

/// a row of trips.txt
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TripRecord {
    pub trip_id: String,
    pub route_id: String,
    pub service_id: String,
    pub shape_id: Option<String>,
    pub direction_id: Option<u8>,
}

impl TripRecord {
    pub fn new(trip_id: &str, route_id: &str, shape_id: Option<&str>) -> TripRecord {
        TripRecord {
            trip_id: trip_id.to_string(),
            route_id: route_id.to_string(),
            service_id: String::from("weekday"),
            shape_id: shape_id.map(String::from),
            direction_id: None,
        }
    }
}

/// a row of stop_times.txt. times are kept as written in the feed, so the
/// hour may exceed 23; see [`crate::link_speed::ServiceTime`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StopVisit {
    pub trip_id: String,
    pub stop_id: String,
    pub stop_sequence: u32,
    pub arrival_time: Option<String>,
    pub departure_time: Option<String>,
}

impl StopVisit {
    pub fn new(
        trip_id: &str,
        stop_id: &str,
        stop_sequence: u32,
        arrival_time: &str,
        departure_time: &str,
    ) -> StopVisit {
        StopVisit {
            trip_id: trip_id.to_string(),
            stop_id: stop_id.to_string(),
            stop_sequence,
            arrival_time: Some(arrival_time.to_string()),
            departure_time: Some(departure_time.to_string()),
        }
    }
}

/// a row of shapes.txt
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ShapePoint {
    pub shape_id: String,
    pub sequence: usize,
    pub latitude: f64,
    pub longitude: f64,
}

/// a row of routes.txt
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RouteRecord {
    pub route_id: String,
    pub agency_id: Option<String>,
    pub short_name: Option<String>,
    pub long_name: Option<String>,
}

/// a row of agency.txt
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AgencyRecord {
    pub agency_id: Option<String>,
    pub name: String,
}

/// a row of calendar.txt, reduced to the dates it covers.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CalendarRecord {
    pub service_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}
