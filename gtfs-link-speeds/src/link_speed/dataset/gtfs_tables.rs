use std::collections::HashMap;

use gtfs_structures::{DirectionType, Gtfs};
use itertools::Itertools;

use super::{
    AgencyRecord, CalendarRecord, DatasetProvider, RouteRecord, ShapePoint, StopRecord,
    StopVisit, TripRecord,
};
use crate::link_speed::{service_time::format_gtfs_seconds, LinkSpeedError};

/// in-memory GTFS tables keyed by their identifiers.
#[derive(Debug, Clone, Default)]
pub struct GtfsTables {
    stops: HashMap<String, StopRecord>,
    trips: HashMap<String, TripRecord>,
    stop_visits: HashMap<String, Vec<StopVisit>>,
    shapes: HashMap<String, Vec<ShapePoint>>,
    routes: HashMap<String, RouteRecord>,
    agencies: Vec<AgencyRecord>,
    calendars: HashMap<String, CalendarRecord>,
}

impl GtfsTables {
    /// builds the tables from rows, ordering each trip's visits by stop
    /// sequence.
    pub fn new(
        stops: Vec<StopRecord>,
        trips: Vec<TripRecord>,
        stop_visits: Vec<StopVisit>,
    ) -> GtfsTables {
        let mut visits_by_trip: HashMap<String, Vec<StopVisit>> =
            stop_visits.into_iter().into_group_map_by(|v| v.trip_id.clone());
        for visits in visits_by_trip.values_mut() {
            visits.sort_by_key(|v| v.stop_sequence);
        }
        GtfsTables {
            stops: stops.into_iter().map(|s| (s.stop_id.clone(), s)).collect(),
            trips: trips.into_iter().map(|t| (t.trip_id.clone(), t)).collect(),
            stop_visits: visits_by_trip,
            ..Default::default()
        }
    }

    pub fn with_shapes(mut self, shape_points: Vec<ShapePoint>) -> GtfsTables {
        let mut shapes: HashMap<String, Vec<ShapePoint>> = shape_points
            .into_iter()
            .into_group_map_by(|p| p.shape_id.clone());
        for points in shapes.values_mut() {
            points.sort_by_key(|p| p.sequence);
        }
        self.shapes = shapes;
        self
    }

    pub fn with_routes(mut self, routes: Vec<RouteRecord>) -> GtfsTables {
        self.routes = routes.into_iter().map(|r| (r.route_id.clone(), r)).collect();
        self
    }

    pub fn with_agencies(mut self, agencies: Vec<AgencyRecord>) -> GtfsTables {
        self.agencies = agencies;
        self
    }

    pub fn with_calendars(mut self, calendars: Vec<CalendarRecord>) -> GtfsTables {
        self.calendars = calendars
            .into_iter()
            .map(|c| (c.service_id.clone(), c))
            .collect();
        self
    }

    /// reads a GTFS archive (zip file or directory) and adapts it into tables.
    pub fn try_from_path(bundle: &str) -> Result<GtfsTables, LinkSpeedError> {
        let gtfs = Gtfs::new(bundle)?;
        log::info!(
            "read {bundle}: {} stops, {} trips, {} shapes, {} routes",
            gtfs.stops.len(),
            gtfs.trips.len(),
            gtfs.shapes.len(),
            gtfs.routes.len()
        );
        Ok(GtfsTables::from(&gtfs))
    }
}

impl From<&Gtfs> for GtfsTables {
    fn from(gtfs: &Gtfs) -> Self {
        let stops = gtfs
            .stops
            .values()
            .map(|s| StopRecord {
                stop_id: s.id.clone(),
                latitude: s.latitude,
                longitude: s.longitude,
                parent_station: s.parent_station.clone(),
            })
            .collect_vec();
        let trips = gtfs
            .trips
            .values()
            .map(|t| TripRecord {
                trip_id: t.id.clone(),
                route_id: t.route_id.clone(),
                service_id: t.service_id.clone(),
                shape_id: t.shape_id.clone(),
                direction_id: t.direction_id.map(|d| match d {
                    DirectionType::Outbound => 0,
                    DirectionType::Inbound => 1,
                }),
            })
            .collect_vec();
        // `Gtfs` deserializes times as non-negative seconds after the start of
        // the service day, so they are rendered back to their raw form here
        let stop_visits = gtfs
            .trips
            .values()
            .flat_map(|t| {
                t.stop_times.iter().map(|st| StopVisit {
                    trip_id: t.id.clone(),
                    stop_id: st.stop.id.clone(),
                    stop_sequence: st.stop_sequence,
                    arrival_time: st.arrival_time.map(format_gtfs_seconds),
                    departure_time: st.departure_time.map(format_gtfs_seconds),
                })
            })
            .collect_vec();
        let shape_points = gtfs
            .shapes
            .iter()
            .flat_map(|(shape_id, points)| {
                points.iter().map(|p| ShapePoint {
                    shape_id: shape_id.clone(),
                    sequence: p.sequence,
                    latitude: p.latitude,
                    longitude: p.longitude,
                })
            })
            .collect_vec();
        let routes = gtfs
            .routes
            .values()
            .map(|r| RouteRecord {
                route_id: r.id.clone(),
                agency_id: r.agency_id.clone(),
                short_name: r.short_name.clone(),
                long_name: r.long_name.clone(),
            })
            .collect_vec();
        let agencies = gtfs
            .agencies
            .iter()
            .map(|a| AgencyRecord {
                agency_id: a.id.clone(),
                name: a.name.clone(),
            })
            .collect_vec();
        let calendars = gtfs
            .calendar
            .values()
            .map(|c| CalendarRecord {
                service_id: c.id.clone(),
                start_date: c.start_date,
                end_date: c.end_date,
            })
            .collect_vec();

        GtfsTables::new(stops, trips, stop_visits)
            .with_shapes(shape_points)
            .with_routes(routes)
            .with_agencies(agencies)
            .with_calendars(calendars)
    }
}

impl DatasetProvider for GtfsTables {
    fn stop(&self, stop_id: &str) -> Option<&StopRecord> {
        self.stops.get(stop_id)
    }

    fn stops(&self) -> Box<dyn Iterator<Item = &StopRecord> + '_> {
        Box::new(self.stops.values())
    }

    fn trips(&self) -> Box<dyn Iterator<Item = &TripRecord> + '_> {
        Box::new(self.trips.values())
    }

    fn stop_visits(&self, trip_id: &str) -> &[StopVisit] {
        self.stop_visits
            .get(trip_id)
            .map(|v| v.as_slice())
            .unwrap_or_default()
    }

    fn shape_points(&self, shape_id: &str) -> Option<&[ShapePoint]> {
        self.shapes.get(shape_id).map(|v| v.as_slice())
    }

    fn shape_ids(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(self.shapes.keys().map(|k| k.as_str()))
    }

    fn route(&self, route_id: &str) -> Option<&RouteRecord> {
        self.routes.get(route_id)
    }

    fn agency_name(&self, agency_id: Option<&str>) -> Option<&str> {
        match (agency_id, self.agencies.as_slice()) {
            (None, [only]) => Some(only.name.as_str()),
            (None, _) => None,
            (Some(id), agencies) => agencies
                .iter()
                .find(|a| a.agency_id.as_deref() == Some(id))
                .map(|a| a.name.as_str()),
        }
    }

    fn calendar(&self, service_id: &str) -> Option<&CalendarRecord> {
        self.calendars.get(service_id)
    }
}

#[cfg(test)]
mod test {
    use super::GtfsTables;
    use crate::link_speed::dataset::{
        AgencyRecord, DatasetProvider, StopRecord, StopVisit, TripRecord,
    };
    use std::path::PathBuf;

    #[test]
    fn test_visits_ordered_by_sequence() {
        let visits = vec![
            StopVisit::new("t1", "C", 30, "08:10:00", "08:10:00"),
            StopVisit::new("t1", "A", 10, "08:00:00", "08:00:00"),
            StopVisit::new("t1", "B", 20, "08:05:00", "08:05:00"),
        ];
        let tables = GtfsTables::new(vec![], vec![TripRecord::new("t1", "r1", None)], visits);
        let sequences = tables
            .stop_visits("t1")
            .iter()
            .map(|v| v.stop_sequence)
            .collect::<Vec<u32>>();
        assert_eq!(sequences, vec![10, 20, 30]);
        assert!(tables.stop_visits("missing").is_empty());
    }

    #[test]
    fn test_stop_location_uses_parent_station() {
        let parent = StopRecord::new("station", -121.5, 38.5);
        let child = StopRecord {
            stop_id: String::from("platform"),
            latitude: None,
            longitude: None,
            parent_station: Some(String::from("station")),
        };
        let orphan = StopRecord {
            stop_id: String::from("orphan"),
            latitude: None,
            longitude: None,
            parent_station: None,
        };
        let tables = GtfsTables::new(vec![parent, child, orphan], vec![], vec![]);
        assert_eq!(tables.stop_location("platform"), Some((-121.5, 38.5)));
        assert_eq!(tables.stop_location("orphan"), None);
        assert_eq!(tables.mean_stop_latitude(), Some(38.5));
    }

    #[test]
    fn test_single_agency_without_id() {
        let tables = GtfsTables::default().with_agencies(vec![AgencyRecord {
            agency_id: None,
            name: String::from("Yolobus"),
        }]);
        assert_eq!(tables.agency_name(None), Some("Yolobus"));
        assert_eq!(tables.agency_name(Some("other")), None);
    }

    #[test]
    fn test_read_mini_gtfs() {
        let bundle = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("test")
            .join("mini-gtfs");
        let tables = GtfsTables::try_from_path(
            bundle
                .to_str()
                .unwrap_or_else(|| panic!("Failed to interpret {bundle:?} as string")),
        )
        .expect("test bundle should be readable");

        let visits = tables.stop_visits("T1");
        assert_eq!(visits.len(), 3);
        assert_eq!(visits[0].departure_time.as_deref(), Some("07:00:00"));
        let late = tables.stop_visits("T3");
        assert_eq!(late[2].arrival_time.as_deref(), Some("25:10:00"));
        assert_eq!(tables.shape_points("SH1").map(|p| p.len()), Some(3));
        assert_eq!(tables.agency_name(Some("A1")), Some("Valley Transit"));
        assert!(tables.calendar("WK").is_some());
    }
}
