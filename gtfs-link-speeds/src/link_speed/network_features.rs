use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use wkt::ToWkt;

use crate::link_speed::{
    dataset::DatasetProvider,
    shape_resolver::GeometryProvenance,
    trip_ops::LinkSpeedEngine,
};

/// a row in the route shapes file: one resolved trip path shared by the
/// trips of a route, service and direction.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ShapeLineRow {
    /// shape id, or the trip id when the path was built from stops
    pub shape_id: String,
    pub provenance: GeometryProvenance,
    pub agency_name: Option<String>,
    pub route_id: String,
    pub route_short_name: Option<String>,
    pub route_long_name: Option<String>,
    pub service_id: String,
    pub direction_id: Option<u8>,
    pub trips: usize,
    pub geometry: String,
}

/// a row in the stops file: a stop and the service it sees under one
/// service id.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StopPointRow {
    pub stop_id: String,
    pub service_id: String,
    pub agency_name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub trips: usize,
    /// `;`-separated route short names, or route ids where a route has none
    pub routes: String,
}

/// resolves every trip path and groups them by shape, route, service and
/// direction. trips whose path cannot be resolved are skipped.
pub fn shape_lines(engine: &LinkSpeedEngine, dataset: &dyn DatasetProvider) -> Vec<ShapeLineRow> {
    let mut groups: BTreeMap<(String, String, String, Option<u8>), ShapeLineRow> = BTreeMap::new();
    let trips = dataset.trips().sorted_by(|a, b| a.trip_id.cmp(&b.trip_id));
    for trip in trips {
        let geometry = match engine.resolve_geometry(trip) {
            Ok((geometry, _)) => geometry,
            Err(e) => {
                log::warn!("no path for trip {}: {e}", trip.trip_id);
                continue;
            }
        };
        let key = (
            geometry.shape_key.clone(),
            trip.route_id.clone(),
            trip.service_id.clone(),
            trip.direction_id,
        );
        groups
            .entry(key)
            .or_insert_with(|| {
                let route = dataset.route(&trip.route_id);
                ShapeLineRow {
                    shape_id: geometry.shape_key.clone(),
                    provenance: geometry.provenance,
                    agency_name: dataset
                        .agency_name(route.and_then(|r| r.agency_id.as_deref()))
                        .map(String::from),
                    route_id: trip.route_id.clone(),
                    route_short_name: route.and_then(|r| r.short_name.clone()),
                    route_long_name: route.and_then(|r| r.long_name.clone()),
                    service_id: trip.service_id.clone(),
                    direction_id: trip.direction_id,
                    trips: 0,
                    geometry: engine
                        .projection()
                        .unproject_linestring(geometry.path.linestring())
                        .wkt_string(),
                }
            })
            .trips += 1;
    }
    groups.into_values().collect_vec()
}

/// counts the trips and routes serving each stop under each service id.
pub fn stop_points(dataset: &dyn DatasetProvider) -> Vec<StopPointRow> {
    #[derive(Default)]
    struct StopService<'a> {
        trips: BTreeSet<&'a str>,
        routes: BTreeSet<&'a str>,
        agencies: BTreeSet<&'a str>,
    }

    let mut groups: BTreeMap<(&str, &str), StopService> = BTreeMap::new();
    for trip in dataset.trips() {
        let route = dataset.route(&trip.route_id);
        let route_name = route
            .and_then(|r| r.short_name.as_deref())
            .unwrap_or(trip.route_id.as_str());
        let agency = dataset.agency_name(route.and_then(|r| r.agency_id.as_deref()));
        for visit in dataset.stop_visits(&trip.trip_id) {
            let entry = groups
                .entry((visit.stop_id.as_str(), trip.service_id.as_str()))
                .or_default();
            entry.trips.insert(trip.trip_id.as_str());
            entry.routes.insert(route_name);
            entry.agencies.extend(agency);
        }
    }

    groups
        .into_iter()
        .map(|((stop_id, service_id), service)| {
            let location = dataset.stop_location(stop_id);
            StopPointRow {
                stop_id: stop_id.to_string(),
                service_id: service_id.to_string(),
                agency_name: if service.agencies.is_empty() {
                    None
                } else {
                    Some(service.agencies.iter().join(";"))
                },
                latitude: location.map(|(_, lat)| lat),
                longitude: location.map(|(lon, _)| lon),
                trips: service.trips.len(),
                routes: service.routes.iter().join(";"),
            }
        })
        .collect_vec()
}

#[cfg(test)]
mod test {
    use super::{shape_lines, stop_points};
    use crate::link_speed::{
        config::{DistanceUnit, LinkSpeedConfig},
        dataset::{GtfsTables, RouteRecord, ShapePoint, StopRecord, StopVisit, TripRecord},
        geometry::ProjectionConfig,
        shape_resolver::GeometryProvenance,
        trip_ops::LinkSpeedEngine,
    };

    fn tables() -> GtfsTables {
        let visits = ["t1", "t2", "t3"]
            .iter()
            .flat_map(|t| {
                vec![
                    StopVisit::new(t, "A", 1, "08:00:00", "08:00:00"),
                    StopVisit::new(t, "B", 2, "08:05:00", "08:05:00"),
                ]
            })
            .collect();
        GtfsTables::new(
            vec![StopRecord::new("A", 0.0, 0.0), StopRecord::new("B", 0.0, 10.0)],
            vec![
                TripRecord::new("t1", "r1", Some("s1")),
                TripRecord::new("t2", "r1", Some("s1")),
                TripRecord::new("t3", "r2", None),
            ],
            visits,
        )
        .with_shapes(vec![
            ShapePoint {
                shape_id: String::from("s1"),
                sequence: 1,
                latitude: 0.0,
                longitude: 0.0,
            },
            ShapePoint {
                shape_id: String::from("s1"),
                sequence: 2,
                latitude: 10.0,
                longitude: 0.0,
            },
        ])
        .with_routes(vec![RouteRecord {
            route_id: String::from("r1"),
            agency_id: None,
            short_name: Some(String::from("42")),
            long_name: Some(String::from("Crosstown")),
        }])
    }

    #[test]
    fn test_shape_lines_grouped() {
        let tables = tables();
        let config = LinkSpeedConfig {
            projection: ProjectionConfig::Planar {
                native_unit: DistanceUnit::Meters,
            },
            ..Default::default()
        };
        let engine = LinkSpeedEngine::new(&tables, &config).expect("engine");
        let rows = shape_lines(&engine, &tables);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].shape_id, "s1");
        assert_eq!(rows[0].trips, 2);
        assert_eq!(rows[0].provenance, GeometryProvenance::FromShape);
        assert_eq!(rows[0].route_short_name.as_deref(), Some("42"));
        assert_eq!(rows[0].geometry, "LINESTRING(0 0,0 10)");
        assert_eq!(rows[1].shape_id, "t3");
        assert_eq!(rows[1].provenance, GeometryProvenance::FromStops);
    }

    #[test]
    fn test_stop_points() {
        let rows = stop_points(&tables());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].stop_id, "A");
        assert_eq!(rows[0].trips, 3);
        assert_eq!(rows[0].routes, "42;r2");
        assert_eq!(rows[1].latitude, Some(10.0));
    }
}
