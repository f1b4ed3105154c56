use std::collections::HashMap;
use std::sync::Arc;

use geo::{Coord, LineString};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::link_speed::{
    dataset::{DatasetProvider, StopVisit, TripRecord},
    geometry::{MeasuredPath, Projection},
    LinkSpeedError,
};

/// where a trip's path geometry came from.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum GeometryProvenance {
    FromShape,
    FromStops,
}

/// a stop visit together with the projected location of its stop.
#[derive(Debug, Clone, Copy)]
pub struct LocatedVisit<'a> {
    pub visit: &'a StopVisit,
    pub coord: Coord<f64>,
}

/// the path a trip follows, in projected coordinates.
#[derive(Debug, Clone)]
pub struct TripGeometry {
    pub trip_id: String,
    /// shape id, or the trip id when the path was built from stops
    pub shape_key: String,
    pub path: Arc<MeasuredPath>,
    pub provenance: GeometryProvenance,
}

/// resolves trip paths. shapes are projected once up front and shared by
/// every trip that references them.
pub struct ShapeResolver {
    shapes: HashMap<String, Arc<MeasuredPath>>,
    use_shapes: bool,
}

impl ShapeResolver {
    pub fn new(dataset: &dyn DatasetProvider, projection: &Projection, use_shapes: bool) -> Self {
        let shapes: HashMap<String, Arc<MeasuredPath>> = if use_shapes {
            dataset
                .shape_ids()
                .filter_map(|shape_id| {
                    let points = dataset.shape_points(shape_id)?;
                    if points.len() < 2 {
                        log::warn!(
                            "shape {shape_id} has {} point(s), trips using it fall back to stops",
                            points.len()
                        );
                        return None;
                    }
                    let coords = points
                        .iter()
                        .map(|p| projection.project(p.longitude, p.latitude))
                        .collect_vec();
                    let path = MeasuredPath::new(LineString::new(coords));
                    Some((shape_id.to_string(), Arc::new(path)))
                })
                .collect()
        } else {
            HashMap::new()
        };
        log::debug!("resolved {} shapes", shapes.len());
        ShapeResolver { shapes, use_shapes }
    }

    /// path geometry for a trip, from its shape when available and otherwise
    /// through its located stops in sequence order.
    pub fn resolve(
        &self,
        trip: &TripRecord,
        visits: &[LocatedVisit],
    ) -> Result<TripGeometry, LinkSpeedError> {
        let shape = trip
            .shape_id
            .as_ref()
            .filter(|_| self.use_shapes)
            .and_then(|shape_id| self.shapes.get(shape_id).map(|path| (shape_id, path)));
        if let Some((shape_id, path)) = shape {
            return Ok(TripGeometry {
                trip_id: trip.trip_id.clone(),
                shape_key: shape_id.clone(),
                path: path.clone(),
                provenance: GeometryProvenance::FromShape,
            });
        }

        let distinct_stops = visits.iter().map(|v| &v.visit.stop_id).unique().count();
        if distinct_stops < 2 {
            return Err(LinkSpeedError::MissingGeometryError {
                trip_id: trip.trip_id.clone(),
            });
        }
        let coords = visits.iter().map(|v| v.coord).collect_vec();
        Ok(TripGeometry {
            trip_id: trip.trip_id.clone(),
            shape_key: trip.trip_id.clone(),
            path: Arc::new(MeasuredPath::new(LineString::new(coords))),
            provenance: GeometryProvenance::FromStops,
        })
    }
}

#[cfg(test)]
mod test {
    use super::{GeometryProvenance, LocatedVisit, ShapeResolver};
    use crate::link_speed::{
        config::DistanceUnit,
        dataset::{GtfsTables, ShapePoint, StopVisit, TripRecord},
        geometry::{Polyline, Projection},
    };
    use geo::Coord;

    fn planar() -> Projection {
        Projection::Planar {
            native_unit: DistanceUnit::Meters,
        }
    }

    fn shape(id: &str, points: &[(f64, f64)]) -> Vec<ShapePoint> {
        points
            .iter()
            .enumerate()
            .map(|(i, (x, y))| ShapePoint {
                shape_id: id.to_string(),
                sequence: i + 1,
                latitude: *y,
                longitude: *x,
            })
            .collect()
    }

    fn located<'a>(visits: &'a [StopVisit], coords: &[(f64, f64)]) -> Vec<LocatedVisit<'a>> {
        visits
            .iter()
            .zip(coords)
            .map(|(visit, (x, y))| LocatedVisit {
                visit,
                coord: Coord { x: *x, y: *y },
            })
            .collect()
    }

    #[test]
    fn test_uses_shape_when_present() {
        let tables = GtfsTables::default().with_shapes(shape("s1", &[(0.0, 0.0), (0.0, 10.0)]));
        let resolver = ShapeResolver::new(&tables, &planar(), true);
        let trip = TripRecord::new("t1", "r1", Some("s1"));
        let geometry = resolver.resolve(&trip, &[]).expect("shape should resolve");
        assert_eq!(geometry.provenance, GeometryProvenance::FromShape);
        assert_eq!(geometry.shape_key, "s1");
        assert!((geometry.path.length() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_falls_back_to_stops() {
        let tables = GtfsTables::default().with_shapes(shape("s1", &[(0.0, 0.0)]));
        let resolver = ShapeResolver::new(&tables, &planar(), true);
        let visits = vec![
            StopVisit::new("t1", "A", 1, "08:00:00", "08:00:00"),
            StopVisit::new("t1", "B", 2, "08:05:00", "08:05:00"),
        ];
        let located = located(&visits, &[(0.0, 0.0), (3.0, 0.0)]);
        for shape_id in [Some("s1"), Some("unknown"), None] {
            let trip = TripRecord::new("t1", "r1", shape_id);
            let geometry = resolver.resolve(&trip, &located).expect("stops should resolve");
            assert_eq!(geometry.provenance, GeometryProvenance::FromStops);
            assert_eq!(geometry.shape_key, "t1");
            assert!((geometry.path.length() - 3.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_shapes_disabled() {
        let tables = GtfsTables::default().with_shapes(shape("s1", &[(0.0, 0.0), (0.0, 10.0)]));
        let resolver = ShapeResolver::new(&tables, &planar(), false);
        let visits = vec![
            StopVisit::new("t1", "A", 1, "08:00:00", "08:00:00"),
            StopVisit::new("t1", "B", 2, "08:05:00", "08:05:00"),
        ];
        let located = located(&visits, &[(0.0, 0.0), (0.0, 4.0)]);
        let trip = TripRecord::new("t1", "r1", Some("s1"));
        let geometry = resolver.resolve(&trip, &located).expect("stops should resolve");
        assert_eq!(geometry.provenance, GeometryProvenance::FromStops);
    }

    #[test]
    fn test_missing_geometry() {
        let tables = GtfsTables::default();
        let resolver = ShapeResolver::new(&tables, &planar(), true);
        let visits = vec![
            StopVisit::new("t1", "A", 1, "08:00:00", "08:00:00"),
            StopVisit::new("t1", "A", 2, "08:05:00", "08:05:00"),
        ];
        let located = located(&visits, &[(0.0, 0.0), (0.0, 0.0)]);
        let trip = TripRecord::new("t1", "r1", None);
        assert!(resolver.resolve(&trip, &located).is_err());
        assert!(resolver.resolve(&trip, &located[..1]).is_err());
    }
}
