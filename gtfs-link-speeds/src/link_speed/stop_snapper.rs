use geo::Coord;

use crate::link_speed::{
    config::DistanceUnit,
    dataset::StopVisit,
    geometry::{Polyline, Projection},
    shape_resolver::{GeometryProvenance, LocatedVisit, TripGeometry},
    LinkSpeedError,
};

/// smallest step, in native units, a clamped position is moved past its
/// predecessor. path lengths at or below it count as zero.
pub const SNAP_EPSILON: f64 = 1e-6;

/// a stop visit placed on its trip's path.
#[derive(Debug, Clone, Copy)]
pub struct SnappedStop<'a> {
    pub visit: &'a StopVisit,
    /// projected stop location
    pub coord: Coord<f64>,
    /// arc length from the start of the path, in native units
    pub position: f64,
    /// index of the visit among the trip's located visits
    pub index: usize,
    /// the raw position fell behind the previous stop and was moved forward
    pub clamped: bool,
}

/// stops placed on the path, plus those rejected for sitting too far from it.
#[derive(Debug)]
pub struct SnapOutcome<'a> {
    pub snapped: Vec<SnappedStop<'a>>,
    pub failures: Vec<LinkSpeedError>,
}

pub struct StopSnapper {
    /// maximum offset from the path, in native units
    tolerance: f64,
}

impl StopSnapper {
    /// builds a snapper from a tolerance written in `unit`.
    pub fn new(tolerance: f64, unit: DistanceUnit, projection: &Projection) -> StopSnapper {
        StopSnapper {
            tolerance: unit.convert(tolerance, &projection.native_unit()),
        }
    }

    /// linear positions of the visits along `geometry`, non-decreasing in
    /// sequence order.
    pub fn snap<'a>(&self, geometry: &TripGeometry, visits: &[LocatedVisit<'a>]) -> SnapOutcome<'a> {
        let path = geometry.path.as_ref();
        let total = path.length();
        let mut snapped: Vec<SnappedStop<'a>> = Vec::with_capacity(visits.len());
        let mut failures = vec![];

        for (index, located) in visits.iter().enumerate() {
            let raw = match geometry.provenance {
                // each visit is the vertex at its own index
                GeometryProvenance::FromStops => path.distance_at_vertex(index),
                GeometryProvenance::FromShape => {
                    match path.nearest_point_distance(&located.coord) {
                        Some(p) if p.offset > self.tolerance => {
                            log::warn!(
                                "stop {} on trip {} is {:.3} from its path",
                                located.visit.stop_id,
                                geometry.trip_id,
                                p.offset
                            );
                            failures.push(LinkSpeedError::SnapFailureError {
                                trip_id: geometry.trip_id.clone(),
                                stop_id: located.visit.stop_id.clone(),
                                stop_sequence: located.visit.stop_sequence,
                                offset: p.offset,
                                tolerance: self.tolerance,
                            });
                            continue;
                        }
                        other => other.map(|p| p.distance_along),
                    }
                }
            };
            let Some(raw) = raw else { continue };

            let (position, clamped) = match snapped.last() {
                Some(previous) if raw < previous.position => {
                    log::debug!(
                        "clamping stop {} on trip {} from {raw} to {}",
                        located.visit.stop_id,
                        geometry.trip_id,
                        previous.position
                    );
                    ((previous.position + SNAP_EPSILON).min(total), true)
                }
                _ => (raw, false),
            };
            snapped.push(SnappedStop {
                visit: located.visit,
                coord: located.coord,
                position,
                index,
                clamped,
            });
        }
        SnapOutcome { snapped, failures }
    }
}
