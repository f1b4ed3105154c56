use geo::{Coord, LineString};
use itertools::Itertools;

use crate::link_speed::{
    geometry::Polyline,
    shape_resolver::TripGeometry,
    stop_snapper::SnappedStop,
    LinkSpeedError,
};

/// directed identifier of the link from `begin_stop_id` to `end_stop_id`.
pub fn link_id(begin_stop_id: &str, end_stop_id: &str) -> String {
    format!("{begin_stop_id}_{end_stop_id}")
}

/// the stretch of a trip's path between two consecutive snapped stops.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub link_id: String,
    pub begin_stop_id: String,
    pub end_stop_id: String,
    pub begin_sequence: u32,
    pub end_sequence: u32,
    /// positions along the trip path, in native units
    pub begin_position: f64,
    pub end_position: f64,
    pub begin_coord: Coord<f64>,
    pub end_coord: Coord<f64>,
    /// projected sub-path between the two positions
    pub geometry: LineString<f64>,
    /// the end position was clamped forward, so `geometry` does not follow
    /// the path between the stops
    pub end_clamped: bool,
}

/// pairs of snapped stops that were adjacent visits of the trip. a stop that
/// failed to snap breaks the chain, so no link bridges over it.
pub fn consecutive_pairs<'s, 'a>(
    snapped: &'s [SnappedStop<'a>],
) -> impl Iterator<Item = (&'s SnappedStop<'a>, &'s SnappedStop<'a>)> {
    snapped
        .iter()
        .tuple_windows()
        .filter(|(begin, end)| end.index == begin.index + 1)
}

/// partitions the trip path into one link per consecutive pair of snapped
/// stops.
pub fn split(geometry: &TripGeometry, snapped: &[SnappedStop]) -> Result<Vec<Link>, LinkSpeedError> {
    consecutive_pairs(snapped)
        .map(|(begin, end)| {
            let sub_path = if begin.position <= end.position {
                geometry.path.sub_path(begin.position, end.position)
            } else {
                None
            };
            let Some(sub_path) = sub_path else {
                return Err(LinkSpeedError::DegenerateSplitError {
                    trip_id: geometry.trip_id.clone(),
                    stop_sequence: end.visit.stop_sequence,
                    previous: begin.position,
                    current: end.position,
                });
            };
            Ok(Link {
                link_id: link_id(&begin.visit.stop_id, &end.visit.stop_id),
                begin_stop_id: begin.visit.stop_id.clone(),
                end_stop_id: end.visit.stop_id.clone(),
                begin_sequence: begin.visit.stop_sequence,
                end_sequence: end.visit.stop_sequence,
                begin_position: begin.position,
                end_position: end.position,
                begin_coord: begin.coord,
                end_coord: end.coord,
                geometry: sub_path,
                end_clamped: end.clamped,
            })
        })
        .collect()
}
