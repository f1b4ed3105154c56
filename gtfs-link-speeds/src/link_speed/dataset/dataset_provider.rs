use super::{CalendarRecord, RouteRecord, ShapePoint, StopRecord, StopVisit, TripRecord};

/// read access to the normalized tables of a GTFS feed.
///
/// implementations are shared by all trip workers, so they must be [`Sync`]
/// and must not change while a batch runs.
pub trait DatasetProvider: Sync {
    fn stop(&self, stop_id: &str) -> Option<&StopRecord>;

    fn stops(&self) -> Box<dyn Iterator<Item = &StopRecord> + '_>;

    fn trips(&self) -> Box<dyn Iterator<Item = &TripRecord> + '_>;

    /// visits of a trip sorted by ascending stop sequence. empty when the
    /// trip has no stop times.
    fn stop_visits(&self, trip_id: &str) -> &[StopVisit];

    /// points of a shape sorted by ascending point sequence.
    fn shape_points(&self, shape_id: &str) -> Option<&[ShapePoint]>;

    fn shape_ids(&self) -> Box<dyn Iterator<Item = &str> + '_>;

    fn route(&self, route_id: &str) -> Option<&RouteRecord>;

    /// agency name for a route's agency id. GTFS lets single-agency feeds
    /// omit agency ids, so `None` resolves to the only agency if there is one.
    fn agency_name(&self, agency_id: Option<&str>) -> Option<&str>;

    fn calendar(&self, service_id: &str) -> Option<&CalendarRecord>;

    /// (longitude, latitude) of a stop. when the stop has no location, the
    /// location of its parent station is used.
    ///
    /// this could be done recursively, but GTFS only requires a location on
    /// the stop or its direct parent.
    fn stop_location(&self, stop_id: &str) -> Option<(f64, f64)> {
        let stop = self.stop(stop_id)?;
        if let (Some(lon), Some(lat)) = (stop.longitude, stop.latitude) {
            return Some((lon, lat));
        }
        stop.parent_station
            .as_deref()
            .and_then(|parent_id| self.stop(parent_id))
            .and_then(|parent| match (parent.longitude, parent.latitude) {
                (Some(lon), Some(lat)) => Some((lon, lat)),
                _ => None,
            })
    }

    /// mean latitude over all stops with a location.
    fn mean_stop_latitude(&self) -> Option<f64> {
        let (sum, n) = self
            .stops()
            .filter_map(|s| s.latitude)
            .fold((0.0, 0usize), |(sum, n), lat| (sum + lat, n + 1));
        if n == 0 {
            None
        } else {
            Some(sum / n as f64)
        }
    }
}
