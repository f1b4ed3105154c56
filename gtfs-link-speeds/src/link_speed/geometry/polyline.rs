use geo::{Closest, ClosestPoint, Coord, Distance, Euclidean, LineString, Point};

/// linear referencing operations over a path in a planar coordinate system.
/// distances are measured from the start of the path in the units of the
/// coordinates.
pub trait Polyline {
    /// total arc length of the path.
    fn length(&self) -> f64;

    /// the coordinate found `distance` along the path, clamped to the path.
    /// None for an empty path.
    fn point_at(&self, distance: f64) -> Option<Coord<f64>>;

    /// projects `point` onto the nearest location of the path.
    fn nearest_point_distance(&self, point: &Coord<f64>) -> Option<PathProjection>;

    /// the piece of the path between two distances along it, including every
    /// vertex strictly between them. None when `start > end`.
    fn sub_path(&self, start: f64, end: f64) -> Option<LineString<f64>>;
}

/// result of projecting a point onto a [`Polyline`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathProjection {
    /// arc length from the start of the path to the projected point
    pub distance_along: f64,
    /// straight line distance from the query point to the projected point
    pub offset: f64,
    pub point: Coord<f64>,
}

/// a [`LineString`] with the arc length at each vertex precomputed.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasuredPath {
    linestring: LineString<f64>,
    cumulative: Vec<f64>,
}

impl MeasuredPath {
    pub fn new(linestring: LineString<f64>) -> MeasuredPath {
        let mut cumulative = Vec::with_capacity(linestring.0.len());
        let mut total = 0.0;
        let mut previous: Option<Point<f64>> = None;
        for point in linestring.points() {
            if let Some(prev) = previous {
                total += Euclidean.distance(prev, point);
            }
            cumulative.push(total);
            previous = Some(point);
        }
        MeasuredPath {
            linestring,
            cumulative,
        }
    }

    pub fn linestring(&self) -> &LineString<f64> {
        &self.linestring
    }

    pub fn vertex_count(&self) -> usize {
        self.cumulative.len()
    }

    /// arc length from the start of the path to the vertex at `index`.
    pub fn distance_at_vertex(&self, index: usize) -> Option<f64> {
        self.cumulative.get(index).copied()
    }

    fn clamp(&self, distance: f64) -> f64 {
        distance.max(0.0).min(self.length())
    }
}

impl Polyline for MeasuredPath {
    fn length(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or_default()
    }

    fn point_at(&self, distance: f64) -> Option<Coord<f64>> {
        let coords = &self.linestring.0;
        let first = coords.first()?;
        let d = self.clamp(distance);
        // first vertex lying strictly beyond d
        let index = self.cumulative.partition_point(|c| *c <= d);
        if index == 0 {
            return Some(*first);
        }
        if index >= coords.len() {
            return coords.last().copied();
        }
        let (a, b) = (coords[index - 1], coords[index]);
        let segment_length = self.cumulative[index] - self.cumulative[index - 1];
        let t = (d - self.cumulative[index - 1]) / segment_length;
        Some(Coord {
            x: a.x + t * (b.x - a.x),
            y: a.y + t * (b.y - a.y),
        })
    }

    fn nearest_point_distance(&self, point: &Coord<f64>) -> Option<PathProjection> {
        let query = Point::from(*point);
        let first = *self.linestring.0.first()?;
        let mut best = PathProjection {
            distance_along: 0.0,
            offset: Euclidean.distance(Point::from(first), query),
            point: first,
        };
        for (index, segment) in self.linestring.lines().enumerate() {
            let closest = match segment.closest_point(&query) {
                Closest::Intersection(p) | Closest::SinglePoint(p) => p,
                Closest::Indeterminate => segment.start_point(),
            };
            let offset = Euclidean.distance(closest, query);
            if offset < best.offset {
                let along = self.cumulative[index] + Euclidean.distance(segment.start_point(), closest);
                best = PathProjection {
                    distance_along: self.clamp(along),
                    offset,
                    point: closest.0,
                };
            }
        }
        Some(best)
    }

    fn sub_path(&self, start: f64, end: f64) -> Option<LineString<f64>> {
        if start > end {
            return None;
        }
        let (start, end) = (self.clamp(start), self.clamp(end));
        let mut coords = vec![self.point_at(start)?];
        coords.extend(
            self.linestring
                .0
                .iter()
                .zip(self.cumulative.iter())
                .filter(|(_, d)| start < **d && **d < end)
                .map(|(c, _)| *c),
        );
        coords.push(self.point_at(end)?);
        Some(LineString::new(coords))
    }
}
