use geo::{Coord, LineString};
use serde::{Deserialize, Serialize};

use crate::link_speed::{config::DistanceUnit, LinkSpeedError};

/// mean earth radius, matching the radius used by [`geo::Haversine`].
const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// configures the fixed planar coordinate system used for all distance
/// measurement.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum ProjectionConfig {
    /// equirectangular projection about a reference latitude, in meters.
    /// distances are accurate at the scale of a single transit agency. when
    /// no reference latitude is given, the mean latitude of the feed's stops
    /// is used.
    Equirectangular { reference_latitude: Option<f64> },
    /// feed coordinates are already projected: the longitude column holds x
    /// and the latitude column holds y, both in `native_unit`.
    Planar { native_unit: DistanceUnit },
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        ProjectionConfig::Equirectangular {
            reference_latitude: None,
        }
    }
}

/// a resolved [`ProjectionConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Equirectangular { reference_latitude: f64 },
    Planar { native_unit: DistanceUnit },
}

impl Projection {
    /// resolves the configuration, using `fallback_latitude` when an
    /// equirectangular projection has no configured reference latitude.
    pub fn new(
        config: &ProjectionConfig,
        fallback_latitude: Option<f64>,
    ) -> Result<Projection, LinkSpeedError> {
        match config {
            ProjectionConfig::Planar { native_unit } => Ok(Projection::Planar {
                native_unit: *native_unit,
            }),
            ProjectionConfig::Equirectangular { reference_latitude } => {
                let latitude = reference_latitude.or(fallback_latitude).ok_or_else(|| {
                    LinkSpeedError::ConfigurationError(String::from(
                        "equirectangular projection needs a reference latitude and the feed has no stop locations",
                    ))
                })?;
                if !latitude.is_finite() || latitude.abs() >= 89.0 {
                    return Err(LinkSpeedError::ConfigurationError(format!(
                        "reference latitude {latitude} is outside (-89, 89)"
                    )));
                }
                Ok(Projection::Equirectangular {
                    reference_latitude: latitude,
                })
            }
        }
    }

    /// unit of distances measured between projected coordinates.
    pub fn native_unit(&self) -> DistanceUnit {
        match self {
            Projection::Equirectangular { .. } => DistanceUnit::Meters,
            Projection::Planar { native_unit } => *native_unit,
        }
    }

    pub fn project(&self, longitude: f64, latitude: f64) -> Coord<f64> {
        match self {
            Projection::Planar { .. } => Coord {
                x: longitude,
                y: latitude,
            },
            Projection::Equirectangular { reference_latitude } => Coord {
                x: EARTH_RADIUS_METERS * longitude.to_radians() * reference_latitude.to_radians().cos(),
                y: EARTH_RADIUS_METERS * latitude.to_radians(),
            },
        }
    }

    /// inverse of [`Projection::project`], returning x=longitude, y=latitude.
    pub fn unproject(&self, coord: &Coord<f64>) -> Coord<f64> {
        match self {
            Projection::Planar { .. } => *coord,
            Projection::Equirectangular { reference_latitude } => Coord {
                x: (coord.x / (EARTH_RADIUS_METERS * reference_latitude.to_radians().cos()))
                    .to_degrees(),
                y: (coord.y / EARTH_RADIUS_METERS).to_degrees(),
            },
        }
    }

    pub fn unproject_linestring(&self, linestring: &LineString<f64>) -> LineString<f64> {
        linestring.coords().map(|c| self.unproject(c)).collect()
    }
}

#[cfg(test)]
mod test {
    use super::{Projection, ProjectionConfig};
    use geo::{Distance, Haversine, Point};

    #[test]
    fn test_round_trip() {
        let projection = Projection::new(
            &ProjectionConfig::Equirectangular {
                reference_latitude: Some(38.58),
            },
            None,
        )
        .expect("valid projection");
        let projected = projection.project(-121.49, 38.58);
        let back = projection.unproject(&projected);
        assert!((back.x + 121.49).abs() < 1e-9);
        assert!((back.y - 38.58).abs() < 1e-9);
    }

    #[test]
    fn test_short_distance_close_to_haversine() {
        let projection = Projection::new(&ProjectionConfig::default(), Some(38.58))
            .expect("valid projection");
        let (a, b) = ((-121.49, 38.58), (-121.47, 38.59));
        let pa = projection.project(a.0, a.1);
        let pb = projection.project(b.0, b.1);
        let planar = ((pa.x - pb.x).powi(2) + (pa.y - pb.y).powi(2)).sqrt();
        let haversine = Haversine.distance(Point::new(a.0, a.1), Point::new(b.0, b.1));
        let relative_error = (planar - haversine).abs() / haversine;
        assert!(
            relative_error < 0.001,
            "planar {planar} vs haversine {haversine}"
        );
    }

    #[test]
    fn test_equirectangular_needs_latitude() {
        let result = Projection::new(&ProjectionConfig::default(), None);
        assert!(result.is_err());
    }
}
