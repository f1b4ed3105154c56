use geo::{Distance, Euclidean, Length, Point};
use serde::{Deserialize, Serialize};

use crate::link_speed::{
    config::DistanceUnit, link_splitter::Link, shape_resolver::GeometryProvenance,
    stop_snapper::SNAP_EPSILON,
};

/// how a link distance was measured.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DistanceSource {
    /// arc length along the trip path
    Shape,
    /// straight line between the two stops
    Orthogonal,
}

/// a link distance, in the configured output unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkDistance {
    pub value: f64,
    pub source: DistanceSource,
    /// the measured length was at most `SNAP_EPSILON` native units
    pub zero_length: bool,
}

/// measures links in projected coordinates and reports them in one unit.
pub struct DistanceCalculator {
    native_unit: DistanceUnit,
    output_unit: DistanceUnit,
}

impl DistanceCalculator {
    pub fn new(native_unit: DistanceUnit, output_unit: DistanceUnit) -> DistanceCalculator {
        DistanceCalculator {
            native_unit,
            output_unit,
        }
    }

    pub fn output_unit(&self) -> DistanceUnit {
        self.output_unit
    }

    /// length of the link along its path, or the straight line between its
    /// stops when the path was built from stops or is degenerate while the
    /// stops are apart. a path is degenerate when its length is within the
    /// clamp epsilon or its end stop was clamped forward.
    ///
    /// every threshold is compared in native units, before conversion.
    pub fn measure(&self, link: &Link, provenance: GeometryProvenance) -> LinkDistance {
        let straight_line = || {
            Euclidean.distance(Point::from(link.begin_coord), Point::from(link.end_coord))
        };
        let (native, source) = match provenance {
            GeometryProvenance::FromStops => (straight_line(), DistanceSource::Orthogonal),
            GeometryProvenance::FromShape => {
                let along = Euclidean.length(&link.geometry);
                let direct = straight_line();
                let degenerate = !along.is_finite() || along <= SNAP_EPSILON || link.end_clamped;
                if degenerate && direct > SNAP_EPSILON {
                    (direct, DistanceSource::Orthogonal)
                } else {
                    (along, DistanceSource::Shape)
                }
            }
        };
        LinkDistance {
            value: self.native_unit.convert(native, &self.output_unit),
            source,
            zero_length: native <= SNAP_EPSILON,
        }
    }
}
