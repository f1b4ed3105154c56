use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use uom::si::f64::Length;
use uom::si::length;

/// the single unit used for every distance (and distance per hour speed)
/// written by the engine.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DistanceUnit {
    Meters,
    Kilometers,
    Feet,
    Miles,
}

impl DistanceUnit {
    pub fn to_uom(&self, value: f64) -> Length {
        match self {
            DistanceUnit::Meters => Length::new::<length::meter>(value),
            DistanceUnit::Kilometers => Length::new::<length::kilometer>(value),
            DistanceUnit::Feet => Length::new::<length::foot>(value),
            DistanceUnit::Miles => Length::new::<length::mile>(value),
        }
    }

    pub fn from_uom(&self, value: Length) -> f64 {
        match self {
            DistanceUnit::Meters => value.get::<length::meter>(),
            DistanceUnit::Kilometers => value.get::<length::kilometer>(),
            DistanceUnit::Feet => value.get::<length::foot>(),
            DistanceUnit::Miles => value.get::<length::mile>(),
        }
    }

    /// converts a value in this unit into the target unit.
    pub fn convert(&self, value: f64, target: &DistanceUnit) -> f64 {
        if self == target {
            value
        } else {
            target.from_uom(self.to_uom(value))
        }
    }

    /// short label used in output column headers and logs.
    pub fn abbreviation(&self) -> &'static str {
        match self {
            DistanceUnit::Meters => "m",
            DistanceUnit::Kilometers => "km",
            DistanceUnit::Feet => "ft",
            DistanceUnit::Miles => "mi",
        }
    }
}
