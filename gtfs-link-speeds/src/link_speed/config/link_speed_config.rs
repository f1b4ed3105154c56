use serde::{Deserialize, Serialize};

use super::{DistanceUnit, PeriodClassifier, TimePeriod};
use crate::link_speed::{geometry::ProjectionConfig, LinkSpeedError, MissingStopLocationPolicy};

/// immutable settings shared by every component of a link speed run.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct LinkSpeedConfig {
    /// ordered time-of-day periods; the first period containing a departure wins
    pub periods: Vec<TimePeriod>,
    /// label for departures outside every period
    pub unclassified_label: String,
    /// farthest a stop may sit from its trip's path, in `distance_unit`
    pub snap_tolerance: f64,
    /// unit of every distance and speed written
    pub distance_unit: DistanceUnit,
    pub projection: ProjectionConfig,
    /// when false, every trip path is built from its stops
    pub use_shapes: bool,
    pub missing_stop_location_policy: MissingStopLocationPolicy,
}

impl Default for LinkSpeedConfig {
    fn default() -> Self {
        Self {
            periods: vec![
                TimePeriod::new("night", "00:00:00", "06:00:00"),
                TimePeriod::new("am_peak", "06:00:00", "09:00:00"),
                TimePeriod::new("midday", "09:00:00", "15:00:00"),
                TimePeriod::new("pm_peak", "15:00:00", "18:00:00"),
                TimePeriod::new("evening", "18:00:00", "24:00:00"),
            ],
            unclassified_label: String::from("unclassified"),
            snap_tolerance: 0.1,
            distance_unit: DistanceUnit::Miles,
            projection: ProjectionConfig::default(),
            use_shapes: true,
            missing_stop_location_policy: MissingStopLocationPolicy::default(),
        }
    }
}

impl LinkSpeedConfig {
    /// checks the settings that serde cannot, returning the period
    /// classifier built along the way.
    pub fn validate(&self) -> Result<PeriodClassifier, LinkSpeedError> {
        if !self.snap_tolerance.is_finite() || self.snap_tolerance <= 0.0 {
            return Err(LinkSpeedError::ConfigurationError(format!(
                "snap_tolerance must be a positive number, found {}",
                self.snap_tolerance
            )));
        }
        if self.unclassified_label.is_empty() {
            return Err(LinkSpeedError::ConfigurationError(String::from(
                "unclassified_label must not be empty",
            )));
        }
        PeriodClassifier::new(&self.periods, &self.unclassified_label)
    }
}

impl TryFrom<&String> for LinkSpeedConfig {
    type Error = LinkSpeedError;

    fn try_from(f: &String) -> Result<Self, Self::Error> {
        let config: LinkSpeedConfig = if f.ends_with(".toml") {
            let s = std::fs::read_to_string(f).map_err(|e| {
                LinkSpeedError::ConfigurationError(format!("failure reading {f}: {e}"))
            })?;
            toml::from_str(&s).map_err(|e| {
                LinkSpeedError::ConfigurationError(format!("failure decoding {f}: {e}"))
            })?
        } else if f.ends_with(".json") {
            let s = std::fs::read_to_string(f).map_err(|e| {
                LinkSpeedError::ConfigurationError(format!("failure reading {f}: {e}"))
            })?;
            serde_json::from_str(&s).map_err(|e| {
                LinkSpeedError::ConfigurationError(format!("failure decoding {f}: {e}"))
            })?
        } else {
            return Err(LinkSpeedError::ConfigurationError(format!(
                "unsupported file type: {f}"
            )));
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod test {
    use super::LinkSpeedConfig;
    use crate::link_speed::{
        config::DistanceUnit, geometry::ProjectionConfig, MissingStopLocationPolicy,
    };
    use std::path::PathBuf;

    #[test]
    fn test_default_is_valid() {
        assert!(LinkSpeedConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let src = r#"
            snap_tolerance = 50.0
            distance_unit = "meters"
            missing_stop_location_policy = "fail"

            [projection]
            type = "planar"
            native_unit = "feet"
        "#;
        let config: LinkSpeedConfig = toml::from_str(src).expect("should decode");
        assert_eq!(config.distance_unit, DistanceUnit::Meters);
        assert_eq!(config.missing_stop_location_policy, MissingStopLocationPolicy::Fail);
        assert_eq!(
            config.projection,
            ProjectionConfig::Planar {
                native_unit: DistanceUnit::Feet
            }
        );
        assert_eq!(config.periods.len(), 5);
        assert!(config.use_shapes);
    }

    #[test]
    fn test_rejects_bad_tolerance() {
        let config = LinkSpeedConfig {
            snap_tolerance: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unsupported_extension() {
        let result = LinkSpeedConfig::try_from(&String::from("link_speeds.yaml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_read_default_config_file() {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("config")
            .join("link_speeds.toml");
        let filename = path.to_string_lossy().to_string();
        let config = LinkSpeedConfig::try_from(&filename).expect("default config should load");
        assert_eq!(config, LinkSpeedConfig::default());
    }
}
