mod distance_unit;
mod link_speed_config;
mod time_period;

pub use distance_unit::DistanceUnit;
pub use link_speed_config::LinkSpeedConfig;
pub use time_period::{PeriodClassifier, TimePeriod};
