pub mod app;
pub mod batch_ops;
pub mod config;
pub mod dataset;
pub mod distance_calculator;
mod exclusion_report;
pub mod geometry;
pub mod link_aggregator;
mod link_speed_error;
pub mod link_splitter;
mod missing_stop_location_policy;
pub mod network_features;
pub mod operating_data;
pub mod output_row;
pub mod service_time;
pub mod shape_resolver;
pub mod speed_assembler;
pub mod stop_snapper;
pub mod trip_link_record;
pub mod trip_ops;

pub use batch_ops::{process_bundle, run_link_speeds, LinkSpeedOutput};
pub use exclusion_report::{ExclusionKind, ExclusionReport};
pub use link_speed_error::LinkSpeedError;
pub use missing_stop_location_policy::MissingStopLocationPolicy;
pub use service_time::ServiceTime;
pub use trip_link_record::{RecordStatus, TripLinkRecord};
