mod dataset_provider;
mod gtfs_tables;
mod records;

pub use dataset_provider::DatasetProvider;
pub use gtfs_tables::GtfsTables;
pub use records::{
    AgencyRecord, CalendarRecord, RouteRecord, ShapePoint, StopRecord, StopVisit, TripRecord,
};
