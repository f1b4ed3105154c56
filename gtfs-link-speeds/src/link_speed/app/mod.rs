mod link_speed_app;
mod operation;

pub use link_speed_app::LinkSpeedApp;
pub use operation::LinkSpeedOperation;
