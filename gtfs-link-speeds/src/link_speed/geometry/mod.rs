mod polyline;
mod projection;

pub use polyline::{MeasuredPath, PathProjection, Polyline};
pub use projection::{Projection, ProjectionConfig};
