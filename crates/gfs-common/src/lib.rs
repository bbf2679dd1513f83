//! Common types shared by the GFS viewer crates.

pub mod deployment;
pub mod error;
pub mod parameter;
pub mod region;
pub mod time;

pub use deployment::{Deployment, PointMarker, ValueRanges};
pub use error::{ViewerError, ViewerResult};
pub use parameter::{DrawMode, Parameter};
pub use region::Region;
pub use time::{lead_time_label, RunCycle, RunSelector, MAX_FORECAST_STEP};
