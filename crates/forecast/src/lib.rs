//! GFS forecast dataset access.
//!
//! Turns a run selector, a parameter and a forecast step into a clipped,
//! unit-converted display field:
//!
//! ```text
//! (run, parameter, step)
//!      │
//!      ▼
//! DatasetCache::load(run) ──► GdsLoader::open (on miss)
//!      │                          .dds / .das / .dods?time,lat,lon
//!      ▼
//! clip::window_for(region)   index window from the stored axes
//!      │
//!      ▼
//! resolve_window(parameter, step, window)
//!      │                     .dods?var[t:t][y0:y1][x0:x1]
//!      ▼
//! DisplayField (label, colormap, value range, draw mode, u/v)
//! ```

pub mod cache;
pub mod clip;
pub mod dataset;
pub mod error;
pub mod field;
pub mod loader;
pub mod resolve;
pub mod synthetic;

pub use cache::{CacheStats, DatasetCache};
pub use clip::{clip, clip_display, window_for, Window};
pub use dataset::{DatasetSource, ForecastDataset, SlabSource};
pub use error::{DatasetError, Result};
pub use field::{Axis, AxisOrder, DisplayField, GridField, VectorComponents};
pub use loader::{dataset_url, GdsLoader, DEFAULT_HOST};
pub use resolve::{resolve, resolve_window};
pub use synthetic::SyntheticSource;
