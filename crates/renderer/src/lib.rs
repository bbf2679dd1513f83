//! Map rendering for regional forecast fields.
//!
//! Draw modes:
//! - Filled: nearest-cell color mesh with a color bar
//! - Contour: labeled isolines (marching squares)
//! - FilledVector: color mesh plus quiver-style wind arrows
//!
//! Every map gets a base map drawn from the model land mask, optional
//! GeoJSON borders and city markers, and validity/lead-time titles. Output
//! is an RGBA image encoded as indexed or truecolor PNG.

pub mod arrows;
pub mod basemap;
pub mod canvas;
pub mod colormap;
pub mod contour;
pub mod error;
pub mod legend;
pub mod map;
pub mod mesh;
pub mod png;
pub mod text;

pub use basemap::BorderLines;
pub use canvas::{Canvas, PlotArea};
pub use colormap::{Color, Colormap};
pub use error::{RenderError, Result};
pub use map::{download_name, MapImage, MapRenderer};
pub use png::encode_png;
pub use text::TextRenderer;
