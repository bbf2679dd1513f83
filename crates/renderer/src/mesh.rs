//! Nearest-cell color mesh for filled fields.
//!
//! Each grid value paints the rectangle between the midpoints to its
//! neighbours, so the image shows the model grid as-is with no smoothing.

use forecast::GridField;
use rayon::prelude::*;

use crate::canvas::{cell_edges, Canvas};
use crate::colormap::{Color, Colormap};
use crate::error::{RenderError, Result};

/// Paint every finite cell of `field` using `colormap` scaled to `range`.
///
/// Missing cells are left untouched so the base map shows through.
/// Returns the number of cells painted.
pub fn draw_filled(
    canvas: &mut Canvas,
    field: &GridField,
    colormap: &Colormap,
    range: (f32, f32),
) -> Result<usize> {
    draw_cells(canvas, field, |value| colormap.color_for(value, range))
}

/// Paint cells where `color_of` returns a color.
pub fn draw_cells<F>(canvas: &mut Canvas, field: &GridField, color_of: F) -> Result<usize>
where
    F: Fn(f32) -> Option<Color> + Sync,
{
    if field.is_empty() {
        return Err(RenderError::EmptyField);
    }

    let plot = *canvas.plot();
    let xs: Vec<f32> = cell_edges(&field.lons).into_iter().map(|lon| plot.lon_to_x(lon)).collect();
    let ys: Vec<f32> = cell_edges(&field.lats).into_iter().map(|lat| plot.lat_to_y(lat)).collect();

    let width = field.width();
    let colors: Vec<Option<Color>> = field.data.par_iter().map(|&v| color_of(v)).collect();

    let mut painted = 0;
    for (idx, color) in colors.into_iter().enumerate() {
        let Some(color) = color else { continue };
        let (row, col) = (idx / width, idx % width);
        canvas.fill_rect(xs[col], ys[row], xs[col + 1], ys[row + 1], color, true);
        painted += 1;
    }

    tracing::debug!(
        cells = field.data.len(),
        painted,
        "Drew color mesh"
    );
    Ok(painted)
}
