//! Wind arrows in the style of matplotlib `quiver`.
//!
//! Arrow length is `speed / scale` of the plot width; the shaft width is a
//! fraction of the plot width. Heads use quiver's default proportions
//! (head width 3, head length 5, head axis length 4.5 shaft widths) and
//! arrows shorter than one head length shrink as a whole.

use forecast::VectorComponents;
use gfs_common::deployment::ArrowSettings;

use crate::canvas::Canvas;
use crate::colormap::Color;
use crate::error::{RenderError, Result};

const HEAD_WIDTH: f32 = 3.0;
const HEAD_LENGTH: f32 = 5.0;
const HEAD_AXIS_LENGTH: f32 = 4.5;

/// Arrow length in pixels for a vector of magnitude `speed`.
pub fn arrow_length(speed: f32, scale: f32, plot_width: f32) -> f32 {
    if scale <= 0.0 || !speed.is_finite() {
        return 0.0;
    }
    speed / scale * plot_width
}

/// Grid cells that get an arrow: every `stride`-th row and column.
pub fn arrow_positions(height: usize, width: usize, stride: usize) -> Vec<(usize, usize)> {
    let stride = stride.max(1);
    (0..height)
        .step_by(stride)
        .flat_map(|row| (0..width).step_by(stride).map(move |col| (row, col)))
        .collect()
}

/// Arrow outline with its tail at the origin pointing along +x.
fn arrow_outline(length: f32, shaft: f32) -> Vec<(f32, f32)> {
    let full_head = HEAD_LENGTH * shaft;
    if length >= full_head {
        let half_shaft = shaft / 2.0;
        let half_head = HEAD_WIDTH * shaft / 2.0;
        let neck = length - HEAD_AXIS_LENGTH * shaft;
        let barb = length - full_head;
        vec![
            (0.0, -half_shaft),
            (neck, -half_shaft),
            (barb, -half_head),
            (length, 0.0),
            (barb, half_head),
            (neck, half_shaft),
            (0.0, half_shaft),
        ]
    } else {
        // Shortest full arrow scaled down uniformly.
        let shrink = length / full_head;
        arrow_outline(full_head, shaft)
            .into_iter()
            .map(|(x, y)| (x * shrink, y * shrink))
            .collect()
    }
}

/// Outline in pixel space for an arrow at `(x, y)` with eastward `u` and
/// northward `v` components.
pub fn arrow_polygon(x: f32, y: f32, u: f32, v: f32, length: f32, shaft: f32) -> Vec<(f32, f32)> {
    // Pixel y grows downward.
    let (sin_a, cos_a) = (-v).atan2(u).sin_cos();
    arrow_outline(length, shaft)
        .into_iter()
        .map(|(px, py)| (x + px * cos_a - py * sin_a, y + px * sin_a + py * cos_a))
        .collect()
}

/// Draw arrows for `vectors` on a sparse grid.
///
/// Returns the number of arrows drawn; cells with missing components are
/// skipped.
pub fn draw_arrows(canvas: &mut Canvas, vectors: &VectorComponents, settings: &ArrowSettings) -> Result<usize> {
    let (u, v) = (&vectors.u, &vectors.v);
    if u.is_empty() || u.data.len() != v.data.len() {
        return Err(RenderError::EmptyField);
    }

    let plot = *canvas.plot();
    let shaft = settings.width * plot.width;
    let mut drawn = 0;

    for (row, col) in arrow_positions(u.height(), u.width(), settings.stride) {
        let (Some(uc), Some(vc)) = (u.get(row, col), v.get(row, col)) else {
            continue;
        };
        if !uc.is_finite() || !vc.is_finite() {
            continue;
        }

        let (x, y) = plot.project(u.lats[row], u.lons[col]);
        let length = arrow_length(uc.hypot(vc), settings.scale, plot.width);
        if length < f32::EPSILON {
            canvas.fill_circle(x, y, shaft / 2.0, Color::BLACK, true);
        } else {
            let outline = arrow_polygon(x, y, uc, vc, length, shaft);
            canvas.fill_polygon(&outline, Color::BLACK, true);
        }
        drawn += 1;
    }

    tracing::debug!(arrows = drawn, stride = settings.stride, "Drew wind arrows");
    Ok(drawn)
}
