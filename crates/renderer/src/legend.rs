//! Vertical color bar beside the plot, with ticks and a side label.

use image::RgbaImage;

use crate::canvas::{Canvas, LineStyle};
use crate::colormap::{Color, Colormap};
use crate::text::TextRenderer;

const BAR_GAP: f32 = 12.0;
const BAR_WIDTH: f32 = 16.0;
const TICK_LENGTH: f32 = 4.0;
const TICK_FONT_SIZE: f32 = 12.0;
const LABEL_FONT_SIZE: f32 = 12.0;
const LABEL_GAP: f32 = 6.0;

/// Geometry of a drawn color bar, for labeling once text is available.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorBar {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    pub ticks: Vec<(f32, String)>,
}

/// Roughly `max_count` round tick values covering `[min, max]`.
pub fn nice_ticks(min: f32, max: f32, max_count: usize) -> Vec<f32> {
    if !(max > min) || max_count < 2 {
        return vec![min, max];
    }
    let raw = (max - min) / (max_count - 1) as f32;
    let magnitude = 10f32.powf(raw.log10().floor());
    let step = [1.0, 2.0, 2.5, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|s| *s >= raw)
        .unwrap_or(10.0 * magnitude);

    let first = (min / step).ceil() as i64;
    let last = (max / step).floor() as i64;
    (first..=last).map(|i| i as f32 * step).collect()
}

fn tick_label(value: f32, step: f32) -> String {
    if step >= 1.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}

/// Paint the bar to the right of the plot area, bottom = `range.0`.
///
/// Quantized colormaps get one tick per class boundary.
pub fn draw_colorbar(canvas: &mut Canvas, colormap: &Colormap, range: (f32, f32)) -> ColorBar {
    let plot = *canvas.plot();
    let left = plot.right() + BAR_GAP;
    let right = left + BAR_WIDTH;
    let (top, bottom) = (plot.top, plot.bottom());
    let height = (bottom - top).max(1.0);

    let rows = height.ceil() as usize;
    for i in 0..rows {
        let y0 = bottom - i as f32;
        let t = (i as f32 + 0.5) / height;
        canvas.fill_rect(left, y0 - 1.0, right, y0, colormap.sample(t), false);
    }
    let outline = [(left, top), (right, top), (right, bottom), (left, bottom)];
    canvas.stroke_polyline(&outline, true, LineStyle::solid(Color::BLACK, 1.0), false);

    let (min, max) = range;
    let values = match colormap.classes() {
        Some(n) => (0..=n).map(|i| min + (max - min) * i as f32 / n as f32).collect(),
        None => nice_ticks(min, max, 6),
    };
    let step = match values.as_slice() {
        [a, b, ..] => (b - a).abs(),
        _ => 1.0,
    };

    let span = if max > min { max - min } else { 1.0 };
    let ticks: Vec<(f32, String)> = values
        .into_iter()
        .map(|v| (bottom - (v - min) / span * height, tick_label(v, step)))
        .collect();

    for (y, _) in &ticks {
        canvas.stroke_polyline(
            &[(right, *y), (right + TICK_LENGTH, *y)],
            false,
            LineStyle::solid(Color::BLACK, 1.0),
            false,
        );
    }

    ColorBar {
        left,
        right,
        top,
        bottom,
        ticks,
    }
}

/// Left edge of the rotated side label: past the widest tick label.
pub fn side_label_x(text: &TextRenderer, bar: &ColorBar) -> f32 {
    let widest = bar
        .ticks
        .iter()
        .map(|(_, label)| text.text_width(label, TICK_FONT_SIZE))
        .fold(0.0, f32::max);
    bar.right + TICK_LENGTH + 3.0 + widest + LABEL_GAP
}

/// Write tick labels next to a drawn bar, then `label` along its side.
pub fn label_colorbar(img: &mut RgbaImage, text: &TextRenderer, bar: &ColorBar, label: &str) {
    for (y, tick) in &bar.ticks {
        text.draw_centered_v(img, tick, bar.right + TICK_LENGTH + 3.0, *y, TICK_FONT_SIZE, Color::BLACK);
    }
    let center_y = (bar.top + bar.bottom) / 2.0;
    text.draw_vertical(img, label, side_label_x(text, bar), center_y, LABEL_FONT_SIZE, Color::BLACK);
}
