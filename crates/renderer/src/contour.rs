//! Contour line (isoline) rendering using the marching squares algorithm.
//!
//! Lines are traced in grid index space, joined into polylines, smoothed and
//! then projected through the field's coordinates onto the plot area.

use std::collections::VecDeque;

use forecast::GridField;
use tiny_skia::{FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::canvas::{Canvas, LineStyle, PlotArea};
use crate::colormap::Color;
use crate::error::{RenderError, Result};

/// Number of automatically placed levels.
pub const DEFAULT_LEVEL_COUNT: usize = 15;

/// A point in 2D space (grid index or pixel coordinates)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    fn distance(&self, other: &Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// A line segment between two points
#[derive(Debug, Clone)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

/// A complete contour line (polyline)
#[derive(Debug, Clone)]
pub struct Contour {
    pub level: f32,
    pub points: Vec<Point>,
    pub closed: bool,
}

/// How contour lines and their labels look.
#[derive(Debug, Clone)]
pub struct ContourStyle {
    pub color: Color,
    pub line_width: f32,
    /// Number of smoothing passes (0 = no smoothing)
    pub smoothing_passes: u32,
    pub labels: bool,
    pub label_size: f32,
    /// Minimum distance along a line between labels, in pixels.
    pub label_spacing: f32,
}

impl Default for ContourStyle {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            line_width: 0.8,
            smoothing_passes: 1,
            labels: true,
            label_size: 10.0,
            label_spacing: 180.0,
        }
    }
}

/// `count` levels evenly spaced strictly inside `[min, max]`.
///
/// Returns no levels for a flat or non-finite range.
pub fn evenly_spaced_levels(min: f32, max: f32, count: usize) -> Vec<f32> {
    if !min.is_finite() || !max.is_finite() || max <= min || count == 0 {
        return Vec::new();
    }
    let step = (max - min) / (count + 1) as f32;
    (1..=count).map(|i| min + i as f32 * step).collect()
}

/// Integer text for an inline label.
pub fn level_label(level: f32) -> String {
    format!("{:.0}", level)
}

/// Marching squares over a row-major grid.
///
/// Segment coordinates are fractional (column, row) indices. Cells touching
/// a `NaN` corner are skipped.
pub fn march_squares(data: &[f32], width: usize, height: usize, level: f32) -> Vec<Segment> {
    if width < 2 || height < 2 || data.len() != width * height {
        return Vec::new();
    }

    let mut segments = Vec::new();
    for y in 0..(height - 1) {
        for x in 0..(width - 1) {
            let tl = data[y * width + x];
            let tr = data[y * width + x + 1];
            let bl = data[(y + 1) * width + x];
            let br = data[(y + 1) * width + x + 1];

            if tl.is_nan() || tr.is_nan() || bl.is_nan() || br.is_nan() {
                continue;
            }

            let mut case = 0u8;
            if tl >= level {
                case |= 1;
            }
            if tr >= level {
                case |= 2;
            }
            if br >= level {
                case |= 4;
            }
            if bl >= level {
                case |= 8;
            }

            cell_segments(case, x as f32, y as f32, [tl, tr, br, bl], level, &mut segments);
        }
    }
    segments
}

fn cell_segments(case: u8, x: f32, y: f32, corners: [f32; 4], level: f32, out: &mut Vec<Segment>) {
    let [tl, tr, br, bl] = corners;
    let top = || interpolate_edge((x, y), (x + 1.0, y), tl, tr, level);
    let right = || interpolate_edge((x + 1.0, y), (x + 1.0, y + 1.0), tr, br, level);
    let bottom = || interpolate_edge((x, y + 1.0), (x + 1.0, y + 1.0), bl, br, level);
    let left = || interpolate_edge((x, y), (x, y + 1.0), tl, bl, level);
    let mut push = |start: Point, end: Point| out.push(Segment { start, end });

    match case {
        1 | 14 => push(left(), top()),
        2 | 13 => push(top(), right()),
        3 | 12 => push(left(), right()),
        4 | 11 => push(right(), bottom()),
        5 => {
            push(left(), top());
            push(right(), bottom());
        }
        6 | 9 => push(top(), bottom()),
        7 | 8 => push(left(), bottom()),
        10 => {
            push(top(), right());
            push(left(), bottom());
        }
        _ => {}
    }
}

/// Where `level` crosses the edge between two corners.
fn interpolate_edge(p1: (f32, f32), p2: (f32, f32), v1: f32, v2: f32, level: f32) -> Point {
    if (v2 - v1).abs() < 1e-6 {
        return Point::new((p1.0 + p2.0) / 2.0, (p1.1 + p2.1) / 2.0);
    }
    let t = ((level - v1) / (v2 - v1)).clamp(0.0, 1.0);
    Point::new(p1.0 + t * (p2.0 - p1.0), p1.1 + t * (p2.1 - p1.1))
}

/// The unused segment touching `end`, and its far point.
fn attached_segment(segments: &[Segment], used: &[bool], end: Point, epsilon: f32) -> Option<(usize, Point)> {
    segments.iter().enumerate().find_map(|(i, seg)| {
        if used[i] {
            None
        } else if seg.start.distance(&end) < epsilon {
            Some((i, seg.end))
        } else if seg.end.distance(&end) < epsilon {
            Some((i, seg.start))
        } else {
            None
        }
    })
}

/// Join unordered segments into polylines.
///
/// A line is grown from both ends of its first segment, so an open line is
/// never split when that segment lies in its middle.
pub fn connect_segments(segments: Vec<Segment>, level: f32) -> Vec<Contour> {
    const EPSILON: f32 = 0.001;

    let mut contours = Vec::new();
    let mut used = vec![false; segments.len()];

    for start_idx in 0..segments.len() {
        if used[start_idx] {
            continue;
        }
        used[start_idx] = true;
        let mut points = VecDeque::from([segments[start_idx].start, segments[start_idx].end]);

        let mut tail = segments[start_idx].end;
        while let Some((i, point)) = attached_segment(&segments, &used, tail, EPSILON) {
            used[i] = true;
            points.push_back(point);
            tail = point;
        }

        let mut head = segments[start_idx].start;
        let closed = points.len() > 2 && head.distance(&tail) < EPSILON;
        if !closed {
            while let Some((i, point)) = attached_segment(&segments, &used, head, EPSILON) {
                used[i] = true;
                points.push_front(point);
                head = point;
            }
        }

        contours.push(Contour {
            level,
            points: points.into(),
            closed,
        });
    }
    contours
}

/// Chaikin corner cutting; open lines keep their endpoints.
pub fn smooth_contour(contour: &Contour, iterations: u32) -> Contour {
    if iterations == 0 || contour.points.len() < 3 {
        return contour.clone();
    }

    let mut points = contour.points.clone();
    for _ in 0..iterations {
        let n = points.len();
        let pairs = if contour.closed { n } else { n - 1 };
        let mut smoothed = Vec::with_capacity(pairs * 2 + 2);

        if !contour.closed {
            smoothed.push(points[0]);
        }
        for i in 0..pairs {
            let p1 = points[i];
            let p2 = points[(i + 1) % n];
            smoothed.push(Point::new(0.75 * p1.x + 0.25 * p2.x, 0.75 * p1.y + 0.25 * p2.y));
            smoothed.push(Point::new(0.25 * p1.x + 0.75 * p2.x, 0.25 * p1.y + 0.75 * p2.y));
        }
        if !contour.closed {
            smoothed.push(points[n - 1]);
        }
        points = smoothed;
    }

    Contour {
        level: contour.level,
        points,
        closed: contour.closed,
    }
}

/// Coordinate at a fractional index of a regularly spaced axis.
fn coordinate_at(axis: &[f64], index: f32) -> f64 {
    let last = axis.len().saturating_sub(1);
    let i = (index.floor().max(0.0) as usize).min(last.saturating_sub(1));
    match (axis.get(i), axis.get(i + 1)) {
        (Some(a), Some(b)) => a + (b - a) * (index as f64 - i as f64),
        (Some(a), None) => *a,
        _ => 0.0,
    }
}

/// Trace `level` on `field` and return smoothed polylines in pixel space.
pub fn trace_level(field: &GridField, plot: &PlotArea, level: f32, smoothing_passes: u32) -> Vec<Contour> {
    let segments = march_squares(&field.data, field.width(), field.height(), level);
    connect_segments(segments, level)
        .into_iter()
        .map(|contour| {
            let points = contour
                .points
                .iter()
                .map(|p| {
                    let (x, y) = plot.project(coordinate_at(&field.lats, p.y), coordinate_at(&field.lons, p.x));
                    Point::new(x, y)
                })
                .collect();
            smooth_contour(&Contour { points, ..contour }, smoothing_passes)
        })
        .collect()
}

/// Draw contour lines for `levels`, labeling each line inline.
///
/// Returns the number of polylines drawn.
pub fn draw_contours(canvas: &mut Canvas, field: &GridField, levels: &[f32], style: &ContourStyle) -> Result<usize> {
    if field.is_empty() {
        return Err(RenderError::EmptyField);
    }

    let plot = *canvas.plot();
    let line = LineStyle::solid(style.color, style.line_width);
    let mut labels: Vec<LabelPosition> = Vec::new();
    let mut drawn = 0;

    for &level in levels {
        for contour in trace_level(field, &plot, level, style.smoothing_passes) {
            let points: Vec<(f32, f32)> = contour.points.iter().map(|p| (p.x, p.y)).collect();
            canvas.stroke_polyline(&points, contour.closed, line, true);
            drawn += 1;

            if style.labels {
                collect_label_positions(&contour, style, &plot, &mut labels);
            }
        }
    }

    for label in &labels {
        draw_text_label(canvas.pixmap_mut(), label, style);
    }

    tracing::debug!(
        levels = levels.len(),
        contours = drawn,
        labels = labels.len(),
        "Drew contours"
    );
    Ok(drawn)
}

/// Position and metadata for a contour label
#[derive(Debug, Clone)]
struct LabelPosition {
    x: f32,
    y: f32,
    angle: f32,
    text: String,
}

fn contour_length(contour: &Contour) -> f32 {
    contour.points.windows(2).map(|w| w[0].distance(&w[1])).sum()
}

/// Place labels evenly along a line, inside the plot and apart from others.
fn collect_label_positions(
    contour: &Contour,
    style: &ContourStyle,
    plot: &PlotArea,
    positions: &mut Vec<LabelPosition>,
) {
    let total_length = contour_length(contour);
    if total_length < style.label_spacing * 0.5 {
        return;
    }

    let text = level_label(contour.level);
    let margin = style.label_size * 2.0;
    let num_labels = ((total_length / style.label_spacing).floor() as usize).max(1);
    let spacing = total_length / (num_labels as f32 + 1.0);
    let min_distance = style.label_size * 4.0;

    let mut accumulated = 0.0;
    let mut next_at = spacing;
    let mut placed = 0;

    for w in contour.points.windows(2) {
        if placed >= num_labels {
            break;
        }
        let (p1, p2) = (w[0], w[1]);
        let (dx, dy) = (p2.x - p1.x, p2.y - p1.y);
        let seg_len = p1.distance(&p2);

        while seg_len > 0.0 && accumulated + seg_len >= next_at && placed < num_labels {
            let t = (next_at - accumulated) / seg_len;
            let (x, y) = (p1.x + t * dx, p1.y + t * dy);

            let inside = x > plot.left + margin
                && x < plot.right() - margin
                && y > plot.top + margin
                && y < plot.bottom() - margin;
            let crowded = positions
                .iter()
                .any(|pos| (pos.x - x).powi(2) + (pos.y - y).powi(2) < min_distance * min_distance);

            if inside && !crowded {
                // Keep text upright.
                let mut angle = dy.atan2(dx);
                if angle.abs() > std::f32::consts::FRAC_PI_2 {
                    angle += std::f32::consts::PI;
                }
                positions.push(LabelPosition {
                    x,
                    y,
                    angle,
                    text: text.clone(),
                });
            }

            next_at += spacing;
            placed += 1;
        }
        accumulated += seg_len;
    }
}

/// Rotated label on a white box so the line underneath is hidden.
fn draw_text_label(pixmap: &mut Pixmap, label: &LabelPosition, style: &ContourStyle) {
    let size = style.label_size;
    let char_width = size * 0.6;
    let char_spacing = size * 0.15;
    let count = label.text.chars().count() as f32;
    let text_width = count * (char_width + char_spacing) - char_spacing;

    let (sin_a, cos_a) = label.angle.sin_cos();
    let rotate = |px: f32, py: f32| (px * cos_a - py * sin_a + label.x, px * sin_a + py * cos_a + label.y);

    let half_w = text_width / 2.0 + size * 0.2;
    let half_h = size / 2.0 + size * 0.2;
    let mut pb = PathBuilder::new();
    for (i, (cx, cy)) in [(-half_w, -half_h), (half_w, -half_h), (half_w, half_h), (-half_w, half_h)]
        .into_iter()
        .enumerate()
    {
        let (rx, ry) = rotate(cx, cy);
        if i == 0 {
            pb.move_to(rx, ry);
        } else {
            pb.line_to(rx, ry);
        }
    }
    pb.close();

    let mut background = Paint::default();
    background.set_color(Color::WHITE.to_skia());
    background.anti_alias = true;
    if let Some(path) = pb.finish() {
        pixmap.fill_path(&path, &background, FillRule::Winding, Transform::identity(), None);
    }

    let mut ink = Paint::default();
    ink.set_color(style.color.to_skia());
    ink.anti_alias = true;

    let start_x = -text_width / 2.0 + char_width / 2.0;
    for (i, ch) in label.text.chars().enumerate() {
        let (cx, cy) = rotate(start_x + i as f32 * (char_width + char_spacing), 0.0);
        draw_character(pixmap, cx, cy, label.angle, ch, char_width, size, &ink);
    }
}

/// Stroke a digit or sign as seven-segment style lines centred on `(x, y)`.
fn draw_character(
    pixmap: &mut Pixmap,
    x: f32,
    y: f32,
    angle: f32,
    ch: char,
    width: f32,
    height: f32,
    paint: &Paint,
) {
    let (sin_a, cos_a) = angle.sin_cos();
    let (w, h) = (width / 2.0, height / 2.0);
    let stroke = Stroke {
        width: (width * 0.18).max(1.0),
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };
    let rotate = |px: f32, py: f32| (px * cos_a - py * sin_a + x, px * sin_a + py * cos_a + y);

    let strokes: Vec<((f32, f32), (f32, f32))> = match ch {
        '0' => vec![((-w, -h), (w, -h)), ((w, -h), (w, h)), ((w, h), (-w, h)), ((-w, h), (-w, -h))],
        '1' => vec![((0.0, -h), (0.0, h))],
        '2' => vec![((-w, -h), (w, -h)), ((w, -h), (w, 0.0)), ((w, 0.0), (-w, 0.0)), ((-w, 0.0), (-w, h)), ((-w, h), (w, h))],
        '3' => vec![((-w, -h), (w, -h)), ((w, -h), (w, h)), ((w, h), (-w, h)), ((-w, 0.0), (w, 0.0))],
        '4' => vec![((-w, -h), (-w, 0.0)), ((-w, 0.0), (w, 0.0)), ((w, -h), (w, h))],
        '5' => vec![((w, -h), (-w, -h)), ((-w, -h), (-w, 0.0)), ((-w, 0.0), (w, 0.0)), ((w, 0.0), (w, h)), ((w, h), (-w, h))],
        '6' => vec![((w, -h), (-w, -h)), ((-w, -h), (-w, h)), ((-w, h), (w, h)), ((w, h), (w, 0.0)), ((w, 0.0), (-w, 0.0))],
        '7' => vec![((-w, -h), (w, -h)), ((w, -h), (0.0, h))],
        '8' => vec![((-w, -h), (w, -h)), ((w, -h), (w, h)), ((w, h), (-w, h)), ((-w, h), (-w, -h)), ((-w, 0.0), (w, 0.0))],
        '9' => vec![((-w, 0.0), (w, 0.0)), ((w, 0.0), (w, -h)), ((w, -h), (-w, -h)), ((-w, -h), (-w, 0.0)), ((w, 0.0), (w, h))],
        '-' => vec![((-w, 0.0), (w, 0.0))],
        _ => vec![],
    };

    for ((x1, y1), (x2, y2)) in strokes {
        let (rx1, ry1) = rotate(x1, y1);
        let (rx2, ry2) = rotate(x2, y2);
        let mut pb = PathBuilder::new();
        pb.move_to(rx1, ry1);
        pb.line_to(rx2, ry2);
        if let Some(path) = pb.finish() {
            pixmap.stroke_path(&path, paint, &stroke, Transform::identity(), None);
        }
    }
}
