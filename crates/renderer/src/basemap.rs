//! Base map layers: land fill, coastlines, national borders and city markers.
//!
//! Land and coastlines come from the model's own land mask (`landsfc`, 1 over
//! land), so they match the grid the data is drawn on. Borders are read from
//! a GeoJSON file.

use std::path::Path;

use forecast::GridField;
use gfs_common::PointMarker;
use image::RgbaImage;
use serde_json::Value;

use crate::canvas::{Canvas, LineStyle, PlotArea};
use crate::colormap::Color;
use crate::contour::trace_level;
use crate::error::{RenderError, Result};
use crate::mesh::draw_cells;
use crate::text::TextRenderer;

/// Land mask value separating sea from land.
pub const COASTLINE_LEVEL: f32 = 0.5;

const COASTLINE_WIDTH: f32 = 0.8;
const BORDER_WIDTH: f32 = 1.0;
const MARKER_RADIUS: f32 = 3.0;
const MARKER_FONT_SIZE: f32 = 12.0;

/// Fill land cells with light gray.
pub fn draw_land(canvas: &mut Canvas, land_mask: &GridField) -> Result<usize> {
    draw_cells(canvas, land_mask, |v| (v >= COASTLINE_LEVEL).then_some(Color::LIGHT_GRAY))
}

/// Stroke the land/sea boundary.
pub fn draw_coastlines(canvas: &mut Canvas, land_mask: &GridField) -> usize {
    let plot = *canvas.plot();
    let style = LineStyle::solid(Color::BLACK, COASTLINE_WIDTH);
    let lines = trace_level(land_mask, &plot, COASTLINE_LEVEL, 1);
    for line in &lines {
        let points: Vec<(f32, f32)> = line.points.iter().map(|p| (p.x, p.y)).collect();
        canvas.stroke_polyline(&points, line.closed, style, true);
    }
    lines.len()
}

/// Border polylines as `(lon, lat)` vertices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BorderLines {
    pub lines: Vec<Vec<(f64, f64)>>,
}

impl BorderLines {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| RenderError::Asset {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_geojson_str(&content).map_err(|e| match e {
            RenderError::Asset { message, .. } => RenderError::Asset {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    /// Collect lines from a GeoJSON document.
    ///
    /// Accepts a FeatureCollection, a Feature or a bare geometry. Line and
    /// polygon geometries contribute their rings; points are ignored.
    pub fn from_geojson_str(content: &str) -> Result<Self> {
        let doc: Value = serde_json::from_str(content).map_err(|e| RenderError::Asset {
            path: "<geojson>".to_string(),
            message: e.to_string(),
        })?;
        let mut lines = Vec::new();
        collect_lines(&doc, &mut lines);
        Ok(Self { lines })
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

fn collect_lines(node: &Value, out: &mut Vec<Vec<(f64, f64)>>) {
    let kind = node.get("type").and_then(Value::as_str).unwrap_or_default();
    let coords = node.get("coordinates");

    match kind {
        "FeatureCollection" => {
            for feature in node.get("features").and_then(Value::as_array).into_iter().flatten() {
                collect_lines(feature, out);
            }
        }
        "Feature" => {
            if let Some(geometry) = node.get("geometry") {
                collect_lines(geometry, out);
            }
        }
        "GeometryCollection" => {
            for geometry in node.get("geometries").and_then(Value::as_array).into_iter().flatten() {
                collect_lines(geometry, out);
            }
        }
        "LineString" => out.extend(coords.and_then(ring)),
        "MultiLineString" | "Polygon" => out.extend(coords.into_iter().flat_map(rings)),
        "MultiPolygon" => {
            for polygon in coords.and_then(Value::as_array).into_iter().flatten() {
                out.extend(rings(polygon));
            }
        }
        _ => {}
    }
}

fn rings(value: &Value) -> Vec<Vec<(f64, f64)>> {
    value
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(ring)
        .collect()
}

fn ring(value: &Value) -> Option<Vec<(f64, f64)>> {
    let vertices: Vec<(f64, f64)> = value
        .as_array()?
        .iter()
        .filter_map(|p| Some((p.get(0)?.as_f64()?, p.get(1)?.as_f64()?)))
        .collect();
    (vertices.len() >= 2).then_some(vertices)
}

/// Stroke borders with a dotted line.
pub fn draw_borders(canvas: &mut Canvas, borders: &BorderLines) {
    let plot = *canvas.plot();
    let style = LineStyle::dotted(Color::BLACK, BORDER_WIDTH);
    for line in &borders.lines {
        let points: Vec<(f32, f32)> = line.iter().map(|&(lon, lat)| plot.project(lat, lon)).collect();
        canvas.stroke_polyline(&points, false, style, true);
    }
}

/// Dots for markers inside the plot region.
pub fn draw_marker_points(canvas: &mut Canvas, markers: &[PointMarker]) {
    let plot = *canvas.plot();
    for marker in markers.iter().filter(|m| plot.region.contains(m.lat, plot.align_lon(m.lon))) {
        let (x, y) = plot.project(marker.lat, marker.lon);
        canvas.fill_circle(x, y, MARKER_RADIUS, Color::BLACK, true);
    }
}

/// Names beside the marker dots.
pub fn label_markers(img: &mut RgbaImage, text: &TextRenderer, plot: &PlotArea, markers: &[PointMarker]) {
    for marker in markers.iter().filter(|m| plot.region.contains(m.lat, plot.align_lon(m.lon))) {
        let (x, y) = plot.project(marker.lat, marker.lon);
        text.draw_centered_v(img, &marker.name, x + MARKER_RADIUS + 3.0, y, MARKER_FONT_SIZE, Color::BLACK);
    }
}
