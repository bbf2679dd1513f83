//! Map canvas: a raster with an equirectangular plot area.

use gfs_common::Region;
use image::RgbaImage;
use tiny_skia::{
    FillRule, LineCap, LineJoin, Mask, Paint, PathBuilder, Pixmap, Rect, Stroke, StrokeDash,
    Transform,
};

use crate::colormap::Color;
use crate::error::{RenderError, Result};

/// Space around the plot area in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Default for Margins {
    /// Room for titles above and a color bar on the right.
    fn default() -> Self {
        Self {
            top: 40.0,
            right: 110.0,
            bottom: 30.0,
            left: 50.0,
        }
    }
}

/// Pixel rectangle showing `region` with equal scale in both axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotArea {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
    pub region: Region,
}

impl PlotArea {
    /// Fit `region` into the canvas inside `margins`, preserving a 1:1
    /// degree aspect and centering along the slack axis.
    pub fn fit(canvas_width: u32, canvas_height: u32, region: &Region, margins: Margins) -> Result<Self> {
        let avail_w = canvas_width as f32 - margins.left - margins.right;
        let avail_h = canvas_height as f32 - margins.top - margins.bottom;
        if avail_w < 1.0 || avail_h < 1.0 || region.is_degenerate() {
            return Err(RenderError::InvalidCanvas {
                width: canvas_width,
                height: canvas_height,
            });
        }

        let deg_w = region.width() as f32;
        let deg_h = region.height() as f32;
        let scale = (avail_w / deg_w).min(avail_h / deg_h);
        let width = deg_w * scale;
        let height = deg_h * scale;

        Ok(Self {
            left: margins.left + (avail_w - width) / 2.0,
            top: margins.top + (avail_h - height) / 2.0,
            width,
            height,
            region: *region,
        })
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// Pixels per degree (same in both axes).
    pub fn scale(&self) -> f32 {
        self.width / self.region.width() as f32
    }

    /// Bring a longitude onto the region's convention (`-180..180` or `0..360`).
    pub fn align_lon(&self, lon: f64) -> f64 {
        if self.region.lon_max > 180.0 && lon < 0.0 {
            lon + 360.0
        } else if self.region.lon_min < 0.0 && lon > 180.0 {
            lon - 360.0
        } else {
            lon
        }
    }

    pub fn lon_to_x(&self, lon: f64) -> f32 {
        let lon = self.align_lon(lon);
        self.left + ((lon - self.region.lon_min) as f32) * self.scale()
    }

    pub fn lat_to_y(&self, lat: f64) -> f32 {
        self.top + ((self.region.lat_max - lat) as f32) * self.scale()
    }

    pub fn project(&self, lat: f64, lon: f64) -> (f32, f32) {
        (self.lon_to_x(lon), self.lat_to_y(lat))
    }

    pub fn rect(&self) -> Option<Rect> {
        Rect::from_xywh(self.left, self.top, self.width, self.height)
    }
}

/// Cell boundaries for point-centered coordinates: midpoints between
/// neighbours, extended by half a spacing at both ends.
pub fn cell_edges(centers: &[f64]) -> Vec<f64> {
    match centers.len() {
        0 => Vec::new(),
        1 => vec![centers[0] - 0.125, centers[0] + 0.125],
        n => {
            let mut edges = Vec::with_capacity(n + 1);
            edges.push(centers[0] - (centers[1] - centers[0]) / 2.0);
            edges.extend(centers.windows(2).map(|w| (w[0] + w[1]) / 2.0));
            edges.push(centers[n - 1] + (centers[n - 1] - centers[n - 2]) / 2.0);
            edges
        }
    }
}

/// Line style for [`Canvas::stroke_polyline`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    pub color: Color,
    pub width: f32,
    /// On/off dash lengths in pixels.
    pub dash: Option<(f32, f32)>,
}

impl LineStyle {
    pub fn solid(color: Color, width: f32) -> Self {
        Self {
            color,
            width,
            dash: None,
        }
    }

    pub fn dotted(color: Color, width: f32) -> Self {
        Self {
            color,
            width,
            dash: Some((width, width * 2.5)),
        }
    }
}

/// Raster surface for one map.
///
/// Drawing calls with `clip = true` are masked to the plot area; frame and
/// color bar are drawn with `clip = false`.
pub struct Canvas {
    pixmap: Pixmap,
    plot: PlotArea,
    plot_mask: Option<Mask>,
}

impl Canvas {
    /// White canvas with the default margins.
    pub fn new(width: u32, height: u32, region: &Region) -> Result<Self> {
        Self::with_margins(width, height, region, Margins::default())
    }

    pub fn with_margins(width: u32, height: u32, region: &Region, margins: Margins) -> Result<Self> {
        let plot = PlotArea::fit(width, height, region, margins)?;
        let mut pixmap = Pixmap::new(width, height).ok_or(RenderError::InvalidCanvas { width, height })?;
        pixmap.fill(Color::WHITE.to_skia());

        let plot_mask = plot.rect().and_then(|rect| {
            let mut mask = Mask::new(width, height)?;
            mask.fill_path(&PathBuilder::from_rect(rect), FillRule::Winding, false, Transform::identity());
            Some(mask)
        });

        Ok(Self {
            pixmap,
            plot,
            plot_mask,
        })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn plot(&self) -> &PlotArea {
        &self.plot
    }

    pub fn pixmap_mut(&mut self) -> &mut Pixmap {
        &mut self.pixmap
    }

    fn paint(color: Color, anti_alias: bool) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color(color.to_skia());
        paint.anti_alias = anti_alias;
        paint
    }

    /// Axis-aligned rectangle from two corners, without anti-aliasing so
    /// neighbouring mesh cells meet without seams.
    pub fn fill_rect(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, color: Color, clip: bool) {
        let rect = Rect::from_ltrb(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1));
        if let Some(rect) = rect {
            let paint = Self::paint(color, false);
            let mask = if clip { self.plot_mask.as_ref() } else { None };
            self.pixmap.fill_rect(rect, &paint, Transform::identity(), mask);
        }
    }

    pub fn fill_polygon(&mut self, points: &[(f32, f32)], color: Color, clip: bool) {
        let Some(path) = polyline_path(points, true) else {
            return;
        };
        let paint = Self::paint(color, true);
        let mask = if clip { self.plot_mask.as_ref() } else { None };
        self.pixmap
            .fill_path(&path, &paint, FillRule::Winding, Transform::identity(), mask);
    }

    pub fn stroke_polyline(&mut self, points: &[(f32, f32)], closed: bool, style: LineStyle, clip: bool) {
        let Some(path) = polyline_path(points, closed) else {
            return;
        };
        let paint = Self::paint(style.color, true);
        let stroke = Stroke {
            width: style.width,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            dash: style.dash.and_then(|(on, off)| StrokeDash::new(vec![on, off], 0.0)),
            ..Stroke::default()
        };
        let mask = if clip { self.plot_mask.as_ref() } else { None };
        self.pixmap
            .stroke_path(&path, &paint, &stroke, Transform::identity(), mask);
    }

    pub fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Color, clip: bool) {
        if let Some(path) = PathBuilder::from_circle(cx, cy, radius) {
            let paint = Self::paint(color, true);
            let mask = if clip { self.plot_mask.as_ref() } else { None };
            self.pixmap
                .fill_path(&path, &paint, FillRule::Winding, Transform::identity(), mask);
        }
    }

    /// Black border around the plot area.
    pub fn draw_frame(&mut self) {
        let p = self.plot;
        let corners = [
            (p.left, p.top),
            (p.right(), p.top),
            (p.right(), p.bottom()),
            (p.left, p.bottom()),
        ];
        self.stroke_polyline(&corners, true, LineStyle::solid(Color::BLACK, 1.0), false);
    }

    /// Convert to straight-alpha RGBA.
    pub fn into_image(self) -> RgbaImage {
        let (width, height) = (self.pixmap.width(), self.pixmap.height());
        let raw: Vec<u8> = self
            .pixmap
            .pixels()
            .iter()
            .flat_map(|p| {
                let c = p.demultiply();
                [c.red(), c.green(), c.blue(), c.alpha()]
            })
            .collect();
        RgbaImage::from_raw(width, height, raw).unwrap_or_else(|| RgbaImage::new(width, height))
    }
}

fn polyline_path(points: &[(f32, f32)], closed: bool) -> Option<tiny_skia::Path> {
    let (first, rest) = points.split_first()?;
    if rest.is_empty() {
        return None;
    }
    let mut pb = PathBuilder::new();
    pb.move_to(first.0, first.1);
    for &(x, y) in rest {
        pb.line_to(x, y);
    }
    if closed {
        pb.close();
    }
    pb.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plot_area_keeps_square_degrees() {
        let region = Region::indonesia(); // 60° × 30°
        let plot = PlotArea::fit(1000, 600, &region, Margins::default()).unwrap();
        let px_per_deg_x = plot.width / 60.0;
        let px_per_deg_y = plot.height / 30.0;
        assert!((px_per_deg_x - px_per_deg_y).abs() < 1e-3);
        assert!(plot.right() <= 1000.0 - 110.0 + 1e-3);
        assert!(plot.bottom() <= 600.0 - 30.0 + 1e-3);
    }

    #[test]
    fn test_projection_corners() {
        let region = Region::new(-10.0, 0.0, 100.0, 120.0);
        let plot = PlotArea::fit(800, 500, &region, Margins::default()).unwrap();
        assert!((plot.lon_to_x(100.0) - plot.left).abs() < 1e-3);
        assert!((plot.lon_to_x(120.0) - plot.right()).abs() < 1e-3);
        assert!((plot.lat_to_y(0.0) - plot.top).abs() < 1e-3);
        assert!((plot.lat_to_y(-10.0) - plot.bottom()).abs() < 1e-3);
    }

    #[test]
    fn test_negative_longitudes_align_to_region() {
        let region = Region::new(-10.0, 10.0, 170.0, 190.0);
        let plot = PlotArea::fit(800, 500, &region, Margins::default()).unwrap();
        assert!((plot.lon_to_x(-175.0) - plot.lon_to_x(185.0)).abs() < 1e-3);
    }

    #[test]
    fn test_cell_edges() {
        assert_eq!(cell_edges(&[0.0, 1.0, 2.0]), vec![-0.5, 0.5, 1.5, 2.5]);
        assert_eq!(cell_edges(&[2.0, 1.0]), vec![2.5, 1.5, 0.5]);
        assert!(cell_edges(&[]).is_empty());
    }

    #[test]
    fn test_canvas_too_small_for_margins() {
        assert!(Canvas::new(100, 50, &Region::indonesia()).is_err());
    }

    #[test]
    fn test_clipped_fill_stays_in_plot() {
        let region = Region::new(-10.0, 0.0, 100.0, 120.0);
        let mut canvas = Canvas::new(400, 300, &region).unwrap();
        let plot = *canvas.plot();
        canvas.fill_rect(0.0, 0.0, 400.0, 300.0, Color::BLACK, true);
        let img = canvas.into_image();

        assert_eq!(img.get_pixel(2, 2).0, [255, 255, 255, 255]);
        let cx = (plot.left + plot.width / 2.0) as u32;
        let cy = (plot.top + plot.height / 2.0) as u32;
        assert_eq!(img.get_pixel(cx, cy).0, [0, 0, 0, 255]);
    }
}
