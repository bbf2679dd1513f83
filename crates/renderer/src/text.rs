//! TrueType text for titles, color bar labels and marker names.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use gfs_common::lead_time_label;
use gfs_common::time::valid_time_label;
use image::{imageops, Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;
use rusttype::{point, Font, Scale};

use crate::colormap::Color;
use crate::error::{RenderError, Result};

/// Fonts tried when the deployment does not name one.
pub const FONT_SEARCH_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Left title: `"{label}  Valid 06UTC Mon 15 Jan 2024"`.
pub fn left_title(label: &str, valid: &DateTime<Utc>) -> String {
    format!("{}  Valid {}", label, valid_time_label(valid))
}

/// Right title: `"GFS t+007"`.
pub fn right_title(step: u32) -> String {
    format!("GFS {}", lead_time_label(step))
}

/// A loaded font.
pub struct TextRenderer {
    font: Font<'static>,
    source: PathBuf,
}

impl std::fmt::Debug for TextRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRenderer").field("source", &self.source).finish()
    }
}

impl TextRenderer {
    pub fn load(path: &Path) -> Result<Self> {
        let asset_error = |message: String| RenderError::Asset {
            path: path.display().to_string(),
            message,
        };
        let bytes = std::fs::read(path).map_err(|e| asset_error(e.to_string()))?;
        let font = Font::try_from_vec(bytes).ok_or_else(|| asset_error("not a TrueType font".to_string()))?;
        Ok(Self {
            font,
            source: path.to_path_buf(),
        })
    }

    /// Load the configured font, or the first system font that exists.
    ///
    /// Returns `None` with a warning when nothing loads; maps are then drawn
    /// without text.
    pub fn discover(configured: Option<&Path>) -> Option<Self> {
        if let Some(path) = configured {
            match Self::load(path) {
                Ok(renderer) => return Some(renderer),
                Err(e) => tracing::warn!(error = %e, "Configured font unavailable, searching system fonts"),
            }
        }

        let found = FONT_SEARCH_PATHS
            .iter()
            .map(Path::new)
            .filter(|p| p.exists())
            .find_map(|p| Self::load(p).ok());

        match &found {
            Some(renderer) => tracing::debug!(font = %renderer.source.display(), "Loaded font"),
            None => tracing::warn!("No TrueType font found; map text will be omitted"),
        }
        found
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Advance width of `text` in pixels.
    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        self.font
            .layout(text, Scale::uniform(size), point(0.0, 0.0))
            .last()
            .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
            .unwrap_or(0.0)
    }

    /// Draw `text` with its top-left corner at `(x, y)`.
    pub fn draw(&self, img: &mut RgbaImage, text: &str, x: f32, y: f32, size: f32, color: Color) {
        draw_text_mut(
            img,
            color.to_rgba(),
            x.round() as i32,
            y.round() as i32,
            Scale::uniform(size),
            &self.font,
            text,
        );
    }

    /// Draw `text` ending at `right`.
    pub fn draw_right_aligned(&self, img: &mut RgbaImage, text: &str, right: f32, y: f32, size: f32, color: Color) {
        let x = right - self.text_width(text, size);
        self.draw(img, text, x, y, size, color);
    }

    /// Draw `text` vertically centred on `y`.
    pub fn draw_centered_v(&self, img: &mut RgbaImage, text: &str, x: f32, y: f32, size: f32, color: Color) {
        self.draw(img, text, x, y - size / 2.0, size, color);
    }

    /// Draw `text` rotated to read bottom to top, its left edge at `x` and
    /// centred on `center_y`. Returns the drawn width in pixels.
    pub fn draw_vertical(&self, img: &mut RgbaImage, text: &str, x: f32, center_y: f32, size: f32, color: Color) -> u32 {
        let length = self.text_width(text, size).ceil() as u32;
        if length == 0 {
            return 0;
        }
        let mut strip = RgbaImage::from_pixel(length + 2, (size * 1.25).ceil() as u32, Rgba([0, 0, 0, 0]));
        draw_text_mut(&mut strip, color.to_rgba(), 1, 0, Scale::uniform(size), &self.font, text);
        let rotated = imageops::rotate270(&strip);

        let top = center_y - rotated.height() as f32 / 2.0;
        imageops::overlay(img, &rotated, x.round() as i64, top.round() as i64);
        rotated.width()
    }
}
