//! Map composition: base map, field layer, color bar and titles.

use std::time::Instant;

use chrono::{DateTime, Utc};
use forecast::{DisplayField, GridField};
use gfs_common::{lead_time_label, Deployment, DrawMode, Parameter};
use image::RgbaImage;

use crate::arrows::draw_arrows;
use crate::basemap::{draw_borders, draw_coastlines, draw_land, draw_marker_points, label_markers, BorderLines};
use crate::canvas::Canvas;
use crate::colormap::{Color, Colormap};
use crate::contour::{draw_contours, evenly_spaced_levels, ContourStyle, DEFAULT_LEVEL_COUNT};
use crate::error::{RenderError, Result};
use crate::legend::{draw_colorbar, label_colorbar};
use crate::mesh::draw_filled;
use crate::png::encode_png;
use crate::text::{left_title, right_title, TextRenderer};

const TITLE_FONT_SIZE: f32 = 14.0;

/// File name offered for download: `pratesfc_t+007.png`.
pub fn download_name(parameter: Parameter, step: u32) -> String {
    format!("{}_{}.png", parameter.key(), lead_time_label(step))
}

/// A rendered map.
#[derive(Debug, Clone)]
pub struct MapImage {
    pub image: RgbaImage,
    pub parameter: Parameter,
    pub step: u32,
}

impl MapImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn to_png(&self) -> Result<Vec<u8>> {
        encode_png(&self.image)
    }

    pub fn download_name(&self) -> String {
        download_name(self.parameter, self.step)
    }
}

/// Renders maps for one deployment.
///
/// Borders and the font are loaded once; a missing font only removes text.
#[derive(Debug)]
pub struct MapRenderer {
    deployment: Deployment,
    borders: Option<BorderLines>,
    text: Option<TextRenderer>,
}

impl MapRenderer {
    /// Load the deployment's assets.
    ///
    /// A configured borders file that cannot be read is an error.
    pub fn new(deployment: Deployment) -> Result<Self> {
        let borders = deployment
            .borders_path
            .as_deref()
            .map(BorderLines::load)
            .transpose()?;
        let text = TextRenderer::discover(deployment.font_path.as_deref());

        tracing::info!(
            deployment = %deployment.name,
            border_lines = borders.as_ref().map(|b| b.lines.len()).unwrap_or(0),
            font = text.as_ref().map(|t| t.source().display().to_string()).unwrap_or_default(),
            "Map renderer ready"
        );

        Ok(Self {
            deployment,
            borders,
            text,
        })
    }

    /// Renderer with explicit assets.
    pub fn with_assets(deployment: Deployment, borders: Option<BorderLines>, text: Option<TextRenderer>) -> Self {
        Self {
            deployment,
            borders,
            text,
        }
    }

    pub fn deployment(&self) -> &Deployment {
        &self.deployment
    }

    pub fn has_font(&self) -> bool {
        self.text.is_some()
    }

    /// Draw `field` for `step`, valid at `valid_time`.
    ///
    /// `land_mask` is the clipped `landsfc` field; without it the map has no
    /// land fill or coastlines.
    #[tracing::instrument(skip_all, fields(parameter = %field.parameter, step = step))]
    pub fn render(
        &self,
        field: &DisplayField,
        land_mask: Option<&GridField>,
        valid_time: &DateTime<Utc>,
        step: u32,
    ) -> Result<MapImage> {
        let start = Instant::now();
        if field.field.is_empty() {
            return Err(RenderError::EmptyField);
        }

        let size = self.deployment.canvas;
        let mut canvas = Canvas::new(size.width, size.height, &self.deployment.region)?;

        if let Some(mask) = land_mask.filter(|_| self.deployment.land_mask) {
            draw_land(&mut canvas, mask)?;
        }

        let mut colorbar = None;
        match field.draw_mode {
            DrawMode::Filled | DrawMode::FilledVector => {
                let colormap = Colormap::by_name(&field.colormap)?;
                draw_filled(&mut canvas, &field.field, &colormap, field.value_range)?;
                colorbar = Some(draw_colorbar(&mut canvas, &colormap, field.value_range));

                if field.draw_mode == DrawMode::FilledVector {
                    if let Some(vectors) = &field.vectors {
                        draw_arrows(&mut canvas, vectors, &self.deployment.arrows)?;
                    }
                }
            }
            DrawMode::Contour => {
                let levels = field
                    .field
                    .min_max()
                    .map(|(lo, hi)| evenly_spaced_levels(lo, hi, DEFAULT_LEVEL_COUNT))
                    .unwrap_or_default();
                draw_contours(&mut canvas, &field.field, &levels, &ContourStyle::default())?;
            }
        }

        if let Some(mask) = land_mask.filter(|_| self.deployment.land_mask) {
            draw_coastlines(&mut canvas, mask);
        }
        if let Some(borders) = &self.borders {
            draw_borders(&mut canvas, borders);
        }
        draw_marker_points(&mut canvas, &self.deployment.markers);
        canvas.draw_frame();

        let plot = *canvas.plot();
        let mut image = canvas.into_image();

        if let Some(text) = &self.text {
            let title_y = (plot.top - TITLE_FONT_SIZE - 6.0).max(2.0);
            text.draw(&mut image, &left_title(&field.label, valid_time), plot.left, title_y, TITLE_FONT_SIZE, Color::BLACK);
            text.draw_right_aligned(&mut image, &right_title(step), plot.right(), title_y, TITLE_FONT_SIZE, Color::BLACK);
            if let Some(bar) = &colorbar {
                label_colorbar(&mut image, text, bar, &field.label);
            }
            label_markers(&mut image, text, &plot, &self.deployment.markers);
        }

        metrics::histogram!("map_render_duration_seconds").record(start.elapsed().as_secs_f64());
        tracing::debug!(
            width = image.width(),
            height = image.height(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Rendered map"
        );

        Ok(MapImage {
            image,
            parameter: field.parameter,
            step,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_name() {
        assert_eq!(download_name(Parameter::Rainfall, 7), "pratesfc_t+007.png");
        assert_eq!(download_name(Parameter::Pressure, 240), "prmsl_t+240.png");
    }
}
