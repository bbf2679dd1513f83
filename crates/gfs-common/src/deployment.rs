//! Per-deployment configuration values.
//!
//! Each viewer variant (whole Indonesia, a provincial sub-region, a
//! sub-region with city labels) is one `Deployment` value loaded from YAML;
//! the pipeline itself is shared.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::parameter::Parameter;
use crate::region::Region;

/// A named point drawn as a marker with a text label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointMarker {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

/// Color scale limits per parameter, in display units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRanges {
    #[serde(default = "default_rainfall_range")]
    pub rainfall: (f32, f32),
    #[serde(default = "default_temperature_range")]
    pub temperature: (f32, f32),
    #[serde(default = "default_wind_range")]
    pub wind: (f32, f32),
    /// Carried on the display field only. Pressure is drawn as contours
    /// whose levels follow the clipped field's own min and max.
    #[serde(default = "default_pressure_range")]
    pub pressure: (f32, f32),
}

fn default_rainfall_range() -> (f32, f32) {
    (0.0, 50.0)
}

fn default_temperature_range() -> (f32, f32) {
    (0.0, 50.0)
}

fn default_wind_range() -> (f32, f32) {
    (0.0, 50.0)
}

fn default_pressure_range() -> (f32, f32) {
    (980.0, 1020.0)
}

impl Default for ValueRanges {
    fn default() -> Self {
        Self {
            rainfall: default_rainfall_range(),
            temperature: default_temperature_range(),
            wind: default_wind_range(),
            pressure: default_pressure_range(),
        }
    }
}

impl ValueRanges {
    pub fn for_parameter(&self, parameter: Parameter) -> (f32, f32) {
        match parameter {
            Parameter::Rainfall => self.rainfall,
            Parameter::Temperature => self.temperature,
            Parameter::Wind => self.wind,
            Parameter::Pressure => self.pressure,
        }
    }
}

/// Wind arrow placement and scaling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArrowSettings {
    /// Draw an arrow every `stride` grid cells in each axis.
    #[serde(default = "default_arrow_stride")]
    pub stride: usize,
    /// Speed (m/s) that spans the whole plot width; larger means shorter arrows.
    #[serde(default = "default_arrow_scale")]
    pub scale: f32,
    /// Shaft width as a fraction of the plot width.
    #[serde(default = "default_arrow_width")]
    pub width: f32,
}

fn default_arrow_stride() -> usize {
    5
}

fn default_arrow_scale() -> f32 {
    700.0
}

fn default_arrow_width() -> f32 {
    0.002
}

impl Default for ArrowSettings {
    fn default() -> Self {
        Self {
            stride: default_arrow_stride(),
            scale: default_arrow_scale(),
            width: default_arrow_width(),
        }
    }
}

/// Output canvas size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 600,
        }
    }
}

/// One viewer variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    pub name: String,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub header: Option<String>,
    pub region: Region,
    #[serde(default)]
    pub ranges: ValueRanges,
    #[serde(default)]
    pub arrows: ArrowSettings,
    #[serde(default)]
    pub canvas: CanvasSize,
    #[serde(default)]
    pub markers: Vec<PointMarker>,
    /// GeoJSON file with national border lines.
    #[serde(default)]
    pub borders_path: Option<PathBuf>,
    /// TrueType font for titles and labels.
    #[serde(default)]
    pub font_path: Option<PathBuf>,
    /// Draw the land fill and coastlines from the model land mask.
    #[serde(default = "default_land_mask")]
    pub land_mask: bool,
}

fn default_title() -> String {
    "Global Forecast System Viewer".to_string()
}

fn default_land_mask() -> bool {
    true
}

#[derive(Debug, thiserror::Error)]
pub enum DeploymentError {
    #[error("Cannot parse deployment: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Deployment '{name}' is invalid: {message}")]
    Invalid { name: String, message: String },
}

impl Deployment {
    /// Whole-Indonesia deployment with default ranges.
    pub fn indonesia() -> Self {
        Self {
            name: "indonesia".to_string(),
            title: default_title(),
            header: None,
            region: Region::indonesia(),
            ranges: ValueRanges::default(),
            arrows: ArrowSettings::default(),
            canvas: CanvasSize::default(),
            markers: Vec::new(),
            borders_path: None,
            font_path: None,
            land_mask: true,
        }
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, DeploymentError> {
        let deployment: Deployment = serde_yaml::from_str(content)?;
        deployment.validate()?;
        Ok(deployment)
    }

    pub fn validate(&self) -> Result<(), DeploymentError> {
        let invalid = |message: String| DeploymentError::Invalid {
            name: self.name.clone(),
            message,
        };

        if self.region.is_degenerate() {
            return Err(invalid(format!("region has zero extent: {:?}", self.region)));
        }
        if self.region.lat_min < -90.0 || self.region.lat_max > 90.0 {
            return Err(invalid("region latitude outside -90..90".to_string()));
        }
        for param in Parameter::all() {
            let (lo, hi) = self.ranges.for_parameter(*param);
            if !(lo < hi) {
                return Err(invalid(format!("value range for {} is empty: {}..{}", param, lo, hi)));
            }
        }
        if self.arrows.stride == 0 {
            return Err(invalid("arrow stride must be at least 1".to_string()));
        }
        if self.arrows.scale <= 0.0 {
            return Err(invalid("arrow scale must be positive".to_string()));
        }
        if self.canvas.width < 200 || self.canvas.height < 150 {
            return Err(invalid(format!(
                "canvas {}x{} is too small",
                self.canvas.width, self.canvas.height
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_yaml_uses_defaults() {
        let yaml = r#"
name: test
region:
  lat_min: 15
  lat_max: -15
  lon_min: 90
  lon_max: 150
"#;
        let deployment = Deployment::from_yaml_str(yaml).unwrap();
        assert_eq!(deployment.region, Region::indonesia());
        assert_eq!(deployment.ranges.rainfall, (0.0, 50.0));
        assert_eq!(deployment.ranges.temperature, (0.0, 50.0));
        assert_eq!(deployment.ranges.wind, (0.0, 50.0));
        assert_eq!(deployment.arrows.stride, 5);
        assert_eq!(deployment.canvas.width, 1000);
        assert!(deployment.markers.is_empty());
        assert!(deployment.land_mask);
    }

    #[test]
    fn test_rejects_empty_range() {
        let yaml = r#"
name: broken
region: { lat_min: -10, lat_max: 0, lon_min: 100, lon_max: 110 }
ranges:
  temperature: [35, 20]
"#;
        let err = Deployment::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, DeploymentError::Invalid { .. }));
    }

    #[test]
    fn test_rejects_zero_stride() {
        let mut deployment = Deployment::indonesia();
        deployment.arrows.stride = 0;
        assert!(deployment.validate().is_err());
    }
}
