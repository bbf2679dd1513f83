//! Named colormaps and value-to-color scaling.

use crate::error::{RenderError, Result};

/// Color value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    /// matplotlib `lightgray`
    pub const LIGHT_GRAY: Color = Color::rgb(211, 211, 211);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn transparent() -> Self {
        Self { r: 0, g: 0, b: 0, a: 0 }
    }

    /// Parse `#RRGGBB`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self::rgb(r, g, b))
    }

    pub fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }

    pub fn to_rgba(self) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, self.a])
    }
}

/// Linear color interpolation
pub fn interpolate_color(color1: Color, color2: Color, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let t_inv = 1.0 - t;
    let mix = |a: u8, b: u8| (a as f32 * t_inv + b as f32 * t).round() as u8;

    Color::new(
        mix(color1.r, color2.r),
        mix(color1.g, color2.g),
        mix(color1.b, color2.b),
        mix(color1.a, color2.a),
    )
}

const BLUES: &[&str] = &[
    "#f7fbff", "#deebf7", "#c6dbef", "#9ecae1", "#6baed6", "#4292c6", "#2171b5", "#08519c",
    "#08306b",
];

const COOLWARM: &[&str] = &["#3b4cc0", "#8db0fe", "#dddddd", "#f49a7b", "#b40426"];

const RDYLGN_R: &[&str] = &[
    "#006837", "#1a9850", "#66bd63", "#a6d96a", "#d9ef8b", "#ffffbf", "#fee08b", "#fdae61",
    "#f46d43", "#d73027", "#a50026",
];

const COOL: &[&str] = &["#00ffff", "#ff00ff"];

/// A colormap: evenly spaced color stops, optionally quantized into classes.
#[derive(Debug, Clone, PartialEq)]
pub struct Colormap {
    pub name: String,
    stops: Vec<Color>,
    classes: Option<usize>,
}

impl Colormap {
    pub fn new(name: impl Into<String>, stops: Vec<Color>) -> Self {
        Self {
            name: name.into(),
            stops,
            classes: None,
        }
    }

    /// Look up a named map. `RdYlGn_r` is quantized into 10 classes.
    pub fn by_name(name: &str) -> Result<Self> {
        let (hexes, classes) = match name {
            "Blues" => (BLUES, None),
            "coolwarm" => (COOLWARM, None),
            "RdYlGn_r" => (RDYLGN_R, Some(10)),
            "cool" => (COOL, None),
            other => return Err(RenderError::UnknownColormap(other.to_string())),
        };
        let stops = hexes.iter().filter_map(|h| Color::from_hex(h)).collect();
        Ok(Self {
            classes,
            ..Self::new(name, stops)
        })
    }

    /// Quantize into `n` discrete colors.
    pub fn with_classes(mut self, n: usize) -> Self {
        self.classes = (n >= 2).then_some(n);
        self
    }

    pub fn classes(&self) -> Option<usize> {
        self.classes
    }

    /// Color at normalized position `t` in `[0, 1]` (clamped).
    pub fn sample(&self, t: f32) -> Color {
        let mut t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        if let Some(n) = self.classes {
            let class = ((t * n as f32).floor() as usize).min(n - 1);
            t = class as f32 / (n - 1) as f32;
        }

        match self.stops.len() {
            0 => Color::transparent(),
            1 => self.stops[0],
            len => {
                let scaled = t * (len - 1) as f32;
                let lower = (scaled.floor() as usize).min(len - 2);
                interpolate_color(self.stops[lower], self.stops[lower + 1], scaled - lower as f32)
            }
        }
    }

    /// Color for `value` scaled into `range`; `None` for missing values.
    pub fn color_for(&self, value: f32, range: (f32, f32)) -> Option<Color> {
        if !value.is_finite() {
            return None;
        }
        let (min, max) = range;
        let span = max - min;
        let span = if span.abs() < f32::EPSILON { 1.0 } else { span };
        Some(self.sample((value - min) / span))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_maps_exist() {
        for name in ["Blues", "coolwarm", "RdYlGn_r", "cool"] {
            assert!(Colormap::by_name(name).is_ok(), "{}", name);
        }
        assert!(matches!(
            Colormap::by_name("jet"),
            Err(RenderError::UnknownColormap(_))
        ));
    }

    #[test]
    fn test_endpoints() {
        let blues = Colormap::by_name("Blues").unwrap();
        assert_eq!(blues.sample(0.0), Color::from_hex("#f7fbff").unwrap());
        assert_eq!(blues.sample(1.0), Color::from_hex("#08306b").unwrap());

        let cool = Colormap::by_name("cool").unwrap();
        assert_eq!(cool.sample(0.0), Color::rgb(0, 255, 255));
        assert_eq!(cool.sample(1.0), Color::rgb(255, 0, 255));
    }

    #[test]
    fn test_values_outside_range_are_clipped() {
        let blues = Colormap::by_name("Blues").unwrap();
        assert_eq!(blues.color_for(-5.0, (0.0, 50.0)), Some(blues.sample(0.0)));
        assert_eq!(blues.color_for(80.0, (0.0, 50.0)), Some(blues.sample(1.0)));
        assert_eq!(blues.color_for(f32::NAN, (0.0, 50.0)), None);
    }

    #[test]
    fn test_classes_quantize() {
        let wind = Colormap::by_name("RdYlGn_r").unwrap();
        assert_eq!(wind.classes(), Some(10));
        // Values within one tenth of the range share a class.
        assert_eq!(wind.color_for(0.5, (0.0, 40.0)), wind.color_for(3.9, (0.0, 40.0)));
        assert_ne!(wind.color_for(3.9, (0.0, 40.0)), wind.color_for(4.1, (0.0, 40.0)));
        assert_eq!(wind.sample(1.0), Color::from_hex("#a50026").unwrap());
    }

    #[test]
    fn test_interpolate_midpoint() {
        let mid = interpolate_color(Color::BLACK, Color::WHITE, 0.5);
        assert_eq!(mid, Color::rgb(128, 128, 128));
    }
}
