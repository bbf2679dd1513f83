//! Displayable forecast parameters.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ViewerError;

/// How a display field is drawn on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DrawMode {
    /// Continuous color mesh with a color bar.
    Filled,
    /// Labeled contour lines in a single color.
    Contour,
    /// Color mesh plus subsampled vector arrows.
    FilledVector,
}

/// The closed set of parameters the viewer can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parameter {
    Rainfall,
    Temperature,
    Wind,
    Pressure,
}

impl Parameter {
    /// Match order for selector strings; the first rule whose key appears wins.
    const MATCH_ORDER: [Parameter; 4] = [
        Parameter::Rainfall,
        Parameter::Temperature,
        Parameter::Wind,
        Parameter::Pressure,
    ];

    pub fn all() -> &'static [Parameter] {
        &Self::MATCH_ORDER
    }

    /// Resolve a selector value by substring, e.g. `"Surface Temperature (tmp2m)"`.
    pub fn from_selector(selector: &str) -> Result<Self, ViewerError> {
        let lowered = selector.to_ascii_lowercase();
        Self::MATCH_ORDER
            .iter()
            .copied()
            .find(|p| lowered.contains(p.key()))
            .ok_or_else(|| ViewerError::UnrecognizedParameter(selector.to_string()))
    }

    /// Short key used in selector matching and download file names.
    pub fn key(&self) -> &'static str {
        match self {
            Parameter::Rainfall => "pratesfc",
            Parameter::Temperature => "tmp2m",
            Parameter::Wind => "ugrd10m",
            Parameter::Pressure => "prmsl",
        }
    }

    /// Selector text shown in the parameter dropdown.
    pub fn selector_label(&self) -> &'static str {
        match self {
            Parameter::Rainfall => "Hourly Rainfall (pratesfc)",
            Parameter::Temperature => "Surface Temperature (tmp2m)",
            Parameter::Wind => "Surface Wind (ugrd10m & vgrd10m)",
            Parameter::Pressure => "Mean Sea Level Pressure (prmslmsl)",
        }
    }

    /// Dataset variables read to build this parameter.
    pub fn source_fields(&self) -> &'static [&'static str] {
        match self {
            Parameter::Rainfall => &["pratesfc"],
            Parameter::Temperature => &["tmp2m"],
            Parameter::Wind => &["ugrd10m", "vgrd10m"],
            Parameter::Pressure => &["prmslmsl"],
        }
    }

    pub fn display_label(&self) -> &'static str {
        match self {
            Parameter::Rainfall => "Rainfall (mm/hr)",
            Parameter::Temperature => "Temperature (°C)",
            Parameter::Wind => "Wind Speed (kt)",
            Parameter::Pressure => "MSLP (hPa)",
        }
    }

    pub fn draw_mode(&self) -> DrawMode {
        match self {
            Parameter::Rainfall | Parameter::Temperature => DrawMode::Filled,
            Parameter::Wind => DrawMode::FilledVector,
            Parameter::Pressure => DrawMode::Contour,
        }
    }

    /// Colormap identifier.
    pub fn colormap(&self) -> &'static str {
        match self {
            Parameter::Rainfall => "Blues",
            Parameter::Temperature => "coolwarm",
            Parameter::Wind => "RdYlGn_r",
            Parameter::Pressure => "cool",
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_selector_substring() {
        assert_eq!(Parameter::from_selector("Curah Hujan per jam (pratesfc)").unwrap(), Parameter::Rainfall);
        assert_eq!(Parameter::from_selector("tmp2m").unwrap(), Parameter::Temperature);
        assert_eq!(
            Parameter::from_selector("Angin Permukaan (ugrd10m & vgrd10m)").unwrap(),
            Parameter::Wind
        );
        assert_eq!(
            Parameter::from_selector("Tekanan Permukaan Laut (prmslmsl)").unwrap(),
            Parameter::Pressure
        );
    }

    #[test]
    fn test_selector_labels_round_trip() {
        for param in Parameter::all() {
            assert_eq!(Parameter::from_selector(param.selector_label()).unwrap(), *param);
        }
    }

    #[test]
    fn test_unrecognized() {
        let err = Parameter::from_selector("foobar").unwrap_err();
        assert!(matches!(err, ViewerError::UnrecognizedParameter(ref s) if s == "foobar"));
    }

    #[test]
    fn test_draw_modes() {
        assert_eq!(Parameter::Rainfall.draw_mode(), DrawMode::Filled);
        assert_eq!(Parameter::Wind.draw_mode(), DrawMode::FilledVector);
        assert_eq!(Parameter::Pressure.draw_mode(), DrawMode::Contour);
    }
}
