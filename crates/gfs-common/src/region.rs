//! Fixed latitude/longitude map extents.

use serde::{Deserialize, Serialize};

/// A geographic rectangle in degrees selecting the map extent.
///
/// Bounds are normalized on construction so that `lat_min <= lat_max` and
/// `lon_min <= lon_max`, whatever order the deployment file uses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawRegion")]
pub struct Region {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

#[derive(Deserialize)]
struct RawRegion {
    lat_min: f64,
    lat_max: f64,
    lon_min: f64,
    lon_max: f64,
}

impl From<RawRegion> for Region {
    fn from(raw: RawRegion) -> Self {
        Region::new(raw.lat_min, raw.lat_max, raw.lon_min, raw.lon_max)
    }
}

impl Region {
    pub fn new(lat_a: f64, lat_b: f64, lon_a: f64, lon_b: f64) -> Self {
        Self {
            lat_min: lat_a.min(lat_b),
            lat_max: lat_a.max(lat_b),
            lon_min: lon_a.min(lon_b),
            lon_max: lon_a.max(lon_b),
        }
    }

    /// Whole-Indonesia view: 90E to 150E, 15S to 15N.
    pub fn indonesia() -> Self {
        Self::new(-15.0, 15.0, 90.0, 150.0)
    }

    /// Width in degrees of longitude.
    pub fn width(&self) -> f64 {
        self.lon_max - self.lon_min
    }

    /// Height in degrees of latitude.
    pub fn height(&self) -> f64 {
        self.lat_max - self.lat_min
    }

    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.lat_min && lat <= self.lat_max && lon >= self.lon_min && lon <= self.lon_max
    }

    /// Shift longitudes into `[0, 360)` for grids stored on that convention.
    ///
    /// Regions that would straddle the 0/360 seam after shifting are left as-is.
    pub fn to_0_360(&self) -> Self {
        if self.lon_min >= 0.0 {
            return *self;
        }
        if self.lon_max < 0.0 {
            return Self {
                lon_min: self.lon_min + 360.0,
                lon_max: self.lon_max + 360.0,
                ..*self
            };
        }
        *self
    }
}
