//! Regional clipping.
//!
//! Index windows are derived from coordinate values, so a region selects
//! the same cells whether the latitude axis is stored north-to-south or
//! south-to-north. Clipped fields keep the stored axis order.

use std::ops::Range;

use gfs_common::Region;

use crate::error::{DatasetError, Result};
use crate::field::{Axis, DisplayField, GridField, VectorComponents};

/// Row and column index ranges into a grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    pub lat: Range<usize>,
    pub lon: Range<usize>,
}

impl Window {
    /// Number of cells covered.
    pub fn len(&self) -> usize {
        self.lat.len() * self.lon.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lat.is_empty() || self.lon.is_empty()
    }
}

/// Express the region in the longitude convention of `lon`.
fn align_longitudes(region: &Region, lon: &Axis) -> Region {
    match lon.extent() {
        Some((_, max)) if max > 180.0 => region.to_0_360(),
        _ => *region,
    }
}

/// Compute the index window selecting `region` on the given axes.
pub fn window_for(lat: &Axis, lon: &Axis, region: &Region) -> Result<Window> {
    let region = align_longitudes(region, lon);
    let window = Window {
        lat: lat.index_range(region.lat_min, region.lat_max),
        lon: lon.index_range(region.lon_min, region.lon_max),
    };

    if window.is_empty() {
        return Err(DatasetError::EmptyRegion(format!(
            "lat {}..{} lon {}..{} against grid lat {:?} lon {:?}",
            region.lat_min,
            region.lat_max,
            region.lon_min,
            region.lon_max,
            lat.extent(),
            lon.extent()
        )));
    }
    Ok(window)
}

fn field_axes(field: &GridField) -> Result<(Axis, Axis)> {
    let lat = Axis::new(field.lats.clone())
        .ok_or_else(|| DatasetError::invalid_metadata("latitude axis is not monotonic"))?;
    let lon = Axis::new(field.lons.clone())
        .ok_or_else(|| DatasetError::invalid_metadata("longitude axis is not monotonic"))?;
    Ok((lat, lon))
}

/// Subset an in-memory field to `region`.
pub fn clip(field: &GridField, region: &Region) -> Result<GridField> {
    let (lat, lon) = field_axes(field)?;
    let window = window_for(&lat, &lon, region)?;
    Ok(field.window(window.lat, window.lon))
}

/// Subset a display field and its vector components with the same window.
pub fn clip_display(display: &DisplayField, region: &Region) -> Result<DisplayField> {
    let (lat, lon) = field_axes(&display.field)?;
    let window = window_for(&lat, &lon, region)?;

    let sub = |f: &GridField| f.window(window.lat.clone(), window.lon.clone());
    Ok(DisplayField {
        field: sub(&display.field),
        vectors: display.vectors.as_ref().map(|vc| VectorComponents {
            u: sub(&vc.u),
            v: sub(&vc.v),
        }),
        ..display.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(lats: Vec<f64>, lons: Vec<f64>) -> GridField {
        let data = (0..lats.len() * lons.len()).map(|v| v as f32).collect();
        GridField::new(data, lats, lons)
    }

    #[test]
    fn test_clip_bounds_within_region() {
        let field = grid(
            (0..41).map(|i| -10.0 + i as f64 * 0.5).collect(),
            (0..81).map(|i| 90.0 + i as f64 * 0.5).collect(),
        );
        let region = Region::new(-9.0, -6.5, 110.8, 114.8);
        let clipped = clip(&field, &region).unwrap();

        assert!(!clipped.is_empty());
        assert!(clipped.lats.iter().all(|&l| (-9.0..=-6.5).contains(&l)));
        assert!(clipped.lons.iter().all(|&l| (110.8..=114.8).contains(&l)));
        assert_eq!(clipped.lats.first(), Some(&-9.0));
        assert_eq!(clipped.lons.first(), Some(&111.0));
        assert_eq!(clipped.lons.last(), Some(&114.5));
    }

    #[test]
    fn test_negative_longitudes_on_0_360_grid() {
        let field = grid(vec![0.0, 1.0], (0..360).map(|i| i as f64).collect());
        let clipped = clip(&field, &Region::new(0.0, 1.0, -20.0, -10.0)).unwrap();
        assert_eq!(clipped.lons.first(), Some(&340.0));
        assert_eq!(clipped.lons.last(), Some(&350.0));
    }

    #[test]
    fn test_region_outside_grid_is_empty() {
        let field = grid(vec![0.0, 1.0], vec![100.0, 101.0]);
        let err = clip(&field, &Region::new(40.0, 50.0, 100.0, 101.0)).unwrap_err();
        assert!(matches!(err, DatasetError::EmptyRegion(_)));
    }
}
