//! Coordinate axes, grid fields and display fields.

use std::ops::Range;

use gfs_common::{DrawMode, Parameter};

/// Tolerance for comparing coordinates against region bounds.
const COORD_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisOrder {
    Ascending,
    Descending,
}

/// A monotonic coordinate axis with its detected order.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    values: Vec<f64>,
    order: AxisOrder,
}

impl Axis {
    /// Build an axis, detecting its order from the first and last values.
    ///
    /// Returns `None` for non-monotonic axes.
    pub fn new(values: Vec<f64>) -> Option<Self> {
        let order = match (values.first(), values.last()) {
            (Some(first), Some(last)) if last < first => AxisOrder::Descending,
            _ => AxisOrder::Ascending,
        };
        let monotonic = values.windows(2).all(|w| match order {
            AxisOrder::Ascending => w[1] > w[0],
            AxisOrder::Descending => w[1] < w[0],
        });
        monotonic.then_some(Self { values, order })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn order(&self) -> AxisOrder {
        self.order
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Smallest and largest coordinate.
    pub fn extent(&self) -> Option<(f64, f64)> {
        let first = *self.values.first()?;
        let last = *self.values.last()?;
        Some((first.min(last), first.max(last)))
    }

    /// Contiguous index range of values within `[lo, hi]`, in stored order.
    ///
    /// The range is empty when no coordinate falls inside the bounds.
    pub fn index_range(&self, lo: f64, hi: f64) -> Range<usize> {
        let (lo, hi) = (lo.min(hi) - COORD_EPSILON, lo.max(hi) + COORD_EPSILON);
        let inside = |v: &f64| *v >= lo && *v <= hi;
        match self.values.iter().position(inside) {
            Some(start) => {
                let len = self.values[start..].iter().take_while(|v| inside(v)).count();
                start..start + len
            }
            None => 0..0,
        }
    }
}

/// A 2-D latitude × longitude field in row-major order.
///
/// Rows follow `lats`, columns follow `lons`, both in stored axis order.
/// Missing values are `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub struct GridField {
    pub data: Vec<f32>,
    pub lats: Vec<f64>,
    pub lons: Vec<f64>,
}

impl GridField {
    pub fn new(data: Vec<f32>, lats: Vec<f64>, lons: Vec<f64>) -> Self {
        debug_assert_eq!(data.len(), lats.len() * lons.len());
        Self { data, lats, lons }
    }

    pub fn width(&self) -> usize {
        self.lons.len()
    }

    pub fn height(&self) -> usize {
        self.lats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.height() || col >= self.width() {
            return None;
        }
        self.data.get(row * self.width() + col).copied()
    }

    /// Apply `f` to every value; `NaN` stays `NaN`.
    pub fn map(&self, f: impl Fn(f32) -> f32) -> Self {
        Self {
            data: self
                .data
                .iter()
                .map(|&v| if v.is_nan() { v } else { f(v) })
                .collect(),
            lats: self.lats.clone(),
            lons: self.lons.clone(),
        }
    }

    /// Minimum and maximum over finite values.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        self.data
            .iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Sub-field for the given row and column index ranges.
    pub fn window(&self, rows: Range<usize>, cols: Range<usize>) -> Self {
        let width = self.width();
        let mut data = Vec::with_capacity(rows.len() * cols.len());
        for row in rows.clone() {
            let start = row * width;
            data.extend_from_slice(&self.data[start + cols.start..start + cols.end]);
        }
        Self {
            data,
            lats: self.lats[rows].to_vec(),
            lons: self.lons[cols].to_vec(),
        }
    }
}

/// Wind components retained alongside the speed field, in m/s.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorComponents {
    pub u: GridField,
    pub v: GridField,
}

/// A field ready for drawing, with its presentation metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayField {
    pub parameter: Parameter,
    pub field: GridField,
    pub label: String,
    pub colormap: String,
    pub value_range: (f32, f32),
    pub draw_mode: DrawMode,
    pub vectors: Option<VectorComponents>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_order_detection() {
        let asc = Axis::new(vec![-1.0, 0.0, 1.0]).unwrap();
        assert_eq!(asc.order(), AxisOrder::Ascending);
        let desc = Axis::new(vec![1.0, 0.0, -1.0]).unwrap();
        assert_eq!(desc.order(), AxisOrder::Descending);
        assert!(Axis::new(vec![0.0, 1.0, 0.5]).is_none());
    }

    #[test]
    fn test_index_range_both_orders() {
        let asc = Axis::new((0..9).map(|i| -2.0 + i as f64 * 0.5).collect()).unwrap();
        // -2.0 .. 2.0 step 0.5; [-1, 1] covers indices 2..7
        assert_eq!(asc.index_range(-1.0, 1.0), 2..7);

        let desc = Axis::new((0..9).map(|i| 2.0 - i as f64 * 0.5).collect()).unwrap();
        assert_eq!(desc.index_range(1.0, -1.0), 2..7);
        assert_eq!(desc.index_range(10.0, 20.0), 0..0);
    }

    #[test]
    fn test_map_keeps_nan() {
        let field = GridField::new(vec![1.0, f32::NAN], vec![0.0], vec![0.0, 1.0]);
        let mapped = field.map(|v| v * 2.0);
        assert_eq!(mapped.data[0], 2.0);
        assert!(mapped.data[1].is_nan());
        assert_eq!(mapped.min_max(), Some((2.0, 2.0)));
    }

    #[test]
    fn test_window() {
        let field = GridField::new(
            (0..12).map(|v| v as f32).collect(),
            vec![0.0, 1.0, 2.0],
            vec![10.0, 11.0, 12.0, 13.0],
        );
        let sub = field.window(1..3, 1..3);
        assert_eq!(sub.data, vec![5.0, 6.0, 9.0, 10.0]);
        assert_eq!(sub.lats, vec![1.0, 2.0]);
        assert_eq!(sub.lons, vec![11.0, 12.0]);
    }
}
