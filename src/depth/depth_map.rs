use std::marker::PhantomData;

use ndarray::{Array2, ArrayView2};

use crate::error::NavError;

/// Unit marker for unnormalized depth-model output. Monotonic with
/// distance but unit-less.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relative;

/// Unit marker for calibrated depth in meters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Meters;

/// Row-major `height x width` grid of depth values tagged with their unit.
///
/// The unit parameter keeps relative and metric maps from being mixed:
/// fusion only accepts [`AbsoluteDepthMap`].
#[derive(Debug, Clone, PartialEq)]
pub struct DepthMap<U> {
    values: Array2<f32>,
    _unit: PhantomData<U>,
}

pub type RelativeDepthMap = DepthMap<Relative>;
pub type AbsoluteDepthMap = DepthMap<Meters>;

impl<U> DepthMap<U> {
    /// Wrap an existing `(height, width)` array.
    pub fn from_array(values: Array2<f32>) -> Self {
        Self {
            values,
            _unit: PhantomData,
        }
    }

    /// Build from a flat row-major buffer.
    pub fn from_vec(height: usize, width: usize, values: Vec<f32>) -> Result<Self, NavError> {
        let len = values.len();
        let values = Array2::from_shape_vec((height, width), values).map_err(|_| {
            NavError::MalformedTensor {
                expected: (height, width),
                got: (1, len),
            }
        })?;
        Ok(Self::from_array(values))
    }

    /// Zero-filled map, the neutral result of a failed calibration.
    pub fn zeros(height: usize, width: usize) -> Self {
        Self::from_array(Array2::zeros((height, width)))
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.values.ncols()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.values.nrows()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at column `x`, row `y`.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        self.values.get((y, x)).copied()
    }

    pub fn view(&self) -> ArrayView2<'_, f32> {
        self.values.view()
    }

    pub fn into_inner(self) -> Array2<f32> {
        self.values
    }

    /// Largest value in the map, `None` when empty.
    pub fn max_value(&self) -> Option<f32> {
        self.values.iter().copied().reduce(f32::max)
    }
}

impl RelativeDepthMap {
    /// Nearest-neighbour resample into a `size x size` grid.
    ///
    /// Output cell `(x, y)` reads source cell `(x * width / size, y * height / size)`.
    pub fn resample(&self, size: usize) -> Self {
        if self.is_empty() || size == 0 {
            return Self::zeros(size, size);
        }
        let (height, width) = (self.height(), self.width());
        let values =
            Array2::from_shape_fn((size, size), |(y, x)| {
                self.values[[y * height / size, x * width / size]]
            });
        Self::from_array(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_from_vec_shape() {
        let map = RelativeDepthMap::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(map.width(), 3);
        assert_eq!(map.height(), 2);
        assert_eq!(map.get(2, 1), Some(6.0));
        assert_eq!(map.get(3, 0), None);
    }

    #[test]
    fn test_from_vec_wrong_length() {
        let err = AbsoluteDepthMap::from_vec(2, 2, vec![1.0; 3]).unwrap_err();
        assert!(matches!(
            err,
            NavError::MalformedTensor {
                expected: (2, 2),
                got: (1, 3)
            }
        ));
    }

    #[test]
    fn test_max_value() {
        let map = RelativeDepthMap::from_array(array![[1.0, -2.0], [7.5, 3.0]]);
        assert_eq!(map.max_value(), Some(7.5));
        assert_eq!(RelativeDepthMap::zeros(0, 0).max_value(), None);
    }

    #[test]
    fn test_resample_nearest() {
        let map = RelativeDepthMap::from_array(Array2::from_shape_fn((4, 4), |(y, x)| {
            (y * 4 + x) as f32
        }));
        let small = map.resample(2);
        assert_eq!(small.view(), array![[0.0, 2.0], [8.0, 10.0]].view());
    }
}
