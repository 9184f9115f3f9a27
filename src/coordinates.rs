//! Evaluation points at which potentials are measured.

use crate::Error;

/// Evenly spaced values along one axis.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AxisRange {
    pub start: f64,
    pub step: f64,
    pub count: usize,
}

impl AxisRange {
    /// A single fixed value, used to flatten a grid onto a plane.
    #[inline]
    pub fn fixed(value: f64) -> Self {
        Self { start: value, step: 0.0, count: 1 }
    }

    #[inline]
    fn value(&self, n: usize) -> f64 {
        self.start + (n as f64) * self.step
    }
}

/// Describes a regular planar or volumetric grid.
///
/// Points are ordered with `x` varying slowest and `z` fastest.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GridDescriptor {
    pub x: AxisRange,
    pub y: AxisRange,
    pub z: AxisRange,
}

/// The ordered evaluation points, stored as separate coordinate arrays.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CoordinateSet {
    x: ndarray::Array1<f64>,
    y: ndarray::Array1<f64>,
    z: ndarray::Array1<f64>,
}

impl CoordinateSet {
    /// Creates a set from equally long coordinate arrays.
    pub fn from_arrays(
        x: ndarray::Array1<f64>,
        y: ndarray::Array1<f64>,
        z: ndarray::Array1<f64>,
    ) -> Result<Self, Error> {
        for (name, arr) in [("y", &y), ("z", &z)] {
            if arr.len() != x.len() {
                return Err(Error::BadInit {
                    array_name: name.to_string(),
                    input_length: arr.len(),
                    expected_length: x.len(),
                });
            }
        }
        Ok(Self { x, y, z })
    }

    /// Creates a set from an explicit list of points.
    pub fn from_points(points: &[[f64; 3]]) -> Self {
        Self {
            x: points.iter().map(|p| p[0]).collect(),
            y: points.iter().map(|p| p[1]).collect(),
            z: points.iter().map(|p| p[2]).collect(),
        }
    }

    /// Creates the points of a regular grid.
    pub fn grid(desc: GridDescriptor) -> Self {
        let total = desc.x.count * desc.y.count * desc.z.count;
        let mut points = Vec::with_capacity(total);
        for i in 0..desc.x.count {
            for j in 0..desc.y.count {
                for k in 0..desc.z.count {
                    points.push([desc.x.value(i), desc.y.value(j), desc.z.value(k)]);
                }
            }
        }
        Self::from_points(&points)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    #[inline]
    pub fn point(&self, index: usize) -> [f64; 3] {
        [self.x[index], self.y[index], self.z[index]]
    }

    pub fn iter(&self) -> impl Iterator<Item = [f64; 3]> + '_ {
        (0..self.len()).map(move |i| self.point(i))
    }

    #[inline]
    pub fn x(&self) -> ndarray::ArrayView1<f64> {
        self.x.view()
    }

    #[inline]
    pub fn y(&self) -> ndarray::ArrayView1<f64> {
        self.y.view()
    }

    #[inline]
    pub fn z(&self) -> ndarray::ArrayView1<f64> {
        self.z.view()
    }

    /// The subset of points at `indices`, in that order.
    pub fn select(&self, indices: &[usize]) -> Self {
        let axis = ndarray::Axis(0);
        Self {
            x: self.x.select(axis, indices),
            y: self.y.select(axis, indices),
            z: self.z.select(axis, indices),
        }
    }

    pub(crate) fn into_arrays(
        self,
    ) -> (ndarray::Array1<f64>, ndarray::Array1<f64>, ndarray::Array1<f64>) {
        (self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn xz_grid_matches_mgrid_ordering() {
        let grid = CoordinateSet::grid(GridDescriptor {
            x: AxisRange { start: -50.0, step: 10.0, count: 11 },
            y: AxisRange::fixed(0.0),
            z: AxisRange { start: -50.0, step: 10.0, count: 11 },
        });
        assert_eq!(grid.len(), 121);
        assert_eq!(grid.point(0), [-50.0, 0.0, -50.0]);
        assert_eq!(grid.point(1), [-50.0, 0.0, -40.0]);
        assert_eq!(grid.point(11), [-40.0, 0.0, -50.0]);
        assert_eq!(grid.point(120), [50.0, 0.0, 50.0]);
    }

    #[test]
    fn select_keeps_requested_order() {
        let set = CoordinateSet::from_points(&[[0.0; 3], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]]);
        let sub = set.select(&[2, 0]);
        assert_eq!(sub.x().to_vec(), vec![2.0, 0.0]);
    }

    #[test]
    fn mismatched_arrays_are_rejected() {
        let result = CoordinateSet::from_arrays(
            ndarray::arr1(&[0.0, 1.0]),
            ndarray::arr1(&[0.0]),
            ndarray::arr1(&[0.0, 1.0]),
        );
        assert!(matches!(result, Err(Error::BadInit { .. })));
    }
}
