//! Assembling gathered partial results into one result on the root.

use std::collections::HashSet;

use crate::coordinates::CoordinateSet;
use crate::gather::PartialResult;
use crate::Error;

/// Row order of a `MergedResult`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum MergeOrder {
    /// Root's own points first, then each received partial result in the order it arrived.
    /// Depends on message timing whenever there are more than two workers.
    Arrival,
    /// Sorted by original point index, identical to a single worker run.
    #[default]
    Canonical,
}

/// Concatenates partial results along the point axis.
#[derive(Clone, Debug)]
pub struct ResultMerger {
    order: MergeOrder,
    times: ndarray::Array1<f64>,
}

impl ResultMerger {
    /// Creates a merger for traces sampled at `times`.
    pub fn new(order: MergeOrder, times: ndarray::Array1<f64>) -> Self {
        Self { order, times }
    }

    /// Merges the root's `local` result with `received`, given in arrival order.
    ///
    /// Every partial result must have one potential row and one coordinate per index, one
    /// potential column per sample time, and no index may appear twice.
    pub fn merge(
        &self,
        local: PartialResult,
        received: Vec<PartialResult>,
    ) -> Result<MergedResult, Error> {
        let ntimes = self.times.len();
        let parts: Vec<PartialResult> = std::iter::once(local).chain(received).collect();
        let mut seen = HashSet::new();
        for part in parts.iter() {
            check_shape(part, ntimes)?;
            for &index in part.indices.iter() {
                if !seen.insert(index) {
                    return Err(Error::DuplicateIndex { from: part.rank, index });
                }
            }
        }

        let total: usize = parts.iter().map(|p| p.len()).sum();
        let mut indices = Vec::with_capacity(total);
        let mut x: Vec<f64> = Vec::with_capacity(total);
        let mut y: Vec<f64> = Vec::with_capacity(total);
        let mut z: Vec<f64> = Vec::with_capacity(total);
        let mut potentials = ndarray::Array2::<f64>::zeros((total, ntimes));
        let mut offset = 0;
        for part in parts {
            let n = part.len();
            indices.extend_from_slice(&part.indices);
            x.extend(part.x.iter().copied());
            y.extend(part.y.iter().copied());
            z.extend(part.z.iter().copied());
            potentials
                .slice_mut(ndarray::s![offset..(offset + n), ..])
                .assign(&part.potentials);
            offset += n;
        }

        let mut merged = MergedResult {
            indices,
            points: CoordinateSet::from_arrays(x.into(), y.into(), z.into())?,
            potentials,
            times: self.times.clone(),
        };
        if self.order == MergeOrder::Canonical {
            merged.sort_by_index();
        }

        log::debug!("merged {} points in {:?} order", merged.len(), self.order);
        Ok(merged)
    }
}

fn check_shape(part: &PartialResult, ntimes: usize) -> Result<(), Error> {
    if part.potentials.ncols() != ntimes {
        return Err(Error::UnexpectedMessage {
            from: part.rank,
            found: part.potentials.ncols(),
            expected: ntimes,
        });
    }
    let n = part.indices.len();
    for (field, found) in [
        ("x", part.x.len()),
        ("y", part.y.len()),
        ("z", part.z.len()),
        ("potential", part.potentials.nrows()),
    ] {
        if found != n {
            return Err(Error::MalformedResult { from: part.rank, field, found, expected: n });
        }
    }
    Ok(())
}

/// The potential trace of every evaluation point, available on the root only.
#[derive(Clone, Debug)]
pub struct MergedResult {
    indices: Vec<usize>,
    points: CoordinateSet,
    potentials: ndarray::Array2<f64>,
    times: ndarray::Array1<f64>,
}

impl MergedResult {
    fn sort_by_index(&mut self) {
        let mut perm: Vec<usize> = (0..self.indices.len()).collect();
        perm.sort_by_key(|&row| self.indices[row]);
        self.indices = perm.iter().map(|&row| self.indices[row]).collect();
        self.points = self.points.select(&perm);
        self.potentials = self.potentials.select(ndarray::Axis(0), &perm);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Original point index of each row.
    #[inline]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    #[inline]
    pub fn points(&self) -> &CoordinateSet {
        &self.points
    }

    /// Potentials, one row per point and one column per sample time.
    #[inline]
    pub fn potentials(&self) -> ndarray::ArrayView2<f64> {
        self.potentials.view()
    }

    #[inline]
    pub fn times(&self) -> ndarray::ArrayView1<f64> {
        self.times.view()
    }

    /// The trace of the point with original index `index`.
    pub fn trace(&self, index: usize) -> Option<ndarray::ArrayView1<f64>> {
        self.indices
            .iter()
            .position(|&i| i == index)
            .map(|row| self.potentials.row(row))
    }

    /// The trace of the point at exactly `point`.
    pub fn trace_at(&self, point: [f64; 3]) -> Option<ndarray::ArrayView1<f64>> {
        self.points
            .iter()
            .position(|p| p == point)
            .map(|row| self.potentials.row(row))
    }

    /// Iterates over `(original index, point, trace)` in row order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, [f64; 3], ndarray::ArrayView1<f64>)> + '_ {
        self.indices
            .iter()
            .zip(self.points.iter())
            .zip(self.potentials.rows())
            .map(|((&i, p), trace)| (i, p, trace))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn part(rank: usize, indices: &[usize]) -> PartialResult {
        let points: Vec<[f64; 3]> = indices.iter().map(|&i| [i as f64, 0.0, 0.0]).collect();
        let potentials = ndarray::Array2::from_shape_fn((indices.len(), 2), |(row, t)| {
            (indices[row] * 10 + t) as f64
        });
        PartialResult::new(rank, indices.to_vec(), CoordinateSet::from_points(&points), potentials)
    }

    fn times() -> ndarray::Array1<f64> {
        ndarray::arr1(&[0.0, 0.5])
    }

    #[test]
    fn arrival_order_concatenates() {
        let merger = ResultMerger::new(MergeOrder::Arrival, times());
        let merged = merger
            .merge(part(0, &[0, 3]), vec![part(2, &[2]), part(1, &[1, 4])])
            .unwrap();
        assert_eq!(merged.indices(), &[0, 3, 2, 1, 4]);
        assert_eq!(merged.points().x().to_vec(), vec![0.0, 3.0, 2.0, 1.0, 4.0]);
        assert_eq!(merged.potentials().row(2).to_vec(), vec![20.0, 21.0]);
    }

    #[test]
    fn canonical_order_restores_indices() {
        let merger = ResultMerger::new(MergeOrder::Canonical, times());
        let merged = merger
            .merge(part(0, &[0, 3]), vec![part(2, &[2]), part(1, &[1, 4])])
            .unwrap();
        assert_eq!(merged.indices(), &[0, 1, 2, 3, 4]);
        for (i, p, trace) in merged.iter() {
            assert_eq!(p[0], i as f64);
            assert_eq!(trace[1], (i * 10 + 1) as f64);
        }
        assert_eq!(merged.trace(4).unwrap().to_vec(), vec![40.0, 41.0]);
        assert_eq!(merged.trace_at([3.0, 0.0, 0.0]).unwrap()[0], 30.0);
        assert!(merged.trace(5).is_none());
    }

    #[test]
    fn mismatched_timesteps_are_rejected() {
        let merger = ResultMerger::new(MergeOrder::Arrival, ndarray::arr1(&[0.0, 0.5, 1.0]));
        let result = merger.merge(part(0, &[0]), vec![]);
        assert!(matches!(
            result,
            Err(Error::UnexpectedMessage { from: 0, found: 2, expected: 3 })
        ));
    }

    #[test]
    fn rows_disagreeing_with_indices_are_rejected() {
        let merger = ResultMerger::new(MergeOrder::Canonical, times());
        let mut bad = part(1, &[1, 2]);
        bad.indices = vec![1];
        let result = merger.merge(part(0, &[0]), vec![bad]);
        assert!(matches!(
            result,
            Err(Error::MalformedResult { from: 1, field: "x", found: 2, expected: 1 })
        ));

        let mut bad = part(1, &[1]);
        bad.potentials = ndarray::Array2::zeros((2, 2));
        let result = merger.merge(part(0, &[0]), vec![bad]);
        assert!(matches!(
            result,
            Err(Error::MalformedResult { from: 1, field: "potential", found: 2, expected: 1 })
        ));
    }

    #[test]
    fn duplicate_indices_are_rejected() {
        let merger = ResultMerger::new(MergeOrder::Arrival, times());
        let result = merger.merge(part(0, &[0, 2]), vec![part(1, &[1, 2])]);
        assert!(matches!(result, Err(Error::DuplicateIndex { from: 1, index: 2 })));
    }
}
