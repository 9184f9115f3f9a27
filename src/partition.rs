//! Splitting the evaluation point indices across a worker group.

/// The indices of the evaluation points owned by one worker.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Partition {
    indices: Vec<usize>,
}

impl Partition {
    #[inline]
    pub fn new(indices: Vec<usize>) -> Self {
        Self { indices }
    }

    #[inline]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Assigns point indices to workers.
///
/// Implementations must be pure functions of their arguments: across all ranks of a group, the
/// returned partitions are disjoint and together cover `0..npoints` exactly once.
pub trait Partitioner {
    fn partition(&self, rank: usize, size: usize, npoints: usize) -> Partition;
}

/// Strided assignment: worker `r` owns every index `i` with `i % size == r`.
#[derive(Copy, Clone, Debug, Default)]
pub struct RoundRobin;

impl Partitioner for RoundRobin {
    fn partition(&self, rank: usize, size: usize, npoints: usize) -> Partition {
        Partition::new((rank..npoints).step_by(size.max(1)).collect())
    }
}

/// Block assignment: each worker owns one contiguous range, the first `npoints % size` workers
/// holding one extra index.
#[derive(Copy, Clone, Debug, Default)]
pub struct Contiguous;

impl Partitioner for Contiguous {
    fn partition(&self, rank: usize, size: usize, npoints: usize) -> Partition {
        let size = size.max(1);
        let base = npoints / size;
        let rem = npoints % size;
        let start = rank * base + rank.min(rem);
        let len = base + usize::from(rank < rem);
        Partition::new((start..(start + len).min(npoints)).collect())
    }
}
