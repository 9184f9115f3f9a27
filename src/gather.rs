//! Computing local potentials and gathering them onto the root worker.

use indicatif::ProgressBar;

use crate::comm::{Communicator, Role, ROOT};
use crate::coordinates::CoordinateSet;
use crate::merge::{MergeOrder, MergedResult, ResultMerger};
use crate::morphology::Morphology;
use crate::partition::{Partition, Partitioner};
use crate::{ComputeDescriptor, Error, Solver};

/// One worker's potentials, as sent to the root.
#[derive(Clone, Debug, PartialEq)]
pub struct PartialResult {
    /// Rank of the worker that computed this result.
    pub rank: usize,
    /// Original index of each point.
    pub indices: Vec<usize>,
    pub x: ndarray::Array1<f64>,
    pub y: ndarray::Array1<f64>,
    pub z: ndarray::Array1<f64>,
    /// One row per point and one column per timestep.
    pub potentials: ndarray::Array2<f64>,
}

impl PartialResult {
    pub fn new(
        rank: usize,
        indices: Vec<usize>,
        points: CoordinateSet,
        potentials: ndarray::Array2<f64>,
    ) -> Self {
        let (x, y, z) = points.into_arrays();
        Self { rank, indices, x, y, z, potentials }
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

/// Progress of a worker through a gather.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GatherState {
    Idle,
    /// Evaluating the local partition.
    Computing,
    /// Sending the partial result to the root (workers only).
    Sending,
    /// Receiving every worker's partial result (root only).
    Collecting,
    /// Waiting at the closing barrier.
    Synchronized,
    /// Assembling the merged result (root only).
    Merging,
    Done,
}

/// What a gather leaves behind on each member.
#[derive(Debug)]
pub enum GatherOutcome {
    Root(MergedResult),
    Worker,
}

impl GatherOutcome {
    #[inline]
    pub fn is_root(&self) -> bool {
        matches!(self, GatherOutcome::Root(_))
    }

    #[inline]
    pub fn into_merged(self) -> Option<MergedResult> {
        match self {
            GatherOutcome::Root(merged) => Some(merged),
            GatherOutcome::Worker => None,
        }
    }
}

/// Inputs to a single gather.
pub struct GatherDescriptor<'a, S: Solver> {
    pub solver: &'a S,
    pub morphology: &'a Morphology,
    /// Every evaluation point, identical on all members.
    pub points: &'a CoordinateSet,
    pub merge_order: MergeOrder,
    pub bar: &'a Option<ProgressBar>,
}

/// Runs the compute, send or collect, barrier and merge steps for one member of a group.
pub struct GatherProtocol<'c, C> {
    comm: &'c C,
    partition: Partition,
    state: GatherState,
    history: Vec<GatherState>,
}

impl<'c, C: Communicator<PartialResult>> GatherProtocol<'c, C> {
    /// Prepares a gather of `npoints` points, split across the group by `partitioner`.
    pub fn new<P: Partitioner>(comm: &'c C, partitioner: &P, npoints: usize) -> Self {
        let partition = partitioner.partition(comm.rank(), comm.size(), npoints);
        if partition.is_empty() {
            log::warn!(
                "rank {} received no evaluation points ({} points, {} workers)",
                comm.rank(),
                npoints,
                comm.size(),
            );
        }
        Self {
            comm,
            partition,
            state: GatherState::Idle,
            history: vec![GatherState::Idle],
        }
    }

    /// The points this member evaluates.
    #[inline]
    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    #[inline]
    pub fn state(&self) -> GatherState {
        self.state
    }

    /// Every state visited so far, in order.
    #[inline]
    pub fn history(&self) -> &[GatherState] {
        &self.history
    }

    fn transition(&mut self, next: GatherState) {
        log::debug!("rank {}: {:?} -> {:?}", self.comm.rank(), self.state, next);
        self.state = next;
        self.history.push(next);
    }

    /// Runs the gather to completion.
    ///
    /// An error while computing is returned before anything is sent, which leaves the root
    /// waiting until its timeout.
    pub fn run<S: Solver>(&mut self, desc: GatherDescriptor<S>) -> Result<GatherOutcome, Error> {
        let rank = self.comm.rank();
        let size = self.comm.size();

        self.transition(GatherState::Computing);
        let indices = self.partition.indices().to_vec();
        let local_points = desc.points.select(&indices);
        let potentials = desc.solver.compute(ComputeDescriptor {
            morphology: desc.morphology,
            points: &local_points,
            indices: &indices,
            bar: desc.bar,
        })?;
        let local = PartialResult::new(rank, indices, local_points, potentials);

        match self.comm.role() {
            Role::Worker => {
                self.transition(GatherState::Sending);
                self.comm.send(ROOT, local)?;

                self.transition(GatherState::Synchronized);
                self.comm.barrier()?;

                self.transition(GatherState::Done);
                Ok(GatherOutcome::Worker)
            }
            Role::Root => {
                self.transition(GatherState::Collecting);
                let mut received = Vec::with_capacity(size.saturating_sub(1));
                for _ in 1..size {
                    let (from, partial) = self.comm.receive_any()?;
                    log::debug!("rank {}: received {} points from rank {}", rank, partial.len(), from);
                    received.push(partial);
                }

                self.transition(GatherState::Synchronized);
                self.comm.barrier()?;

                self.transition(GatherState::Merging);
                let merger = ResultMerger::new(desc.merge_order, desc.morphology.times());
                let merged = merger.merge(local, received)?;

                self.transition(GatherState::Done);
                Ok(GatherOutcome::Root(merged))
            }
        }
    }
}
