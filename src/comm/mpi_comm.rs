//! Worker groups spanning the processes of an MPI communicator.
//!
//! A partial result travels as four tagged messages from the same source: a header holding the
//! potential shape, the point indices, the `x`, `y` and `z` coordinates back to back under one
//! tag, and the potentials in row-major order. MPI keeps messages between one pair of processes
//! in order, so the root only has to probe for a header and then drain that sender.

use std::time::{Duration, Instant};

use mpi::topology::SimpleCommunicator;
use mpi::traits::{Communicator as _, CommunicatorCollectives, Destination, Source};
use mpi::Tag;

use crate::comm::Communicator;
use crate::gather::PartialResult;
use crate::Error;

const HEADER: Tag = 11;
const INDICES: Tag = 12;
const COORDINATES: Tag = 13;
const POTENTIALS: Tag = 14;

/// Pause between probes while the root waits for a header.
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// A group member backed by an MPI communicator, one member per process.
///
/// Receives are bounded by the timeout. The closing barrier is a plain `MPI_Barrier` and is not,
/// so a member that returns an error should abort the job rather than leave its peers waiting.
pub struct MpiComm {
    world: SimpleCommunicator,
    rank: usize,
    size: usize,
    timeout: Option<Duration>,
}

impl MpiComm {
    /// Wraps `world`. `timeout` bounds each receive; `None` waits indefinitely.
    pub fn new(world: SimpleCommunicator, timeout: Option<Duration>) -> Self {
        let rank = world.rank() as usize;
        let size = world.size() as usize;
        Self { world, rank, size, timeout }
    }

    #[inline]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    #[inline]
    pub fn world(&self) -> &SimpleCommunicator {
        &self.world
    }

    /// Blocks until some member has sent a header, returning that member's rank.
    fn probe_header(&self) -> Result<i32, Error> {
        let deadline = self.timeout.map(|timeout| Instant::now() + timeout);
        loop {
            if let Some(status) = self.world.any_process().immediate_probe_with_tag(HEADER) {
                return Ok(status.source_rank());
            }
            if deadline.map_or(false, |deadline| Instant::now() >= deadline) {
                return Err(Error::CommunicationStall {
                    rank: self.rank,
                    phase: "collecting",
                });
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Communicator<PartialResult> for MpiComm {
    #[inline]
    fn rank(&self) -> usize {
        self.rank
    }

    #[inline]
    fn size(&self) -> usize {
        self.size
    }

    fn send(&self, dest: usize, msg: PartialResult) -> Result<(), Error> {
        if dest >= self.size {
            return Err(Error::InvalidGroup { rank: dest, size: self.size });
        }
        let process = self.world.process_at_rank(dest as i32);

        let (nrows, ncols) = msg.potentials.dim();
        let coordinates: Vec<f64> = msg.x.iter().chain(msg.y.iter()).chain(msg.z.iter()).copied().collect();
        let potentials: Vec<f64> = msg.potentials.iter().copied().collect();

        process.send_with_tag(&[nrows, ncols, msg.x.len(), msg.y.len()][..], HEADER);
        process.send_with_tag(&msg.indices[..], INDICES);
        process.send_with_tag(&coordinates[..], COORDINATES);
        process.send_with_tag(&potentials[..], POTENTIALS);
        Ok(())
    }

    fn receive_any(&self) -> Result<(usize, PartialResult), Error> {
        let source = self.probe_header()?;
        let process = self.world.process_at_rank(source);
        let (header, _) = process.receive_vec_with_tag::<usize>(HEADER);
        let (indices, _) = process.receive_vec_with_tag::<usize>(INDICES);
        let (mut coordinates, _) = process.receive_vec_with_tag::<f64>(COORDINATES);
        let (potentials, _) = process.receive_vec_with_tag::<f64>(POTENTIALS);

        let from = source as usize;
        let malformed = |field: &'static str, found: usize, expected: usize| Error::MalformedResult { from, field, found, expected };
        let (nrows, ncols, nx, ny) = match header[..] {
            [nrows, ncols, nx, ny] => (nrows, ncols, nx, ny),
            _ => return Err(malformed("header", header.len(), 4)),
        };
        if nx + ny > coordinates.len() {
            return Err(malformed("coordinate", coordinates.len(), nx + ny));
        }
        let z = coordinates.split_off(nx + ny);
        let y = coordinates.split_off(nx);
        let found = potentials.len();
        let potentials = ndarray::Array2::from_shape_vec((nrows, ncols), potentials)
            .map_err(|_| malformed("potential", found, nrows * ncols))?;

        log::trace!("rank {}: received header {:?} from rank {}", self.rank, header, from);
        Ok((
            from,
            PartialResult {
                rank: from,
                indices,
                x: coordinates.into(),
                y: y.into(),
                z: z.into(),
                potentials,
            },
        ))
    }

    fn barrier(&self) -> Result<(), Error> {
        self.world.barrier();
        Ok(())
    }
}
