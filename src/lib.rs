//! A framework for computing extracellular potentials of multi-compartment neurons.
//!
//! Evaluation points are split across a fixed group of workers, each worker computes the
//! potential at its own points and the partial results are gathered onto the root worker.
//!
//! To get started, refer to the `demos` directory in the main repository.

mod electrode;

pub mod comm;
pub mod coordinates;
pub mod gather;
pub mod lfp;
pub mod merge;
pub mod morphology;
pub mod partition;
pub mod prelude;

pub use electrode::{Electrode, ElectrodeDescriptor, RunDescriptor, SaveSettings};

/// Represents an error in the potential computation or the gather.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Init {array_name} array does not have expected length \
        ( {array_name} array length: {input_length}, \
        expected length: {expected_length} )")]
    BadInit {
        array_name: String,
        input_length: usize,
        expected_length: usize,
    },
    #[error("Evaluation point {point} lies on the source geometry of compartment {compartment}")]
    DegenerateGeometry {
        point: usize,
        compartment: usize,
    },
    #[error("Unknown source model \"{0}\" (expected pointsource, linesource or som_as_point)")]
    UnknownSourceModel(String),
    #[error("Extracellular conductivity must be finite and positive (got {0})")]
    NonPositiveConductivity(f64),
    #[error("The som_as_point source model requires a designated soma compartment")]
    MissingSoma,
    #[error("Rank {rank} is not a member of a worker group of size {size}")]
    InvalidGroup {
        rank: usize,
        size: usize,
    },
    #[error("Worker {rank} timed out while {phase}")]
    CommunicationStall {
        rank: usize,
        phase: &'static str,
    },
    #[error("Worker {rank} lost its peer channel while {phase}")]
    Disconnected {
        rank: usize,
        phase: &'static str,
    },
    #[error("Received partial result from worker {from} with {found} timesteps, expected {expected}")]
    UnexpectedMessage {
        from: usize,
        found: usize,
        expected: usize,
    },
    #[error("Received partial result from worker {from} with {found} {field} entries, expected {expected}")]
    MalformedResult {
        from: usize,
        field: &'static str,
        found: usize,
        expected: usize,
    },
    #[error("Point {index} was returned twice (second copy from worker {from})")]
    DuplicateIndex {
        from: usize,
        index: usize,
    },
    #[cfg(feature = "hdf5")]
    #[error(transparent)]
    H5Error(#[from] hdf5::Error),
    #[cfg(not(feature = "hdf5"))]
    #[error("Saving results requires the hdf5 feature")]
    SaveUnsupported,
}

/// Maps compartment currents to potentials at a set of points.
pub trait Solver {
    /// Generates a potential trace for every point in `desc.points`.
    ///
    /// The returned array has one row per point and one column per timestep.
    fn compute(&self, desc: ComputeDescriptor) -> Result<ndarray::Array2<f64>, Error>;
}

/// Describes which points a `Solver` should evaluate.
pub struct ComputeDescriptor<'a> {
    pub morphology: &'a morphology::Morphology,
    pub points: &'a coordinates::CoordinateSet,
    /// Global index of each point, used when reporting errors.
    pub indices: &'a [usize],
    pub bar: &'a Option<indicatif::ProgressBar>,
}
