//! Includes commonly used library components.

pub use crate::{
    ComputeDescriptor,
    Electrode,
    ElectrodeDescriptor,
    Error,
    RunDescriptor,
    SaveSettings,
    Solver,
};
pub use crate::comm::{launch, Communicator, Role, ThreadComm};
#[cfg(feature = "mpi")]
pub use crate::comm::MpiComm;
pub use crate::coordinates::{AxisRange, CoordinateSet, GridDescriptor};
pub use crate::gather::{GatherOutcome, PartialResult};
pub use crate::lfp::SourceModel;
pub use crate::merge::{MergeOrder, MergedResult};
pub use crate::morphology::{Compartment, Morphology, MorphologyDescriptor};
pub use crate::partition::{Contiguous, Partitioner, RoundRobin};
