use std::path::PathBuf;

use crate::comm::Communicator;
use crate::coordinates::CoordinateSet;
use crate::gather::{GatherDescriptor, GatherOutcome, GatherProtocol, PartialResult};
use crate::lfp::{LfpSolver, LfpSolverDescriptor, SourceModel};
use crate::merge::{MergeOrder, MergedResult, ResultMerger};
use crate::morphology::Morphology;
use crate::partition::{Partitioner, RoundRobin};
use crate::{ComputeDescriptor, Error, Solver};

/// Describes the extracellular medium and the recording points.
#[derive(Clone, Debug)]
pub struct ElectrodeDescriptor {
    /// Extracellular conductivity.
    pub sigma: f64,
    /// How compartment currents become potentials.
    pub method: SourceModel,
    /// Radius of the soma sphere for `SourceModel::SomaAsPoint`.
    pub soma_radius: Option<f64>,
    /// Every evaluation point.
    pub points: CoordinateSet,
    /// Row order of the merged result.
    pub merge_order: MergeOrder,
}

/// Describes a single recording run.
#[derive(Debug, Default)]
pub struct RunDescriptor {
    /// Whether or not to print information to the console.
    pub verbose: bool,
    /// Where, if anywhere, the root saves the merged result.
    pub save_settings: Option<SaveSettings>,
}

/// How the merged result should be saved to file.
#[derive(Debug)]
pub struct SaveSettings {
    /// The path to the save file.
    pub filename: PathBuf,
    /// Whether or not to replace an existing file.
    pub overwrite: bool,
}

/// A set of recording points sharing one medium, evaluated across a worker group.
pub struct Electrode<P: Partitioner = RoundRobin> {
    solver: LfpSolver,
    points: CoordinateSet,
    merge_order: MergeOrder,
    partitioner: P,
}

impl Electrode<RoundRobin> {
    /// Creates a new `Electrode` splitting its points round-robin.
    #[inline]
    pub fn new(desc: ElectrodeDescriptor) -> Result<Self, Error> {
        Self::with_partitioner(desc, RoundRobin)
    }
}

impl<P: Partitioner> Electrode<P> {
    /// Creates a new `Electrode` splitting its points with `partitioner`.
    pub fn with_partitioner(desc: ElectrodeDescriptor, partitioner: P) -> Result<Self, Error> {
        let solver = LfpSolver::new(LfpSolverDescriptor {
            sigma: desc.sigma,
            method: desc.method,
            soma_radius: desc.soma_radius,
        })?;
        Ok(Self {
            solver,
            points: desc.points,
            merge_order: desc.merge_order,
            partitioner,
        })
    }

    #[inline]
    pub fn points(&self) -> &CoordinateSet {
        &self.points
    }

    #[inline]
    pub fn solver(&self) -> &LfpSolver {
        &self.solver
    }

    /// Computes this member's share of the points and gathers every share on the root.
    ///
    /// Only the root's outcome carries a result; it is also saved there if requested.
    pub fn run<C: Communicator<PartialResult>>(
        &self,
        morphology: &Morphology,
        comm: &C,
        desc: RunDescriptor,
    ) -> Result<GatherOutcome, Error> {
        let mut protocol = GatherProtocol::new(comm, &self.partitioner, self.points.len());

        // setup output if verbose
        let bar = if desc.verbose {
            let local = protocol.partition().len();
            println!("rank {}: # of evaluation points: {}", comm.rank(), local);
            Some(indicatif::ProgressBar::new(local as u64))
        } else {
            None
        };

        let outcome = protocol.run(GatherDescriptor {
            solver: &self.solver,
            morphology,
            points: &self.points,
            merge_order: self.merge_order,
            bar: &bar,
        })?;

        if let Some(ref bar) = bar {
            bar.finish();
        }

        if let GatherOutcome::Root(ref merged) = outcome {
            log::info!(
                "gathered {} points x {} timesteps from {} workers",
                merged.len(),
                merged.times().len(),
                comm.size(),
            );
            if let Some(ref settings) = desc.save_settings {
                self.save(merged, settings)?;
            }
        }

        Ok(outcome)
    }

    /// Computes every point in this process, without any communication.
    pub fn run_serial(&self, morphology: &Morphology) -> Result<MergedResult, Error> {
        let indices: Vec<usize> = (0..self.points.len()).collect();
        let potentials = self.solver.compute(ComputeDescriptor {
            morphology,
            points: &self.points,
            indices: &indices,
            bar: &None,
        })?;
        let local = PartialResult::new(crate::comm::ROOT, indices, self.points.clone(), potentials);
        ResultMerger::new(self.merge_order, morphology.times()).merge(local, Vec::new())
    }

    #[cfg(feature = "hdf5")]
    fn save(&self, merged: &MergedResult, settings: &SaveSettings) -> Result<(), Error> {
        let file = if settings.overwrite {
            hdf5::File::create(&settings.filename)?
        } else {
            hdf5::File::create_excl(&settings.filename)?
        };
        let npoints = merged.len();

        let points = file.create_group("points")?;
        for (name, values) in [
            ("x", merged.points().x()),
            ("y", merged.points().y()),
            ("z", merged.points().z()),
        ] {
            points.new_dataset::<f64>().shape(npoints).create(name)?.write(values)?;
        }
        let indices: ndarray::Array1<u64> = merged.indices().iter().map(|&i| i as u64).collect();
        file.new_dataset::<u64>().shape(npoints).create("indices")?.write(&indices)?;
        file.new_dataset::<f64>()
            .shape(merged.times().len())
            .create("times")?
            .write(merged.times())?;
        file.new_dataset::<f64>()
            .shape(merged.potentials().dim())
            .create("potentials")?
            .write(merged.potentials())?;

        // save the medium as a file attribute
        let sigma_attr = file.new_attr::<f64>()
            .shape(hdf5::Extents::Scalar)
            .create("sigma");
        if let Ok(attr) = sigma_attr {
            attr.write_scalar(&self.solver.sigma())?;
        }

        file.close()?;
        Ok(())
    }

    #[cfg(not(feature = "hdf5"))]
    fn save(&self, _merged: &MergedResult, _settings: &SaveSettings) -> Result<(), Error> {
        Err(Error::SaveUnsupported)
    }
}
