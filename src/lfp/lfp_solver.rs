use std::f64::consts::PI;

use crate::coordinates::CoordinateSet;
use crate::lfp::sources::{LineSource, PointSource, SomaAsPoint};
use crate::lfp::{SourceKernel, SourceModel};
use crate::morphology::Morphology;
use crate::{ComputeDescriptor, Error, Solver};

/// Describes the medium and source model of an `LfpSolver`.
#[derive(Copy, Clone, Debug)]
pub struct LfpSolverDescriptor {
    /// Extracellular conductivity.
    pub sigma: f64,
    pub method: SourceModel,
    /// Radius of the soma sphere for `SourceModel::SomaAsPoint`. Defaults to half the soma
    /// diameter.
    pub soma_radius: Option<f64>,
}

/// Computes potentials by superposing every compartment's contribution at every point.
#[derive(Copy, Clone, Debug)]
pub struct LfpSolver {
    sigma: f64,
    method: SourceModel,
    soma_radius: Option<f64>,
}

impl LfpSolver {
    #[inline]
    pub fn new(desc: LfpSolverDescriptor) -> Result<Self, Error> {
        if !(desc.sigma.is_finite() && desc.sigma > 0.0) {
            return Err(Error::NonPositiveConductivity(desc.sigma));
        }
        Ok(Self {
            sigma: desc.sigma,
            method: desc.method,
            soma_radius: desc.soma_radius,
        })
    }

    #[inline]
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    #[inline]
    pub fn method(&self) -> SourceModel {
        self.method
    }

    fn kernel(&self, morphology: &Morphology) -> Result<Box<dyn SourceKernel>, Error> {
        let kernel: Box<dyn SourceKernel> = match self.method {
            SourceModel::PointSource => Box::new(PointSource),
            SourceModel::LineSource => Box::new(LineSource),
            SourceModel::SomaAsPoint => {
                let soma = morphology.soma_index().ok_or(Error::MissingSoma)?;
                let radius = self
                    .soma_radius
                    .unwrap_or_else(|| 0.5 * morphology.compartments()[soma].diameter);
                Box::new(SomaAsPoint { soma, radius })
            }
        };
        Ok(kernel)
    }

    /// Builds the matrix mapping compartment currents to point potentials, with one row per
    /// point and one column per compartment.
    ///
    /// Fails on the first point that lies on a compartment's source geometry.
    pub fn transfer_matrix(
        &self,
        morphology: &Morphology,
        points: &CoordinateSet,
        indices: &[usize],
        bar: &Option<indicatif::ProgressBar>,
    ) -> Result<ndarray::Array2<f64>, Error> {
        if indices.len() != points.len() {
            return Err(Error::BadInit {
                array_name: "Index".to_string(),
                input_length: indices.len(),
                expected_length: points.len(),
            });
        }
        let kernel = self.kernel(morphology)?;
        let scale = (4.0 * PI * self.sigma).recip();
        let compartments = morphology.compartments();

        let mut matrix = ndarray::Array2::<f64>::zeros((points.len(), compartments.len()));
        for (mut row, (point, &global)) in matrix
            .rows_mut()
            .into_iter()
            .zip(points.iter().zip(indices))
        {
            for (c_index, (entry, compartment)) in row.iter_mut().zip(compartments).enumerate() {
                let coefficient = kernel
                    .coefficient(c_index, compartment, &point)
                    .ok_or(Error::DegenerateGeometry {
                        point: global,
                        compartment: c_index,
                    })?;
                *entry = scale * coefficient;
            }

            if let Some(ref bar) = bar {
                bar.inc(1)
            }
        }

        Ok(matrix)
    }
}

impl Solver for LfpSolver {
    #[inline]
    fn compute(&self, desc: ComputeDescriptor) -> Result<ndarray::Array2<f64>, Error> {
        let matrix = self.transfer_matrix(desc.morphology, desc.points, desc.indices, desc.bar)?;
        Ok(matrix.dot(&desc.morphology.currents()))
    }
}
