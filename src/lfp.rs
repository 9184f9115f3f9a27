//! Forward electrostatic model of compartment currents in a homogeneous medium.

pub mod sources;

mod lfp_solver;

pub use lfp_solver::{LfpSolver, LfpSolverDescriptor};

use std::fmt;
use std::str::FromStr;

use crate::morphology::Compartment;
use crate::Error;

/// Selects how compartment currents are turned into potentials.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SourceModel {
    /// Every compartment is a point source at its midpoint.
    PointSource,
    /// Every compartment is a uniform line source along its axis.
    LineSource,
    /// Line sources, except the soma is a point source whose distance is clamped to the soma
    /// radius.
    SomaAsPoint,
}

impl FromStr for SourceModel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "pointsource" | "point-source" => Ok(SourceModel::PointSource),
            "linesource" | "line-source" => Ok(SourceModel::LineSource),
            "som_as_point" | "soma-as-point" => Ok(SourceModel::SomaAsPoint),
            other => Err(Error::UnknownSourceModel(other.to_string())),
        }
    }
}

impl fmt::Display for SourceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceModel::PointSource => write!(f, "pointsource"),
            SourceModel::LineSource => write!(f, "linesource"),
            SourceModel::SomaAsPoint => write!(f, "som_as_point"),
        }
    }
}

/// Geometric part of one compartment's contribution to the potential at a point.
///
/// The potential is `coefficient * I / (4 π σ)`. `None` means the point lies on the source
/// geometry, where the model is undefined.
pub trait SourceKernel {
    fn coefficient(&self, index: usize, compartment: &Compartment, point: &[f64; 3])
        -> Option<f64>;
}

#[inline]
pub(crate) fn dot(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
pub(crate) fn cross(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[inline]
pub(crate) fn sub(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn selector_strings_parse() {
        assert_eq!("linesource".parse::<SourceModel>().unwrap(), SourceModel::LineSource);
        assert_eq!("soma-as-point".parse::<SourceModel>().unwrap(), SourceModel::SomaAsPoint);
        assert_eq!(SourceModel::PointSource.to_string(), "pointsource");
    }

    #[test]
    fn unknown_selector_is_a_configuration_error() {
        let err = "dipole".parse::<SourceModel>().unwrap_err();
        assert!(matches!(err, Error::UnknownSourceModel(ref s) if s == "dipole"));
    }
}
