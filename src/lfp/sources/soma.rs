use crate::lfp::sources::LineSource;
use crate::lfp::SourceKernel;
use crate::morphology::{distance, Compartment};

/// Line sources everywhere, except that the soma compartment is a point source at its midpoint
/// whose distance is clamped to `radius`.
///
/// Inside the sphere the soma contributes `1 / radius`, which meets the point-source falloff
/// on the sphere surface.
#[derive(Copy, Clone, Debug)]
pub struct SomaAsPoint {
    pub soma: usize,
    pub radius: f64,
}

impl SourceKernel for SomaAsPoint {
    fn coefficient(&self, index: usize, compartment: &Compartment, point: &[f64; 3]) -> Option<f64> {
        if index != self.soma {
            return LineSource.coefficient(index, compartment, point);
        }
        let r = distance(&compartment.midpoint(), point).max(self.radius);
        if r > 0.0 {
            Some(r.recip())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    fn soma() -> Compartment {
        Compartment { start: [-10.0, 0.0, 0.0], end: [10.0, 0.0, 0.0], diameter: 20.0 }
    }

    #[test]
    fn inside_the_sphere_is_constant() {
        let kernel = SomaAsPoint { soma: 0, radius: 10.0 };
        let centre = kernel.coefficient(0, &soma(), &[0.0; 3]).unwrap();
        let off = kernel.coefficient(0, &soma(), &[0.0, 6.0, 0.0]).unwrap();
        assert_relative_eq!(centre, 0.1);
        assert_relative_eq!(off, 0.1);
    }

    #[test]
    fn continuous_across_the_sphere_surface() {
        let kernel = SomaAsPoint { soma: 0, radius: 10.0 };
        for dir in [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.6, -0.8]] {
            let at = |r: f64| kernel.coefficient(0, &soma(), &[r * dir[0], r * dir[1], r * dir[2]]).unwrap();
            assert_relative_eq!(at(10.0 - 1e-9), at(10.0 + 1e-9), max_relative = 1e-9);
        }
    }

    #[test]
    fn outside_the_sphere_falls_off_as_a_point_source() {
        let kernel = SomaAsPoint { soma: 0, radius: 10.0 };
        assert_relative_eq!(kernel.coefficient(0, &soma(), &[0.0, 40.0, 0.0]).unwrap(), 0.025);
        // on the soma axis, where a line source would be degenerate
        assert_relative_eq!(kernel.coefficient(0, &soma(), &[10.0, 0.0, 0.0]).unwrap(), 0.1);
    }

    #[test]
    fn other_compartments_are_unaffected() {
        let kernel = SomaAsPoint { soma: 0, radius: 10.0 };
        let dend = Compartment { start: [10.0, 0.0, 0.0], end: [30.0, 0.0, 0.0], diameter: 2.0 };
        assert!(kernel.coefficient(1, &dend, &[20.0, 0.0, 0.0]).is_none());
        let p = [20.0, 5.0, 0.0];
        assert_relative_eq!(
            kernel.coefficient(1, &dend, &p).unwrap(),
            LineSource.coefficient(1, &dend, &p).unwrap(),
        );
    }
}
