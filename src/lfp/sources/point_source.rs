use crate::lfp::SourceKernel;
use crate::morphology::{distance, Compartment};

/// Treats a compartment as a point current source at its midpoint.
#[derive(Copy, Clone, Debug, Default)]
pub struct PointSource;

impl SourceKernel for PointSource {
    #[inline]
    fn coefficient(
        &self,
        _index: usize,
        compartment: &Compartment,
        point: &[f64; 3],
    ) -> Option<f64> {
        let r = distance(&compartment.midpoint(), point);
        if r == 0.0 {
            return None;
        }
        Some(r.recip())
    }
}
