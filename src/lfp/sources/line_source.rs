use crate::lfp::sources::PointSource;
use crate::lfp::{cross, dot, sub, SourceKernel};
use crate::morphology::{distance, Compartment};

/// Points closer than this fraction of the length to a segment are taken to lie on it.
const ON_SEGMENT_RTOL: f64 = 1e-10;

/// Treats a compartment as a uniform line current source along its axis.
///
/// Integrates `1 / r` over the segment. With `h` the signed distance from the end point
/// along the axis, `l = h + length` and `r2` the squared perpendicular distance, the integral
/// takes one of three forms chosen to avoid cancellation.
#[derive(Copy, Clone, Debug, Default)]
pub struct LineSource;

impl SourceKernel for LineSource {
    fn coefficient(&self, index: usize, compartment: &Compartment, point: &[f64; 3]) -> Option<f64> {
        let length = compartment.length();
        if length == 0.0 {
            return PointSource.coefficient(index, compartment, point);
        }

        let axis = sub(&compartment.end, &compartment.start);
        let rel = sub(point, &compartment.end);
        let h = dot(&rel, &axis) / length;
        let perp = cross(&rel, &axis);
        let r2 = dot(&perp, &perp) / (length * length);
        let l = h + length;

        let nearest = if h > 0.0 {
            distance(point, &compartment.end)
        } else if l < 0.0 {
            distance(point, &compartment.start)
        } else {
            r2.sqrt()
        };
        if nearest <= ON_SEGMENT_RTOL * length {
            return None;
        }

        let integral = if h < 0.0 && l < 0.0 {
            // beyond the start point
            ((h * h + r2).sqrt() - h) / ((l * l + r2).sqrt() - l)
        } else if h < 0.0 {
            // alongside the segment
            ((h * h + r2).sqrt() - h) * (l + (l * l + r2).sqrt()) / r2
        } else {
            // beyond the end point
            (l + (l * l + r2).sqrt()) / ((h * h + r2).sqrt() + h)
        };

        Some(integral.ln() / length)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    fn segment(length: f64) -> Compartment {
        Compartment { start: [-0.5 * length, 0.0, 0.0], end: [0.5 * length, 0.0, 0.0], diameter: 1.0 }
    }

    #[test]
    fn perpendicular_bisector_matches_closed_form() {
        // 2 asinh(L / 2d) / L on the perpendicular bisector
        let (length, d) = (20.0, 5.0);
        let value = LineSource.coefficient(0, &segment(length), &[0.0, d, 0.0]).unwrap();
        assert_relative_eq!(value, 2.0 * (length / (2.0 * d)).asinh() / length, max_relative = 1e-12);
    }

    #[test]
    fn all_three_regions_agree_with_symmetry() {
        let seg = segment(10.0);
        let before = LineSource.coefficient(0, &seg, &[-20.0, 3.0, 0.0]).unwrap();
        let after = LineSource.coefficient(0, &seg, &[20.0, 3.0, 0.0]).unwrap();
        assert_relative_eq!(before, after, max_relative = 1e-12);
    }

    #[test]
    fn on_axis_beyond_the_ends_is_finite() {
        let value = LineSource.coefficient(0, &segment(10.0), &[15.0, 0.0, 0.0]).unwrap();
        // ln(20 / 10) / 10
        assert_relative_eq!(value, 2.0f64.ln() / 10.0, max_relative = 1e-12);
    }

    #[test]
    fn on_the_segment_is_degenerate() {
        assert!(LineSource.coefficient(0, &segment(10.0), &[1.0, 0.0, 0.0]).is_none());
        assert!(LineSource.coefficient(0, &segment(10.0), &[5.0, 0.0, 0.0]).is_none());
    }

    #[test]
    fn points_on_an_oblique_segment_are_degenerate() {
        let seg = Compartment { start: [1.3, -2.7, 0.9], end: [14.1, 5.3, 22.7], diameter: 1.0 };
        let axis = sub(&seg.end, &seg.start);
        for k in 0..=100 {
            let t = k as f64 / 100.0;
            let p = [
                seg.start[0] + t * axis[0],
                seg.start[1] + t * axis[1],
                seg.start[2] + t * axis[2],
            ];
            assert!(LineSource.coefficient(0, &seg, &p).is_none(), "t={t}");
        }
    }

    #[test]
    fn oblique_bisector_matches_closed_form() {
        let seg = Compartment { start: [1.3, -2.7, 0.9], end: [14.1, 5.3, 22.7], diameter: 1.0 };
        let length = seg.length();
        let mid = seg.midpoint();
        // (8, -12.8, 0) is perpendicular to the axis (12.8, 8, 21.8)
        let norm = (8.0f64 * 8.0 + 12.8 * 12.8).sqrt();
        for d in [1e-3, 0.5, 4.0] {
            let p = [mid[0] + d * 8.0 / norm, mid[1] - d * 12.8 / norm, mid[2]];
            let value = LineSource.coefficient(0, &seg, &p).unwrap();
            assert_relative_eq!(value, 2.0 * (length / (2.0 * d)).asinh() / length, max_relative = 1e-9);
        }
    }

    #[test]
    fn zero_length_falls_back_to_point_source() {
        let value = LineSource.coefficient(0, &segment(0.0), &[0.0, 0.0, 4.0]).unwrap();
        assert_relative_eq!(value, 0.25);
    }
}
