//! Neuron geometry and transmembrane currents.

use crate::Error;

/// A cylindrical segment of a neuron.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Compartment {
    /// Start point of the segment axis.
    pub start: [f64; 3],
    /// End point of the segment axis.
    pub end: [f64; 3],
    /// Diameter of the segment.
    pub diameter: f64,
}

impl Compartment {
    /// Midpoint of the segment axis.
    #[inline]
    pub fn midpoint(&self) -> [f64; 3] {
        [
            0.5 * (self.start[0] + self.end[0]),
            0.5 * (self.start[1] + self.end[1]),
            0.5 * (self.start[2] + self.end[2]),
        ]
    }

    /// Length of the segment axis.
    #[inline]
    pub fn length(&self) -> f64 {
        distance(&self.start, &self.end)
    }

    fn map_points(&mut self, f: impl Fn([f64; 3]) -> [f64; 3]) {
        self.start = f(self.start);
        self.end = f(self.end);
    }
}

/// Euclidean distance between two points.
#[inline]
pub fn distance(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)).sqrt()
}

/// Describes a `Morphology` produced by a compartmental simulation.
pub struct MorphologyDescriptor {
    pub compartments: Vec<Compartment>,
    /// Transmembrane currents, one row per compartment and one column per timestep.
    pub currents: ndarray::Array2<f64>,
    /// Index of the soma compartment, if any.
    pub soma: Option<usize>,
    /// Length of each timestep.
    pub delta_t: f64,
    /// Time of the first recorded sample.
    pub t_start: f64,
}

/// Ordered compartments together with their current traces.
#[derive(Clone, Debug)]
pub struct Morphology {
    compartments: Vec<Compartment>,
    currents: ndarray::Array2<f64>,
    soma: Option<usize>,
    delta_t: f64,
    t_start: f64,
}

impl Morphology {
    /// Creates a new `Morphology`, checking that every compartment has a current trace.
    pub fn new(desc: MorphologyDescriptor) -> Result<Self, Error> {
        if desc.currents.nrows() != desc.compartments.len() {
            return Err(Error::BadInit {
                array_name: "Current".to_string(),
                input_length: desc.currents.nrows(),
                expected_length: desc.compartments.len(),
            });
        }
        if let Some(soma) = desc.soma {
            if soma >= desc.compartments.len() {
                return Err(Error::BadInit {
                    array_name: "Compartment".to_string(),
                    input_length: desc.compartments.len(),
                    expected_length: soma + 1,
                });
            }
        }

        Ok(Self {
            compartments: desc.compartments,
            currents: desc.currents,
            soma: desc.soma,
            delta_t: desc.delta_t,
            t_start: desc.t_start,
        })
    }

    #[inline]
    pub fn compartments(&self) -> &[Compartment] {
        &self.compartments
    }

    /// Current traces, one row per compartment.
    #[inline]
    pub fn currents(&self) -> ndarray::ArrayView2<f64> {
        self.currents.view()
    }

    #[inline]
    pub fn soma_index(&self) -> Option<usize> {
        self.soma
    }

    #[inline]
    pub fn soma(&self) -> Option<&Compartment> {
        self.soma.map(|i| &self.compartments[i])
    }

    /// Number of timesteps in each current trace.
    #[inline]
    pub fn ntimes(&self) -> usize {
        self.currents.ncols()
    }

    #[inline]
    pub fn delta_t(&self) -> f64 {
        self.delta_t
    }

    /// Sample times shared by every current and potential trace.
    pub fn times(&self) -> ndarray::Array1<f64> {
        ndarray::Array1::from_shape_fn(self.ntimes(), |n| self.t_start + (n as f64) * self.delta_t)
    }

    /// The point transforms are anchored to: the soma midpoint, or the mean of all midpoints.
    pub fn anchor(&self) -> [f64; 3] {
        if let Some(soma) = self.soma() {
            return soma.midpoint();
        }
        let n = self.compartments.len().max(1) as f64;
        self.compartments.iter().fold([0.0; 3], |mut acc, c| {
            let mid = c.midpoint();
            for k in 0..3 {
                acc[k] += mid[k] / n;
            }
            acc
        })
    }

    /// Translates the morphology so that its anchor lands on `pos`.
    pub fn set_pos(&mut self, pos: [f64; 3]) {
        let anchor = self.anchor();
        let shift = [pos[0] - anchor[0], pos[1] - anchor[1], pos[2] - anchor[2]];
        for c in self.compartments.iter_mut() {
            c.map_points(|p| [p[0] + shift[0], p[1] + shift[1], p[2] + shift[2]]);
        }
    }

    /// Rotates the morphology about its anchor, by `x`, then `y`, then `z` radians around the
    /// respective axes.
    pub fn set_rotation(&mut self, x: f64, y: f64, z: f64) {
        let anchor = ndarray::arr1(&self.anchor());
        let rotation = rotation_z(z).dot(&rotation_y(y)).dot(&rotation_x(x));
        for c in self.compartments.iter_mut() {
            c.map_points(|p| {
                let rotated = rotation.dot(&(ndarray::arr1(&p) - &anchor)) + &anchor;
                [rotated[0], rotated[1], rotated[2]]
            });
        }
    }
}

fn rotation_x(theta: f64) -> ndarray::Array2<f64> {
    let (s, c) = theta.sin_cos();
    ndarray::arr2(&[[1.0, 0.0, 0.0], [0.0, c, -s], [0.0, s, c]])
}

fn rotation_y(theta: f64) -> ndarray::Array2<f64> {
    let (s, c) = theta.sin_cos();
    ndarray::arr2(&[[c, 0.0, s], [0.0, 1.0, 0.0], [-s, 0.0, c]])
}

fn rotation_z(theta: f64) -> ndarray::Array2<f64> {
    let (s, c) = theta.sin_cos();
    ndarray::arr2(&[[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]])
}
