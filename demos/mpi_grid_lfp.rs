//! Run with `mpirun -n 4 cargo run --release --features mpi --example mpi_grid_lfp`.

use lfpgrid::prelude::*;

use lfpgrid::comm::DEFAULT_TIMEOUT;
use mpi::traits::Communicator as _;

fn main() {
    let universe = mpi::initialize().unwrap();
    let world = universe.world();
    let delta_t = 2f64.powi(-5); // [ms]
    let nsteps = 161;

    // a soma with one dendrite leaving the grid plane along y
    let mut compartments = vec![Compartment {
        start: [0.0, -10.0, 0.0],
        end: [0.0, 10.0, 0.0],
        diameter: 20.0, // [µm]
    }];
    for n in 0..5 {
        compartments.push(Compartment {
            start: [0.0, 10.0 + 40.0 * n as f64, 0.0],
            end: [0.0, 10.0 + 40.0 * (n + 1) as f64, 0.0],
            diameter: 2.0,
        });
    }
    let ncomp = compartments.len();
    let currents = ndarray::Array2::from_shape_fn((ncomp, nsteps), |(c, t)| {
        let time = t as f64 * delta_t;
        let pulse = time * (-time).exp(); // [nA]
        if c == 0 { -pulse } else { pulse / (ncomp - 1) as f64 }
    });
    let morphology = Morphology::new(MorphologyDescriptor {
        compartments,
        currents,
        soma: Some(0),
        delta_t,
        t_start: 0.0,
    })
    .unwrap();

    let electrode = Electrode::new(ElectrodeDescriptor {
        sigma: 0.3, // [S / m]
        method: SourceModel::SomaAsPoint,
        soma_radius: None,
        points: CoordinateSet::grid(GridDescriptor {
            x: AxisRange { start: -50.0, step: 10.0, count: 11 },
            y: AxisRange::fixed(0.0),
            z: AxisRange { start: -50.0, step: 10.0, count: 11 },
        }),
        merge_order: MergeOrder::Canonical,
    })
    .unwrap();

    let comm = MpiComm::new(world, Some(DEFAULT_TIMEOUT));
    let outcome = match electrode.run(&morphology, &comm, RunDescriptor { verbose: true, save_settings: None }) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("rank {}: {}", comm.rank(), e);
            comm.world().abort(1)
        }
    };

    if let Some(merged) = outcome.into_merged() {
        println!("-- Peak potentials on {} ranks --", comm.size());
        for (index, point, trace) in merged.iter().step_by(12) {
            let peak = trace.iter().cloned().fold(0.0f64, |acc, v| if v.abs() > acc.abs() { v } else { acc });
            println!(
                "#{:<4} ({:>6.1}, {:>6.1}, {:>6.1}) µm   {:>10.3e} mV",
                index, point[0], point[1], point[2], peak,
            );
        }
    }
}
