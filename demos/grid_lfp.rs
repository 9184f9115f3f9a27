use lfpgrid::prelude::*;

use lfpgrid::comm::DEFAULT_TIMEOUT;

use std::f64::consts::PI;

fn main() {
    let nworkers = 4;
    let delta_t = 2f64.powi(-5); // [ms]
    let nsteps = 321;

    // a ball-and-stick cell: soma plus a ten segment dendrite, turned out of the grid plane below
    let mut compartments = vec![Compartment {
        start: [-10.0, 0.0, 0.0],
        end: [10.0, 0.0, 0.0],
        diameter: 20.0, // [µm]
    }];
    for n in 0..10 {
        compartments.push(Compartment {
            start: [10.0 + 50.0 * n as f64, 0.0, 0.0],
            end: [10.0 + 50.0 * (n + 1) as f64, 0.0, 0.0],
            diameter: 2.0,
        });
    }

    // a synaptic current sink at the soma, returning through the dendrite
    let ncomp = compartments.len();
    let currents = ndarray::Array2::from_shape_fn((ncomp, nsteps), |(c, t)| {
        let time = t as f64 * delta_t;
        let pulse = if time > 1.0 { (time - 1.0) * (-(time - 1.0)).exp() } else { 0.0 }; // [nA]
        if c == 0 { -pulse } else { pulse / (ncomp - 1) as f64 }
    });

    let mut morphology = Morphology::new(MorphologyDescriptor {
        compartments,
        currents,
        soma: Some(0),
        delta_t,
        t_start: 0.0,
    })
    .unwrap();
    morphology.set_pos([0.0, 0.0, 0.0]);
    morphology.set_rotation(0.0, 0.0, PI / 2.0);

    let electrode = Electrode::new(ElectrodeDescriptor {
        sigma: 0.3, // [S / m]
        method: "som_as_point".parse().unwrap(),
        soma_radius: None,
        points: CoordinateSet::grid(GridDescriptor {
            x: AxisRange { start: -50.0, step: 10.0, count: 11 },
            y: AxisRange::fixed(0.0),
            z: AxisRange { start: -50.0, step: 10.0, count: 11 },
        }),
        merge_order: MergeOrder::Canonical,
    })
    .unwrap();

    println!(
        "\n-- General Recording Info --\n\
        # of points:      {}\n\
        # of workers:     {}\n\
        # of time steps:  {}\n\
        Δt:               {:<9.2e} ms\n",
        electrode.points().len(),
        nworkers,
        nsteps,
        delta_t,
    );

    let outcomes = launch(nworkers, Some(DEFAULT_TIMEOUT), |comm: ThreadComm<PartialResult>| {
        electrode.run(&morphology, &comm, RunDescriptor {
            verbose: false,
            save_settings: None,
        })
    })
    .unwrap();

    let merged = outcomes
        .into_iter()
        .next()
        .and_then(|outcome| outcome.unwrap().into_merged())
        .unwrap();

    println!("-- Peak potentials --");
    for (index, point, trace) in merged.iter().step_by(12) {
        let peak = trace.iter().cloned().fold(0.0f64, |acc, v| if v.abs() > acc.abs() { v } else { acc });
        println!(
            "#{:<4} ({:>6.1}, {:>6.1}, {:>6.1}) µm   {:>10.3e} mV",
            index, point[0], point[1], point[2], peak,
        );
    }
}
