//! An MPI group of one process, run without `mpirun`.
#![cfg(feature = "mpi")]

use std::time::Duration;

use approx::assert_relative_eq;
use lfpgrid::prelude::*;

fn morphology() -> Morphology {
    Morphology::new(MorphologyDescriptor {
        compartments: vec![
            Compartment { start: [-6.0, 0.0, 0.0], end: [6.0, 0.0, 0.0], diameter: 12.0 },
            Compartment { start: [6.0, 0.0, 0.0], end: [46.0, 0.0, 0.0], diameter: 2.0 },
        ],
        currents: ndarray::arr2(&[[0.0, -1.0, 0.2], [0.0, 1.0, -0.2]]),
        soma: Some(0),
        delta_t: 0.25,
        t_start: 0.0,
    })
    .unwrap()
}

// MPI may only be initialized once per process, so every check shares one test.
#[test]
fn single_process_world() {
    let universe = mpi::initialize().unwrap();
    let comm = MpiComm::new(universe.world(), Some(Duration::from_millis(50)));
    assert_eq!(comm.rank(), 0);
    assert_eq!(comm.size(), 1);
    assert_eq!(comm.role(), Role::Root);

    // nobody else can send
    assert!(matches!(
        comm.receive_any(),
        Err(Error::CommunicationStall { rank: 0, phase: "collecting" })
    ));
    comm.barrier().unwrap();

    // framing survives a trip through the transport
    let partial = PartialResult::new(
        0,
        vec![4, 1],
        CoordinateSet::from_points(&[[1.0, 2.0, 3.0], [-4.0, 5.0, -6.0]]),
        ndarray::arr2(&[[0.5, 1.5, 2.5], [-0.5, -1.5, -2.5]]),
    );
    comm.send(0, partial.clone()).unwrap();
    let (from, received) = comm.receive_any().unwrap();
    assert_eq!(from, 0);
    assert_eq!(received, partial);
    assert!(matches!(comm.send(3, partial), Err(Error::InvalidGroup { rank: 3, size: 1 })));

    let electrode = Electrode::new(ElectrodeDescriptor {
        sigma: 0.3,
        method: SourceModel::SomaAsPoint,
        soma_radius: None,
        points: CoordinateSet::from_points(&[[0.0, 20.0, 0.0], [30.0, -8.0, 4.0], [-25.0, 0.0, 0.0]]),
        merge_order: MergeOrder::Canonical,
    })
    .unwrap();
    let morph = morphology();
    let gathered = electrode
        .run(&morph, &comm, RunDescriptor::default())
        .unwrap()
        .into_merged()
        .unwrap();
    let serial = electrode.run_serial(&morph).unwrap();
    assert_eq!(gathered.indices(), serial.indices());
    for (a, b) in gathered.potentials().iter().zip(serial.potentials().iter()) {
        assert_relative_eq!(*a, *b);
    }
}
