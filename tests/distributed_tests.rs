use blockmm::{
    error::Error,
    execution::{generate_inputs, run_local_with_inputs, run_rank_with_inputs},
    matrix::{reference_multiply, Matrix},
    partition::{check_coverage, Block, Dimensions, Scheme},
    run_local, scatter, transport::launch, Communicator, GlobalMatrices, LocalBlocks,
    LocalCommunicator, MessageKind, Participant, RunOptions,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// Helper to run a seeded distributed multiplication and the matching reference
fn distributed_and_reference(
    scheme: Scheme,
    dims: Dimensions,
    processes: usize,
    seed: u64,
) -> (Matrix, Matrix) {
    let options = RunOptions::new(dims).set_scheme(scheme).set_seed(Some(seed));
    let report = run_local(&options, processes).unwrap();
    let (a, b) = generate_inputs(&dims, Some(seed));
    (report.product, reference_multiply(&a, &b).unwrap())
}

#[test]
fn test_row_strip_matches_reference() {
    for (m, n, q, p) in [(4, 3, 4, 2), (6, 5, 7, 3), (8, 1, 2, 8), (12, 9, 5, 4), (5, 5, 5, 1)] {
        let dims = Dimensions::new(m, n, q).unwrap();
        let (distributed, reference) = distributed_and_reference(Scheme::RowStrip, dims, p, 17);
        assert_eq!(distributed, reference, "row-strip {}x{}x{} on {} processes", m, n, q, p);
    }
}

#[test]
fn test_grid_matches_reference() {
    for (m, n, q, p) in [(4, 2, 4, 4), (6, 3, 9, 9), (8, 5, 4, 4), (3, 7, 3, 1), (4, 1, 8, 16)] {
        let dims = Dimensions::new(m, n, q).unwrap();
        let (distributed, reference) = distributed_and_reference(Scheme::Grid, dims, p, 23);
        assert_eq!(distributed, reference, "grid {}x{}x{} on {} processes", m, n, q, p);
    }
}

#[test]
fn test_random_shapes_match_reference() {
    let mut rng = StdRng::seed_from_u64(2024);
    for _ in 0..12 {
        let side = rng.gen_range(1..=3);
        let p = side * side;
        let m = side * rng.gen_range(1..=4);
        let q = side * rng.gen_range(1..=4);
        let n = rng.gen_range(1..=6);
        let dims = Dimensions::new(m, n, q).unwrap();
        let seed = rng.gen();

        let (grid, reference) = distributed_and_reference(Scheme::Grid, dims, p, seed);
        assert_eq!(grid, reference);

        let strips = rng.gen_range(1..=4);
        let dims = Dimensions::new(strips * rng.gen_range(1..=3), n, q).unwrap();
        let (rows, reference) = distributed_and_reference(Scheme::RowStrip, dims, strips, seed);
        assert_eq!(rows, reference);
    }
}

#[test]
fn test_partition_coverage_for_every_valid_process_count() {
    let dims = Dimensions::new(24, 3, 36).unwrap();
    for p in 1..=24 {
        if let Ok(plan) = Scheme::RowStrip.plan(dims, p) {
            check_coverage(plan.as_ref()).unwrap();
            assert_eq!(plan.blocks().len(), p);
        } else {
            assert_ne!(24 % p, 0);
        }
    }
    for side in [1, 2, 3, 4, 6, 12] {
        let plan = Scheme::Grid.plan(dims, side * side).unwrap();
        check_coverage(plan.as_ref()).unwrap();
        assert_eq!(plan.blocks().len(), side * side);
    }
}

#[test]
fn test_configuration_rejections() {
    let dims = Dimensions::new(7, 3, 4).unwrap();
    let err = run_local(&RunOptions::new(dims), 2).unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
    assert_eq!(err.to_string(), "Error: Rows (7) must be divisible by processes (2)");

    let dims = Dimensions::new(6, 3, 6).unwrap();
    let grid = RunOptions::new(dims).set_scheme(Scheme::Grid);
    assert!(matches!(run_local(&grid, 3), Err(Error::Configuration(_))));

    let dims = Dimensions::new(6, 3, 9).unwrap();
    let grid = RunOptions::new(dims).set_scheme(Scheme::Grid);
    assert!(matches!(run_local(&grid, 4), Err(Error::Configuration(_))));
}

#[test]
fn test_rejection_happens_before_any_message() {
    // Every rank must fail on its own; a rank that waited for a message
    // would report a transport failure instead.
    let dims = Dimensions::new(7, 2, 2).unwrap();
    let options = RunOptions::new(dims);
    let results = launch(2, |comm| run_rank_with_inputs(&comm, &options, None)).unwrap();
    for result in results {
        assert!(matches!(result, Err(Error::Configuration(_))));
    }
}

#[test]
fn test_row_strip_scenario_four_by_four() {
    let dims = Dimensions::new(4, 3, 4).unwrap();
    let plan = Scheme::RowStrip.plan(dims, 2).unwrap();
    for rank in 0..2 {
        let block = plan.block(rank);
        assert_eq!(block.a_shape(&dims), (2, 3));
        assert_eq!(block.b_shape(&dims), (3, 4));
        assert_eq!(block.shape(), (2, 4));
    }

    let a = Matrix::from_rows(&[vec![1, 0, 2], vec![0, 1, 0], vec![3, 1, 1], vec![2, 2, 2]]).unwrap();
    let b = Matrix::from_rows(&[vec![1, 2, 3, 4], vec![0, 1, 0, 1], vec![5, 0, 1, 2]]).unwrap();
    let options = RunOptions::new(dims).enable_verification(true);
    let report = run_local_with_inputs(&options, 2, &a, &b).unwrap();

    let expected = Matrix::from_rows(&[
        vec![11, 2, 5, 8],
        vec![0, 1, 0, 1],
        vec![8, 7, 10, 15],
        vec![12, 6, 8, 14],
    ])
    .unwrap();
    assert_eq!(report.product, expected);
    assert!(report.verified);
    assert_eq!(report.processes, 2);
}

#[test]
fn test_grid_scenario_four_processes() {
    let dims = Dimensions::new(4, 2, 4).unwrap();
    let plan = Scheme::Grid.plan(dims, 4).unwrap();
    let offsets: Vec<_> = plan.blocks().iter().map(Block::offset).collect();
    assert_eq!(offsets, vec![(0, 0), (0, 2), (2, 0), (2, 2)]);
    assert!(plan.blocks().iter().all(|block| block.shape() == (2, 2)));

    let a = Matrix::from_vec(4, 2, (1..=8).collect()).unwrap();
    let b = Matrix::from_vec(2, 4, (1..=8).collect()).unwrap();
    let options = RunOptions::new(dims).set_scheme(Scheme::Grid);
    let report = run_local_with_inputs(&options, 4, &a, &b).unwrap();
    assert_eq!(report.product, reference_multiply(&a, &b).unwrap());
    assert_eq!(report.sample, vec![vec![11, 14, 17, 20], vec![23, 30, 37, 44]]);
}

#[test]
fn test_short_row_is_a_transport_failure() {
    // A worker that receives a row of the wrong length must fail rather than
    // silently truncating.
    let dims = Dimensions::new(2, 3, 2).unwrap();
    let options = RunOptions::new(dims);
    let results = launch(2, |comm| {
        if comm.rank() == 0 {
            comm.send(1, MessageKind::ARow, &[1, 2])?;
            Ok(None)
        } else {
            run_rank_with_inputs(&comm, &options, None)
        }
    })
    .unwrap();
    assert!(matches!(results[1], Err(Error::Transport(_))));
}

#[test]
fn test_worker_blocks_arrive_intact() {
    let dims = Dimensions::new(4, 2, 4).unwrap();
    let plan = Scheme::Grid.plan(dims, 4).unwrap();
    let a = Matrix::from_vec(4, 2, (0..8).collect()).unwrap();
    let b = Matrix::from_vec(2, 4, (10..18).collect()).unwrap();

    let group = LocalCommunicator::group(4);
    let mut coordinator = Participant::Coordinator {
        globals: GlobalMatrices::new(&dims, a.clone(), b.clone()).unwrap(),
        local: LocalBlocks::allocate(&dims, plan.block(0)),
    };
    scatter(&group[0], plan.as_ref(), &mut coordinator).unwrap();

    for rank in 1..4 {
        let block = plan.block(rank);
        let mut worker = Participant::Worker {
            local: LocalBlocks::allocate(&dims, block.clone()),
        };
        scatter(&group[rank], plan.as_ref(), &mut worker).unwrap();

        let mut expected_a = Matrix::zeros(2, 2);
        expected_a.copy_region_from(&a, block.rows.start, 0).unwrap();
        let mut expected_b = Matrix::zeros(2, 2);
        expected_b.copy_region_from(&b, 0, block.cols.start).unwrap();
        assert_eq!(worker.local().a, expected_a, "A block of rank {}", rank);
        assert_eq!(worker.local().b, expected_b, "B block of rank {}", rank);
    }
}

#[test]
fn test_coordinator_failure_releases_waiting_workers() {
    // The coordinator rejects its inputs after the workers are already
    // waiting for their blocks; the workers must fail, not wait forever.
    let dims = Dimensions::new(4, 2, 4).unwrap();
    let options = RunOptions::new(dims);
    let results = launch(4, |comm| {
        let inputs = (comm.rank() == 0).then(|| (Matrix::zeros(3, 2), Matrix::zeros(2, 4)));
        run_rank_with_inputs(&comm, &options, inputs)
    })
    .unwrap();

    assert!(matches!(results[0], Err(Error::Shape(_))));
    for result in &results[1..] {
        assert!(matches!(result, Err(Error::Transport(_))));
    }
}

#[test]
fn test_misshaped_inputs_fail_on_a_large_group() {
    let dims = Dimensions::new(4, 2, 4).unwrap();
    let options = RunOptions::new(dims).set_scheme(Scheme::Grid);
    let err = run_local_with_inputs(&options, 4, &Matrix::zeros(3, 2), &Matrix::zeros(2, 4)).unwrap_err();
    assert!(matches!(err, Error::Shape(_)));
}
