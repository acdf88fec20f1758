use std::time::Instant;

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{Error, Result};
use crate::matrix::{multiply_accumulate, reference_multiply, Matrix};
use crate::partition::Dimensions;
use crate::protocol::{gather, scatter, GlobalMatrices, LocalBlocks, Participant};
use crate::transport::{launch, Communicator};

use super::options::RunOptions;
use super::report::{RunReport, Variant};

/// Random `m x n` A and `n x q` B with values in `0..10`.
pub fn generate_inputs(dims: &Dimensions, seed: Option<u64>) -> (Matrix, Matrix) {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let a = Matrix::random(dims.m, dims.n, &mut rng);
    let b = Matrix::random(dims.n, dims.q, &mut rng);
    (a, b)
}

/// SPMD entry point: every rank of the group calls this with the same
/// options. The coordinator generates the inputs.
///
/// Returns the report on the coordinator and `None` on workers.
pub fn run_rank<C>(comm: &C, options: &RunOptions) -> Result<Option<RunReport>>
where
    C: Communicator + ?Sized,
{
    run_rank_with_inputs(comm, options, None)
}

/// Like [`run_rank`], but the coordinator multiplies `inputs` when given.
/// Workers ignore `inputs`.
pub fn run_rank_with_inputs<C>(
    comm: &C,
    options: &RunOptions,
    inputs: Option<(Matrix, Matrix)>,
) -> Result<Option<RunReport>>
where
    C: Communicator + ?Sized,
{
    let topology = comm.topology()?;
    let dims = options.dimensions;

    // Every rank validates on its own, before any message is exchanged.
    let plan = options.scheme.plan(dims, topology.size)?;
    let block = plan.block(topology.rank);
    debug!(
        "rank {} owns C rows {:?}, columns {:?} ({} scheme)",
        topology.rank, block.rows, block.cols, options.scheme
    );
    let local = LocalBlocks::allocate(&dims, block);

    let mut participant = if topology.is_coordinator() {
        let (a, b) = inputs.unwrap_or_else(|| generate_inputs(&dims, options.seed));
        info!(
            "multiplying {}x{} by {}x{} on {} processes ({} scheme)",
            dims.m, dims.n, dims.n, dims.q, topology.size, options.scheme
        );
        Participant::Coordinator {
            globals: GlobalMatrices::new(&dims, a, b)?,
            local,
        }
    } else {
        Participant::Worker { local }
    };

    scatter(comm, plan.as_ref(), &mut participant)?;
    let compute_seconds = compute_local(comm, participant.local_mut())?;
    gather(comm, plan.as_ref(), &mut participant)?;

    let globals = match participant.into_globals() {
        Some(globals) => globals,
        None => return Ok(None),
    };
    if options.verify {
        verify(&globals)?;
    }
    Ok(Some(RunReport::new(
        Variant::from(options.scheme),
        dims,
        topology.size,
        compute_seconds,
        options.verify,
        globals.c,
    )))
}

/// Zero the local C block and multiply into it, timing only the multiply.
fn compute_local<C>(comm: &C, local: &mut LocalBlocks) -> Result<f64>
where
    C: Communicator + ?Sized,
{
    local.c.zero();
    let start = comm.wall_time();
    multiply_accumulate(&local.a, &local.b, &mut local.c)?;
    let elapsed = comm.wall_time() - start;
    debug!(
        "rank {} computed its {}x{} block in {:.6}s",
        local.block.rank,
        local.c.rows(),
        local.c.cols(),
        elapsed
    );
    Ok(elapsed)
}

fn verify(globals: &GlobalMatrices) -> Result<()> {
    let expected = reference_multiply(&globals.a, &globals.b)?;
    for i in 0..expected.rows() {
        for j in 0..expected.cols() {
            if globals.c[(i, j)] != expected[(i, j)] {
                return Err(Error::Verification(format!(
                    "C[{}][{}] is {} but the reference product has {}",
                    i,
                    j,
                    globals.c[(i, j)],
                    expected[(i, j)]
                )));
            }
        }
    }
    info!("distributed product matches the reference");
    Ok(())
}

/// Run on an in-process group of `processes` ranks and return the
/// coordinator's report.
pub fn run_local(options: &RunOptions, processes: usize) -> Result<RunReport> {
    // Reject the configuration once, before any rank thread exists.
    options.scheme.plan(options.dimensions, processes)?;
    let results = launch(processes, |comm| run_rank(&comm, options))?;
    coordinator_report(results)
}

/// [`run_local`] with caller-provided inputs instead of random ones.
pub fn run_local_with_inputs(
    options: &RunOptions,
    processes: usize,
    a: &Matrix,
    b: &Matrix,
) -> Result<RunReport> {
    options.scheme.plan(options.dimensions, processes)?;
    GlobalMatrices::check_inputs(&options.dimensions, a, b)?;
    let results = launch(processes, |comm| {
        let inputs = comm.topology()?.is_coordinator().then(|| (a.clone(), b.clone()));
        run_rank_with_inputs(&comm, options, inputs)
    })?;
    coordinator_report(results)
}

/// The coordinator's error wins, since every rank reports the same
/// configuration error.
fn coordinator_report(results: Vec<Result<Option<RunReport>>>) -> Result<RunReport> {
    let mut results = results.into_iter();
    let coordinator = results
        .next()
        .ok_or_else(|| Error::Transport("process group has no coordinator".to_string()))?;

    let mut worker_error = None;
    for (index, result) in results.enumerate() {
        if let Err(err) = result {
            warn!("rank {} failed: {}", index + 1, err);
            worker_error.get_or_insert(err);
        }
    }

    let report = coordinator?;
    if let Some(err) = worker_error {
        return Err(err);
    }
    report.ok_or_else(|| Error::Transport("coordinator returned no report".to_string()))
}

/// Single-process baseline: fill, zero, multiply with the same kernel, time
/// only the multiply.
pub fn run_serial(options: &RunOptions) -> Result<RunReport> {
    let dims = options.dimensions;
    let (a, b) = generate_inputs(&dims, options.seed);
    run_serial_with_inputs(options, &a, &b)
}

pub fn run_serial_with_inputs(options: &RunOptions, a: &Matrix, b: &Matrix) -> Result<RunReport> {
    let dims = options.dimensions;
    let mut globals = GlobalMatrices::new(&dims, a.clone(), b.clone())?;
    globals.c.zero();

    let start = Instant::now();
    multiply_accumulate(&globals.a, &globals.b, &mut globals.c)?;
    let elapsed = start.elapsed().as_secs_f64();

    if options.verify {
        verify(&globals)?;
    }
    Ok(RunReport::new(
        Variant::Serial,
        dims,
        1,
        elapsed,
        options.verify,
        globals.c,
    ))
}
