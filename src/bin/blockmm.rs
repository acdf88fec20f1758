//! blockmm command-line interface.
//!
//! Multiply a random `M x N` matrix by a random `N x Q` matrix across a group
//! of cooperating processes:
//! ```sh
//! blockmm 512 256 512 --procs 4
//! blockmm 512 256 512 --scheme grid --procs 16 --verify
//! blockmm 512 256 512 --serial
//! # built with `--features mpi`:
//! mpirun -n 4 blockmm 512 256 512 --scheme grid
//! ```

use std::process::ExitCode;

use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;

use blockmm::{Dimensions, Error, RunOptions, RunReport, Scheme};

#[derive(Parser)]
#[command(name = "blockmm")]
#[command(about = "Block-decomposed distributed integer matrix multiplication")]
#[command(version)]
struct Cli {
    /// Rows of A and C
    m: usize,
    /// Columns of A, rows of B
    n: usize,
    /// Columns of B and C
    q: usize,
    /// Decomposition scheme: row-strip or grid
    #[arg(long, default_value = "row-strip")]
    scheme: Scheme,
    /// Run the single-process baseline instead of a distributed run
    #[arg(long, conflicts_with = "scheme")]
    serial: bool,
    /// Number of processes in the in-process group (ignored under MPI)
    #[arg(short = 'p', long = "procs", default_value_t = 4)]
    procs: usize,
    /// Seed for the random inputs
    #[arg(long)]
    seed: Option<u64>,
    /// Check the product against a single-process reference
    #[arg(long)]
    verify: bool,
    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

/// The process group this binary runs in.
struct Group {
    #[cfg(feature = "mpi")]
    world: blockmm::transport::MpiCommunicator,
}

impl Group {
    #[cfg(not(feature = "mpi"))]
    fn start() -> anyhow::Result<Self> {
        Ok(Self {})
    }

    #[cfg(feature = "mpi")]
    fn start() -> anyhow::Result<Self> {
        let world = blockmm::transport::MpiCommunicator::initialize()
            .context("failed to bootstrap the MPI process group")?;
        Ok(Self { world })
    }

    #[cfg(not(feature = "mpi"))]
    fn is_coordinator(&self) -> bool {
        true
    }

    #[cfg(feature = "mpi")]
    fn is_coordinator(&self) -> bool {
        use blockmm::Communicator;
        self.world.rank() == blockmm::COORDINATOR
    }

    #[cfg(not(feature = "mpi"))]
    fn multiply(&self, cli: &Cli, options: &RunOptions) -> blockmm::Result<Option<RunReport>> {
        blockmm::run_local(options, cli.procs).map(Some)
    }

    #[cfg(feature = "mpi")]
    fn multiply(&self, _cli: &Cli, options: &RunOptions) -> blockmm::Result<Option<RunReport>> {
        blockmm::run_rank(&self.world, options)
    }

    #[cfg(not(feature = "mpi"))]
    fn fail(&self) -> ExitCode {
        ExitCode::FAILURE
    }

    /// A transport failure is fatal for the whole group.
    #[cfg(feature = "mpi")]
    fn fail(&self) -> ExitCode {
        self.world.abort(1)
    }
}

fn run(group: &Group, cli: &Cli) -> blockmm::Result<Option<RunReport>> {
    let dims = Dimensions::new(cli.m, cli.n, cli.q)?;
    let options = RunOptions::new(dims)
        .set_scheme(cli.scheme)
        .set_seed(cli.seed)
        .enable_verification(cli.verify);

    if cli.serial {
        if group.is_coordinator() {
            return blockmm::run_serial(&options).map(Some);
        }
        return Ok(None);
    }
    group.multiply(cli, &options)
}

fn print_report(report: &RunReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", report.render_json().context("failed to encode report")?);
    } else {
        print!("{}", report.render_text());
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let group = match Group::start() {
        Ok(group) => group,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            return ExitCode::FAILURE;
        }
    };

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            if group.is_coordinator() {
                let _ = err.print();
            }
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            if group.is_coordinator() {
                let program = std::env::args().next().unwrap_or_else(|| "blockmm".to_string());
                println!("{}", Error::Usage(program));
                log::debug!("argument error: {}", err);
            }
            return ExitCode::FAILURE;
        }
    };

    match run(&group, &cli) {
        Ok(Some(report)) => match print_report(&report, cli.json) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("Error: {:#}", err);
                ExitCode::FAILURE
            }
        },
        Ok(None) => ExitCode::SUCCESS,
        Err(err) if err.is_configuration() => {
            if group.is_coordinator() {
                println!("{}", err);
            }
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("Error: {}", err);
            group.fail()
        }
    }
}
