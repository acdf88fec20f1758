pub mod options;
pub mod report;
pub mod runner;

pub use options::RunOptions;
pub use report::{RunReport, Variant};
pub use runner::{
    generate_inputs, run_local, run_local_with_inputs, run_rank, run_rank_with_inputs, run_serial,
    run_serial_with_inputs,
};
