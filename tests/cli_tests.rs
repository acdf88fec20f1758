use std::process::{Command, Output};

fn blockmm(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_blockmm"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run blockmm")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_wrong_argument_count_prints_usage() {
    let output = blockmm(&["4", "3"]);
    assert_eq!(output.status.code(), Some(1));
    let text = stdout(&output);
    assert!(text.starts_with("Usage: "), "unexpected output: {}", text);
    assert!(text.trim_end().ends_with("<M_rows> <N_inner> <Q_cols>"));
}

#[test]
fn test_indivisible_rows_are_rejected() {
    let output = blockmm(&["7", "3", "4", "--procs", "2"]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout(&output).trim(), "Error: Rows (7) must be divisible by processes (2)");
}

#[test]
fn test_grid_requires_square_process_count() {
    let output = blockmm(&["6", "3", "6", "--scheme", "grid", "--procs", "3"]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        stdout(&output).trim(),
        "Processes must be perfect square, and M, Q divisible by sqrt(P)."
    );
}

#[test]
fn test_successful_run_prints_report() {
    let output = blockmm(&["4", "3", "12", "--procs", "2", "--seed", "1", "--verify"]);
    assert_eq!(output.status.code(), Some(0));
    let text = stdout(&output);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("MPI 1D Matrix Multiplication (Rectangular) completed in "));
    assert!(lines[0].ends_with(" seconds."));
    assert_eq!(lines[1], "First few elements of matrix C:");
    assert_eq!(lines[2].split(' ').count(), 10);
    assert!(lines[3].split(' ').all(|value| value.parse::<i64>().is_ok()));
}

#[test]
fn test_serial_and_distributed_agree() {
    let serial = blockmm(&["6", "4", "6", "--serial", "--seed", "3"]);
    let grid = blockmm(&["6", "4", "6", "--scheme", "grid", "--procs", "9", "--seed", "3"]);
    assert_eq!(serial.status.code(), Some(0));
    assert_eq!(grid.status.code(), Some(0));

    let sample = |output: &Output| stdout(output).lines().skip(2).map(str::to_string).collect::<Vec<_>>();
    assert_eq!(sample(&serial), sample(&grid));
}

#[test]
fn test_json_report() {
    let output = blockmm(&["2", "2", "2", "--procs", "1", "--json"]);
    assert_eq!(output.status.code(), Some(0));
    let report: serde_json::Value = serde_json::from_str(stdout(&output).trim()).unwrap();
    assert_eq!(report["variant"], "row-strip");
    assert_eq!(report["processes"], 1);
    assert_eq!(report["sample"].as_array().unwrap().len(), 2);
}
