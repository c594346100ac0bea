use feedsolve_util::errors::SolveError;
use feedsolve_util::process::ProcessBuilder;

#[cfg(unix)]
#[test]
fn test_run_captures_stdout() {
    let output = ProcessBuilder::new("echo").arg("hello").run().unwrap();
    assert!(output.success);
    assert_eq!(output.code, Some(0));
    assert_eq!(output.stdout.trim(), "hello");
}

#[cfg(unix)]
#[test]
fn test_run_multiple_args() {
    let output = ProcessBuilder::new("echo")
        .args(["select", "--batch", "--json"])
        .run()
        .unwrap();
    assert_eq!(output.stdout.trim(), "select --batch --json");
}

#[cfg(unix)]
#[test]
fn test_run_with_env() {
    let output = ProcessBuilder::new("sh")
        .arg("-c")
        .arg("echo $FEEDSOLVE_TEST_VAR")
        .env("FEEDSOLVE_TEST_VAR", "solver_value")
        .run()
        .unwrap();
    assert_eq!(output.stdout.trim(), "solver_value");
}

#[cfg(unix)]
#[test]
fn test_run_nonzero_exit_is_not_an_error() {
    let output = ProcessBuilder::new("sh")
        .args(["-c", "echo broken >&2; exit 3"])
        .run()
        .unwrap();
    assert!(!output.success);
    assert_eq!(output.code, Some(3));
    assert_eq!(output.stderr.trim(), "broken");
}

#[test]
fn test_run_nonexistent_program() {
    let result = ProcessBuilder::new("nonexistent_program_xyz_123").run();
    assert!(matches!(result, Err(SolveError::External { .. })));
}

#[test]
fn test_arguments_are_recorded_in_order() {
    let builder = ProcessBuilder::new("0install").arg("select").args(["--os", "Linux"]);
    assert_eq!(builder.program(), "0install");
    assert_eq!(builder.arguments(), ["select", "--os", "Linux"]);
}
