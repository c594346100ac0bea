#![cfg(unix)]

mod common;

use std::fs;
use std::path::Path;

use common::init_logging;
use feedsolve_core::architecture::{Architecture, Cpu, Os};
use feedsolve_core::requirements::Requirements;
use feedsolve_solver::external::ExternalSolver;
use feedsolve_solver::Solver;
use feedsolve_util::errors::SolveError;

const APP: &str = "http://example.com/app";

fn script(dir: &Path, body: &str) -> String {
    let path = dir.join("solver.sh");
    fs::write(&path, body).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_parses_helper_output() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let args_file = dir.path().join("args.txt");
    let body = format!(
        r#"printf '%s\n' "$@" > '{}'
cat <<'JSON'
{{"stale": true, "selections": {{"interface": "{APP}", "command": "run", "implementations": [
  {{"interface": "{APP}", "id": "app1", "version": "1.0", "stability": "stable"}}
]}}}}
JSON
"#,
        args_file.display()
    );
    let solver = ExternalSolver::new("sh").with_prefix_arg(script(dir.path(), &body));

    let requirements = Requirements::new(APP)
        .with_command("run")
        .with_architecture(Architecture::new(Os::Linux, Cpu::All));
    let (selections, stale) = solver.solve_with_staleness(&requirements).unwrap();
    assert!(stale);
    assert_eq!(selections.command.as_deref(), Some("run"));
    assert_eq!(selections.main().unwrap().id, "app1");

    let args = fs::read_to_string(&args_file).unwrap();
    assert_eq!(
        args.lines().collect::<Vec<_>>(),
        vec!["select", "--batch", "--json", APP, "--command", "run", "--os", "Linux"]
    );
}

#[test]
fn test_failed_helper_is_no_solution() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let body = "echo 'lib: no compatible version' >&2\nexit 1\n";
    let solver = ExternalSolver::new("sh").with_prefix_arg(script(dir.path(), body));

    let err = solver.solve(&Requirements::new(APP)).unwrap_err();
    assert!(err.is_solver_failure());
    assert_eq!(
        err.to_string(),
        format!("No solution found for {APP}:\nlib: no compatible version")
    );
}

#[test]
fn test_garbage_output_is_external_error() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let solver = ExternalSolver::new("sh").with_prefix_arg(script(dir.path(), "echo hello\n"));

    let err = solver.solve(&Requirements::new(APP)).unwrap_err();
    assert!(matches!(err, SolveError::External { .. }));
}

#[test]
fn test_missing_program_is_external_error() {
    let solver = ExternalSolver::new("/nonexistent/feedsolve-helper");
    let err = solver.solve(&Requirements::new(APP)).unwrap_err();
    assert!(matches!(err, SolveError::External { .. }));
    assert!(!err.is_solver_failure());
}

#[test]
fn test_invalid_requirements_never_spawn() {
    let solver = ExternalSolver::new("/nonexistent/feedsolve-helper");
    let err = solver.solve(&Requirements::new("  ")).unwrap_err();
    assert!(matches!(err, SolveError::InvalidArgument { .. }));
}
