//! Delegation to an out-of-process solver.
//!
//! The helper is invoked as
//!
//! ```text
//! <program> select --batch --json <interface> [--command c] [--os o] [--cpu c]
//!           [--version-for <interface> <range>]...
//! ```
//!
//! and must print `{"stale": bool, "selections": {...}}` on stdout.

use feedsolve_core::architecture::{Cpu, Os};
use feedsolve_core::requirements::Requirements;
use feedsolve_core::selection::Selections;
use feedsolve_util::errors::{SolveError, SolveResult};
use feedsolve_util::process::ProcessBuilder;
use serde::Deserialize;

use crate::Solver;

#[derive(Debug, Deserialize)]
struct ExternalOutput {
    #[serde(default)]
    stale: bool,
    selections: Selections,
}

#[derive(Debug, Clone)]
pub struct ExternalSolver {
    program: String,
    /// Arguments placed before `select`, e.g. a script path for an interpreter.
    prefix_args: Vec<String>,
}

impl ExternalSolver {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            prefix_args: Vec::new(),
        }
    }

    pub fn with_prefix_arg(mut self, arg: impl Into<String>) -> Self {
        self.prefix_args.push(arg.into());
        self
    }

    /// The full command line for `requirements`.
    pub fn command_for(&self, requirements: &Requirements) -> ProcessBuilder {
        let mut process = ProcessBuilder::new(self.program.as_str())
            .args(self.prefix_args.iter().map(String::as_str))
            .args(["select", "--batch", "--json"])
            .arg(requirements.interface.as_str());

        if let Some(command) = &requirements.command {
            process = process.arg("--command").arg(command.as_str());
        }
        if requirements.architecture.os != Os::All {
            process = process.arg("--os").arg(requirements.architecture.os.as_str());
        }
        if requirements.architecture.cpu != Cpu::All {
            process = process.arg("--cpu").arg(requirements.architecture.cpu.as_str());
        }
        for (interface, ranges) in &requirements.extra_restrictions {
            for range in ranges {
                process = process
                    .arg("--version-for")
                    .arg(interface.as_str())
                    .arg(range.to_string());
            }
        }
        process
    }

    /// Parse the helper's stdout.
    pub fn parse_output(stdout: &str) -> SolveResult<(Selections, bool)> {
        let output: ExternalOutput =
            serde_json::from_str(stdout).map_err(|e| SolveError::External {
                message: format!("unparseable output: {e}"),
            })?;
        Ok((output.selections, output.stale))
    }
}

impl Solver for ExternalSolver {
    fn solve_with_staleness(&self, requirements: &Requirements) -> SolveResult<(Selections, bool)> {
        requirements.validate()?;

        let output = self.command_for(requirements).run()?;
        if !output.success {
            let stderr = output.stderr.trim();
            return Err(SolveError::NoSolution {
                interface: requirements.interface.clone(),
                report: if stderr.is_empty() {
                    String::new()
                } else {
                    format!(":\n{stderr}")
                },
            });
        }
        let (selections, stale) = Self::parse_output(&output.stdout)?;
        if stale {
            tracing::debug!("external solver reported stale feeds");
        }
        Ok((selections, stale))
    }
}
