use std::collections::BTreeMap;
use std::process::Command;

use crate::errors::SolveError;

/// Captured result of a finished child process.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Fluent builder for invoking a helper program and capturing its text output.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: String,
    args: Vec<String>,
    env: BTreeMap<String, String>,
}

impl ProcessBuilder {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable for the child process.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// The arguments collected so far, in order.
    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// Run the program to completion.
    ///
    /// A non-zero exit is not an error here; callers inspect [`ProcessOutput::success`].
    /// Failing to spawn the program at all maps to [`SolveError::External`].
    pub fn run(&self) -> Result<ProcessOutput, SolveError> {
        tracing::debug!("Running {} {}", self.program, self.args.join(" "));
        let output = Command::new(&self.program)
            .args(&self.args)
            .envs(&self.env)
            .output()
            .map_err(|e| SolveError::External {
                message: format!("failed to spawn {}: {e}", self.program),
            })?;

        Ok(ProcessOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
