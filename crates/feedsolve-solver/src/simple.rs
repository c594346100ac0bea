//! Greedy solver for tree-shaped dependency graphs.

use feedsolve_core::feed::{Command, Dependency};
use feedsolve_core::requirements::Requirements;
use feedsolve_core::selection::{ImplementationSelection, Selections};
use feedsolve_util::errors::{SolveError, SolveResult};

use crate::candidate::{essential_first, filter_command, SelectionCandidate};
use crate::provider::SolverContext;
use crate::report::RejectionReport;
use crate::run::SolverRun;
use crate::visited::VisitedPath;
use crate::Solver;

/// Picks the best-ranked suitable candidate for each interface and never
/// reconsiders it.
///
/// Limitations:
/// - an interface reached through two paths is resolved twice, independently,
///   so diamond-shaped graphs can yield two selections for one interface
/// - restrictions between implementations are not enforced
/// - commands with runners are rejected with [`SolveError::Unsupported`]
/// - executable commands are added without checking them against the
///   implementation's restrictions
#[derive(Clone)]
pub struct SimpleSolver {
    ctx: SolverContext,
}

impl SimpleSolver {
    pub fn new(ctx: SolverContext) -> Self {
        Self { ctx }
    }
}

impl Solver for SimpleSolver {
    fn solve_with_staleness(&self, requirements: &Requirements) -> SolveResult<(Selections, bool)> {
        requirements.validate()?;

        let mut run = SolverRun::new(&self.ctx);
        let mut first_error = None;
        for effective in requirements.effective() {
            let mut walk = Walk {
                run: &mut run,
                top: &effective,
                ctx: &self.ctx,
                path: VisitedPath::new(),
                selections: Vec::new(),
            };
            match walk.select(&effective, 0) {
                Ok(()) => {
                    let mut selections =
                        Selections::new(effective.interface.as_str(), effective.command.clone());
                    selections.implementations = walk.selections;
                    return Ok((selections, run.stale_feeds()));
                }
                Err(e) if e.is_solver_failure() => {
                    tracing::debug!("no solution for {effective}: {e}");
                    first_error.get_or_insert(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(first_error.unwrap_or_else(|| SolveError::no_solution(requirements.interface.as_str())))
    }
}

struct Walk<'w, 'a> {
    run: &'w mut SolverRun<'a>,
    top: &'w Requirements,
    ctx: &'w SolverContext,
    path: VisitedPath,
    selections: Vec<ImplementationSelection>,
}

impl Walk<'_, '_> {
    fn select(&mut self, requirements: &Requirements, depth: usize) -> SolveResult<()> {
        self.ctx.cancel.check()?;
        if depth > self.ctx.config.max_depth {
            tracing::warn!(
                "dependency depth limit of {} reached at {requirements}",
                self.ctx.config.max_depth
            );
            return Err(SolveError::no_solution(requirements.interface.as_str()));
        }
        if self.path.contains(&requirements.interface) {
            tracing::debug!("cycle back to {}, treating as satisfied", requirements.interface);
            return Ok(());
        }

        let candidates = self.run.sorted_candidates(requirements)?;
        let Some(best) = candidates.iter().find(|c| c.is_suitable()) else {
            let command = requirements.command_name();
            if !candidates.is_empty()
                && candidates
                    .iter()
                    .all(|c| !c.implementation.contains_command(command))
            {
                return Err(SolveError::MissingCommand {
                    interface: requirements.interface.clone(),
                    command: command.to_string(),
                });
            }
            let report = RejectionReport::from_candidates(&requirements.interface, &candidates, "");
            return Err(SolveError::NoSolution {
                interface: requirements.interface.clone(),
                report: report.as_error_suffix(),
            });
        };

        if let Some(command) = best.implementation.get_command(requirements.command_name()) {
            check_command(command, &requirements.interface)?;
        }

        tracing::debug!("selected {} ({}) for {requirements}", best.version(), best.id());
        let index = self.selections.len();
        self.selections.push(best.to_selection(requirements));

        self.path.enter(&requirements.interface);
        let result = self.select_dependencies(index, best, requirements, depth);
        self.path.leave();
        result
    }

    fn select_dependencies(
        &mut self,
        index: usize,
        candidate: &SelectionCandidate,
        requirements: &Requirements,
        depth: usize,
    ) -> SolveResult<()> {
        let arch = &requirements.architecture;
        let imp = &candidate.implementation;
        let command_deps = imp
            .get_command(requirements.command_name())
            .map(|c| c.dependencies.as_slice())
            .unwrap_or_default();

        for dep in essential_first(imp.dependencies.iter().chain(command_deps), arch) {
            self.select_dependency(index, dep, depth)?;
        }
        for name in &imp.executable_commands {
            if self.selections[index].has_command(name) {
                continue;
            }
            let Some(command) = imp.get_command(name) else {
                return Err(SolveError::MissingCommand {
                    interface: requirements.interface.clone(),
                    command: name.clone(),
                });
            };
            check_command(command, &requirements.interface)?;
            let command = filter_command(command, arch);
            self.selections[index].commands.push(command.clone());
            for dep in essential_first(&command.dependencies, arch) {
                self.select_dependency(index, dep, depth)?;
            }
        }
        Ok(())
    }

    fn select_dependency(&mut self, index: usize, dep: &Dependency, depth: usize) -> SolveResult<()> {
        let mark = self.selections.len();
        for sub in self.top.for_dependency(dep) {
            match self.select(&sub, depth + 1) {
                Ok(()) => {}
                Err(e) if e.is_solver_failure() && !dep.is_essential() => {
                    tracing::debug!("dropping recommended dependency on {}: {e}", dep.interface);
                    self.selections.truncate(mark);
                    let owner = &mut self.selections[index];
                    owner.dependencies.retain(|d| d.interface != dep.interface);
                    for command in &mut owner.commands {
                        command.dependencies.retain(|d| d.interface != dep.interface);
                    }
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

fn check_command(command: &Command, interface: &str) -> SolveResult<()> {
    if let Some(runner) = &command.runner {
        return Err(SolveError::Unsupported {
            message: format!(
                "command '{}' of {interface} needs runner {}",
                command.name, runner.interface
            ),
        });
    }
    if !command.executable_commands.is_empty() {
        return Err(SolveError::Unsupported {
            message: format!(
                "command '{}' of {interface} exposes executables of its own; only implementations may",
                command.name
            ),
        });
    }
    Ok(())
}
