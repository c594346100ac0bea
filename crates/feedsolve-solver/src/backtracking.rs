//! Exhaustive backtracking search.
//!
//! Every commit is recorded as a choice frame on an explicit stack. A frame
//! owns the selection (or added command) and the restrictions it introduced,
//! so backtracking a candidate is a single truncation back to the stack
//! height it started at.

use std::collections::HashMap;

use feedsolve_core::feed::{Command, Dependency, Restriction};
use feedsolve_core::requirements::Requirements;
use feedsolve_core::selection::{ImplementationSelection, Selections};
use feedsolve_core::version::ImplementationVersion;
use feedsolve_util::errors::{SolveError, SolveResult};

use crate::cancel::CancellationToken;
use crate::candidate::{command_restrictions, essential_first, filter_command, SelectionCandidate};
use crate::provider::SolverContext;
use crate::report::RejectionReport;
use crate::run::SolverRun;
use crate::Solver;

/// Finds a consistent set of selections, trying lower-ranked candidates
/// when a higher-ranked one leads to a conflict further down.
///
/// The first complete assignment wins; no attempt is made to find a better one.
#[derive(Clone)]
pub struct BacktrackingSolver {
    ctx: SolverContext,
}

impl BacktrackingSolver {
    pub fn new(ctx: SolverContext) -> Self {
        Self { ctx }
    }
}

impl Solver for BacktrackingSolver {
    fn solve_with_staleness(&self, requirements: &Requirements) -> SolveResult<(Selections, bool)> {
        requirements.validate()?;

        let mut run = SolverRun::new(&self.ctx);
        let mut report = None;
        for effective in requirements.effective() {
            let mut search = Search::new(&mut run, &effective, &self.ctx);
            if search.try_to_solve(&effective, 0)? {
                let selections = search.into_selections();
                return Ok((selections, run.stale_feeds()));
            }
            tracing::debug!("no solution for {effective}");
            report.get_or_insert_with(|| search.report());
        }

        Err(SolveError::NoSolution {
            interface: requirements.interface.clone(),
            report: report.unwrap_or_default().as_error_suffix(),
        })
    }
}

enum Frame {
    Selection {
        selection: ImplementationSelection,
        restrictions: Vec<Restriction>,
    },
    /// A command added to an earlier selection reached again through another path.
    AddedCommand {
        owner: usize,
        command: String,
        restrictions: Vec<Restriction>,
    },
}

impl Frame {
    fn restrictions(&self) -> &[Restriction] {
        match self {
            Self::Selection { restrictions, .. } | Self::AddedCommand { restrictions, .. } => {
                restrictions
            }
        }
    }
}

struct Search<'s, 'a> {
    run: &'s mut SolverRun<'a>,
    top: &'s Requirements,
    cancel: &'s CancellationToken,
    max_depth: usize,
    frames: Vec<Frame>,
    /// Interface to the index of its selection frame.
    selected: HashMap<String, usize>,
    top_candidates: Vec<SelectionCandidate>,
}

impl<'s, 'a> Search<'s, 'a> {
    fn new(run: &'s mut SolverRun<'a>, top: &'s Requirements, ctx: &'s SolverContext) -> Self {
        Self {
            run,
            top,
            cancel: &ctx.cancel,
            max_depth: ctx.config.max_depth,
            frames: Vec::new(),
            selected: HashMap::new(),
            top_candidates: Vec::new(),
        }
    }

    fn try_to_solve(&mut self, requirements: &Requirements, depth: usize) -> SolveResult<bool> {
        self.cancel.check()?;
        if depth > self.max_depth {
            tracing::warn!(
                "dependency depth limit of {} reached at {requirements}",
                self.max_depth
            );
            return Ok(false);
        }

        let candidates = self.run.sorted_candidates(requirements)?;
        if depth == 0 {
            self.top_candidates = candidates.clone();
        }
        let viable: Vec<SelectionCandidate> = candidates
            .into_iter()
            .filter(|c| self.is_viable(c, requirements))
            .collect();

        if let Some(&owner) = self.selected.get(&requirements.interface) {
            return self.revisit(owner, &viable, requirements, depth);
        }

        for candidate in &viable {
            let mark = self.frames.len();
            tracing::debug!(
                "trying {} ({}) for {requirements}",
                candidate.version(),
                candidate.id()
            );
            self.frames.push(Frame::Selection {
                selection: candidate.to_selection(requirements),
                restrictions: candidate.restrictions(requirements),
            });
            self.selected.insert(requirements.interface.clone(), mark);

            if self.solve_dependencies(mark, candidate, requirements, depth)? {
                return Ok(true);
            }
            tracing::debug!(
                "backtracking from {} ({}) for {requirements}",
                candidate.version(),
                candidate.id()
            );
            self.rollback(mark);
        }
        Ok(false)
    }

    /// Suitable, allowed by every recorded restriction on its interface, and
    /// not restricting any already-selected interface to something else.
    fn is_viable(&self, candidate: &SelectionCandidate, requirements: &Requirements) -> bool {
        if !candidate.is_suitable() {
            return false;
        }
        let excluded = self
            .frames
            .iter()
            .flat_map(Frame::restrictions)
            .any(|r| r.interface == requirements.interface && !r.allows(candidate.version()));
        if excluded {
            return false;
        }
        candidate
            .restrictions(requirements)
            .iter()
            .all(|r| self.selected_version(&r.interface).map_or(true, |v| r.allows(v)))
    }

    fn selected_version(&self, interface: &str) -> Option<&ImplementationVersion> {
        match self.frames.get(*self.selected.get(interface)?)? {
            Frame::Selection { selection, .. } => Some(&selection.version),
            Frame::AddedCommand { .. } => None,
        }
    }

    /// The interface was already selected on another path. Only accept if
    /// the existing choice still qualifies, adding the requested command to
    /// it when missing.
    fn revisit(
        &mut self,
        owner: usize,
        viable: &[SelectionCandidate],
        requirements: &Requirements,
        depth: usize,
    ) -> SolveResult<bool> {
        let command_name = requirements.command_name();
        let (existing_id, has_command) = match &self.frames[owner] {
            Frame::Selection { selection, .. } => {
                (selection.id.clone(), selection.has_command(command_name))
            }
            Frame::AddedCommand { .. } => return Ok(false),
        };
        let Some(candidate) = viable.iter().find(|c| c.id() == existing_id) else {
            tracing::debug!(
                "existing selection {existing_id} for {} does not satisfy {requirements}",
                requirements.interface
            );
            return Ok(false);
        };
        if has_command {
            return Ok(true);
        }
        let Some(command) = candidate.implementation.get_command(command_name) else {
            return Ok(false);
        };

        let arch = &requirements.architecture;
        let command = filter_command(command, arch);
        let mark = self.frames.len();
        if let Frame::Selection { selection, .. } = &mut self.frames[owner] {
            selection.commands.push(command.clone());
        }
        self.frames.push(Frame::AddedCommand {
            owner,
            command: command_name.to_string(),
            restrictions: command_restrictions(&command, arch),
        });

        if self.solve_command(owner, &command, depth)? {
            return Ok(true);
        }
        self.rollback(mark);
        Ok(false)
    }

    fn solve_dependencies(
        &mut self,
        owner: usize,
        candidate: &SelectionCandidate,
        requirements: &Requirements,
        depth: usize,
    ) -> SolveResult<bool> {
        let arch = &requirements.architecture;
        let imp = &candidate.implementation;
        for dep in essential_first(&imp.dependencies, arch) {
            if !self.solve_dependency(owner, dep, depth)? {
                return Ok(false);
            }
        }
        if let Some(command) = imp.get_command(requirements.command_name()) {
            if !self.solve_command(owner, &filter_command(command, arch), depth)? {
                return Ok(false);
            }
        }
        // Executable commands go through revisit, which adds them to the
        // selection just made.
        for name in &imp.executable_commands {
            let sub = self.top.for_own_command(&requirements.interface, name);
            if !self.try_to_solve(&sub, depth + 1)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn solve_command(&mut self, owner: usize, command: &Command, depth: usize) -> SolveResult<bool> {
        if !command.executable_commands.is_empty() {
            return Err(SolveError::Unsupported {
                message: format!(
                    "command '{}' exposes executables of its own; only implementations may",
                    command.name
                ),
            });
        }
        if let Some(runner) = &command.runner {
            let sub = self.top.for_runner(runner);
            if !self.try_to_solve(&sub, depth + 1)? {
                return Ok(false);
            }
        }
        for dep in essential_first(&command.dependencies, &self.top.architecture) {
            if !self.solve_dependency(owner, dep, depth)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn solve_dependency(&mut self, owner: usize, dep: &Dependency, depth: usize) -> SolveResult<bool> {
        let mark = self.frames.len();
        for sub in self.top.for_dependency(dep) {
            if self.try_to_solve(&sub, depth + 1)? {
                continue;
            }
            if dep.is_essential() {
                return Ok(false);
            }
            tracing::debug!("dropping unsatisfiable recommended dependency on {}", dep.interface);
            self.rollback(mark);
            self.drop_dependency(owner, &dep.interface);
            break;
        }
        Ok(true)
    }

    fn drop_dependency(&mut self, owner: usize, interface: &str) {
        if let Some(Frame::Selection { selection, .. }) = self.frames.get_mut(owner) {
            selection.dependencies.retain(|d| d.interface != interface);
            for command in &mut selection.commands {
                command.dependencies.retain(|d| d.interface != interface);
            }
        }
    }

    /// Pop every frame above `mark`, undoing exactly what was committed since.
    fn rollback(&mut self, mark: usize) {
        while self.frames.len() > mark {
            match self.frames.pop() {
                Some(Frame::Selection { selection, .. }) => {
                    self.selected.remove(&selection.interface);
                }
                Some(Frame::AddedCommand { owner, command, .. }) => {
                    if let Some(Frame::Selection { selection, .. }) = self.frames.get_mut(owner) {
                        selection.commands.retain(|c| c.name != command);
                    }
                }
                None => break,
            }
        }
    }

    fn report(&self) -> RejectionReport {
        RejectionReport::from_candidates(
            &self.top.interface,
            &self.top_candidates,
            "Its dependencies could not be satisfied",
        )
    }

    fn into_selections(self) -> Selections {
        let mut selections = Selections::new(self.top.interface.as_str(), self.top.command.clone());
        selections.implementations = self
            .frames
            .into_iter()
            .filter_map(|frame| match frame {
                Frame::Selection { selection, .. } => Some(selection),
                Frame::AddedCommand { .. } => None,
            })
            .collect();
        selections
    }
}
