//! Scheduling configuration.

use crate::ilp::SolverConfig;

/// Which exact solver runs the assignment model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolverKind {
    /// Augmenting-path b-matching ([`MatchingSolver`](crate::ilp::MatchingSolver)).
    #[default]
    Matching,
    /// Generic branch and bound ([`BranchAndBoundSolver`](crate::ilp::BranchAndBoundSolver)).
    BranchAndBound,
}

/// Configuration for a scheduling run.
///
/// # Examples
///
/// ```
/// use u_flightsched::schedule::{ScheduleConfig, SolverKind};
///
/// let config = ScheduleConfig::default()
///     .with_solver(SolverKind::BranchAndBound)
///     .with_time_limit_ms(2_000)
///     .with_reject_empty(true);
/// assert_eq!(config.solver, SolverKind::BranchAndBound);
/// assert_eq!(config.solver_config.time_limit_ms, 2_000);
/// ```
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    /// Solver implementation.
    pub solver: SolverKind,
    /// Resource bounds handed to the solver.
    pub solver_config: SolverConfig,
    /// Treat an empty instructor or student list as invalid input instead
    /// of a degenerate zero-assignment problem.
    pub reject_empty: bool,
    /// Re-check every scheduling invariant on the solver output.
    pub verify: bool,
    /// Solve batch requests in parallel (requires the `parallel` feature).
    pub parallel: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            solver: SolverKind::default(),
            solver_config: SolverConfig::default(),
            reject_empty: false,
            verify: true,
            parallel: false,
        }
    }
}

impl ScheduleConfig {
    /// Sets the solver implementation.
    pub fn with_solver(mut self, solver: SolverKind) -> Self {
        self.solver = solver;
        self
    }

    /// Sets the solver resource bounds.
    pub fn with_solver_config(mut self, solver_config: SolverConfig) -> Self {
        self.solver_config = solver_config;
        self
    }

    /// Sets the solver time limit in milliseconds.
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.solver_config.time_limit_ms = ms;
        self
    }

    /// Sets the solver node limit.
    pub fn with_node_limit(mut self, nodes: u64) -> Self {
        self.solver_config.node_limit = nodes;
        self
    }

    /// Enables or disables rejection of empty rosters.
    pub fn with_reject_empty(mut self, reject: bool) -> Self {
        self.reject_empty = reject;
        self
    }

    /// Enables or disables invariant verification.
    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Enables or disables parallel batch solving.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}
