//! ILP solver interface and shared solution types.

use super::model::IlpModel;
use super::variables::VarId;
use std::time::Instant;

/// Status of the solver after execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolverStatus {
    /// Proven optimal solution found.
    Optimal,
    /// No feasible solution exists.
    Infeasible,
    /// Model is invalid or malformed.
    ModelInvalid,
    /// Solver exceeded its time limit before proving optimality.
    Timeout,
    /// Solver exceeded its node limit before proving optimality.
    NodeLimit,
    /// The model lies outside what this solver handles.
    Unsupported,
}

/// Solution from an ILP solver.
///
/// `values` is only populated when `status` is [`SolverStatus::Optimal`];
/// a solver never hands out an uncertified incumbent.
#[derive(Debug, Clone)]
pub struct IlpSolution {
    /// Solver status.
    pub status: SolverStatus,
    /// One value per variable, indexed by [`VarId`].
    pub values: Vec<bool>,
    /// Objective function value (if any).
    pub objective_value: Option<i64>,
    /// Search nodes (branch and bound) or augmenting searches (matching).
    pub nodes: u64,
    /// Solve time in milliseconds.
    pub solve_time_ms: u64,
}

impl IlpSolution {
    /// Creates an empty solution with the given status.
    pub fn empty(status: SolverStatus) -> Self {
        Self {
            status,
            values: Vec::new(),
            objective_value: None,
            nodes: 0,
            solve_time_ms: 0,
        }
    }

    /// Whether a certified optimal solution was found.
    pub fn is_optimal(&self) -> bool {
        self.status == SolverStatus::Optimal
    }

    /// Value of a variable, `false` when no solution is attached.
    pub fn value(&self, var: VarId) -> bool {
        self.values.get(var.index()).copied().unwrap_or(false)
    }

    pub(crate) fn finish(mut self, started: Instant, nodes: u64) -> Self {
        self.nodes = nodes;
        self.solve_time_ms = started.elapsed().as_millis() as u64;
        self
    }
}

/// Solver configuration.
///
/// # Examples
///
/// ```
/// use u_flightsched::ilp::SolverConfig;
///
/// let config = SolverConfig::default()
///     .with_time_limit_ms(500)
///     .with_node_limit(10_000);
/// assert_eq!(config.time_limit_ms, 500);
/// ```
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Maximum solve time in milliseconds.
    pub time_limit_ms: u64,
    /// Maximum number of search nodes.
    pub node_limit: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit_ms: 10_000,
            node_limit: 5_000_000,
        }
    }
}

impl SolverConfig {
    /// Sets the time limit in milliseconds.
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = ms;
        self
    }

    /// Sets the node limit.
    pub fn with_node_limit(mut self, nodes: u64) -> Self {
        self.node_limit = nodes;
        self
    }
}

/// Trait for ILP solver implementations.
///
/// Implementations are stateless between calls: everything a solve needs
/// lives on the stack of `solve`, so one solver value may serve
/// concurrent callers.
pub trait IlpSolver {
    /// Solves the model and returns a solution.
    fn solve(&self, model: &IlpModel, config: &SolverConfig) -> IlpSolution;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solver_config_default() {
        let config = SolverConfig::default();
        assert_eq!(config.time_limit_ms, 10_000);
        assert_eq!(config.node_limit, 5_000_000);
    }

    #[test]
    fn test_empty_solution() {
        let solution = IlpSolution::empty(SolverStatus::Timeout);
        assert!(!solution.is_optimal());
        assert!(!solution.value(VarId(0)));
        assert!(solution.values.is_empty());
    }
}
