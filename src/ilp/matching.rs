//! Maximum-cardinality bipartite b-matching with a global cardinality cap.
//!
//! # Recognition
//!
//! A model qualifies when, ignoring variables fixed to 0:
//!
//! - the objective maximizes the plain sum of the variables,
//! - every constraint is `Σ x <= b` with unit coefficients,
//! - constraints spanning every variable act as cardinality caps,
//! - every variable sits in at most two of the remaining rows, and those
//!   rows two-color (rows sharing a variable get opposite sides).
//!
//! Rows then become capacitated nodes of a bipartite graph and variables
//! become its edges.
//!
//! # Algorithm
//!
//! 1. Compute the optimum `k` with augmenting paths, stopping at the cap
//! 2. Walk the edges in variable order; keep an edge when the rest of the
//!    graph still matches `k - 1` more pairs
//!
//! Step 2 yields the lexicographically greatest optimal 0/1 vector, the
//! same optimum [`BranchAndBoundSolver`](super::BranchAndBoundSolver)
//! returns.
//!
//! # Reference
//!
//! Ford, L. R. & Fulkerson, D. R. (1956). "Maximal flow through a network",
//! *Canadian Journal of Mathematics* 8, 399-404.

use std::collections::{BTreeMap, VecDeque};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::model::{IlpModel, Objective, Sense};
use super::solver::{IlpSolution, IlpSolver, SolverConfig, SolverStatus};

/// How often (in augmenting searches) the wall clock is consulted.
const CLOCK_INTERVAL: u64 = 64;

/// Combinatorial solver for assignment-shaped models.
///
/// Returns [`SolverStatus::Unsupported`] for models outside the recognized
/// structure; callers can fall back to the generic branch and bound.
///
/// # Examples
///
/// ```
/// use u_flightsched::ilp::{IlpModel, IlpSolver, MatchingSolver, Objective, SolverConfig};
///
/// // Two workers, two jobs, worker 1 can only take job 0.
/// let mut model = IlpModel::new("assign");
/// let w0j0 = model.add_var();
/// let w0j1 = model.add_var();
/// let w1j0 = model.add_var();
/// let w1j1 = model.add_fixed_var(false);
/// model.add_at_most("worker 0", vec![w0j0, w0j1], 1);
/// model.add_at_most("worker 1", vec![w1j0, w1j1], 1);
/// model.add_at_most("job 0", vec![w0j0, w1j0], 1);
/// model.add_at_most("job 1", vec![w0j1, w1j1], 1);
/// model.set_objective(Objective::Maximize {
///     terms: vec![(w0j0, 1), (w0j1, 1), (w1j0, 1), (w1j1, 1)],
/// });
///
/// let solution = MatchingSolver::new().solve(&model, &SolverConfig::default());
/// assert!(solution.is_optimal());
/// assert_eq!(solution.values, vec![false, true, true, false]);
/// ```
pub struct MatchingSolver;

impl MatchingSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MatchingSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl IlpSolver for MatchingSolver {
    fn solve(&self, model: &IlpModel, config: &SolverConfig) -> IlpSolution {
        let started = Instant::now();

        if let Err(reason) = model.validate() {
            debug!(model = %model.name, %reason, "rejecting invalid model");
            return IlpSolution::empty(SolverStatus::ModelInvalid).finish(started, 0);
        }

        let network = match Network::recognize(model) {
            Ok(network) => network,
            Err(Rejection::Unsupported(reason)) => {
                debug!(model = %model.name, %reason, "model is not a bipartite b-matching");
                return IlpSolution::empty(SolverStatus::Unsupported).finish(started, 0);
            }
            Err(Rejection::Infeasible(label)) => {
                debug!(model = %model.name, %label, "row can never be satisfied");
                return IlpSolution::empty(SolverStatus::Infeasible).finish(started, 0);
            }
        };

        let mut budget = Budget {
            searches: 0,
            node_limit: config.node_limit,
            time_limit: Duration::from_millis(config.time_limit_ms),
            started,
        };

        match network.lexicographic_optimum(&mut budget) {
            Ok(chosen) => {
                let mut values = vec![false; model.var_count()];
                for (edge, &on) in network.edges.iter().zip(&chosen) {
                    values[edge.var] = on;
                }
                let value = chosen.iter().filter(|&&on| on).count() as i64;
                debug!(model = %model.name, value, searches = budget.searches, "matching is optimal");
                IlpSolution {
                    status: SolverStatus::Optimal,
                    values,
                    objective_value: Some(value),
                    nodes: 0,
                    solve_time_ms: 0,
                }
                .finish(started, budget.searches)
            }
            Err(status) => {
                warn!(model = %model.name, ?status, searches = budget.searches, "matching stopped before proving optimality");
                IlpSolution::empty(status).finish(started, budget.searches)
            }
        }
    }
}

enum Rejection {
    Unsupported(String),
    Infeasible(String),
}

struct Budget {
    searches: u64,
    node_limit: u64,
    time_limit: Duration,
    started: Instant,
}

impl Budget {
    fn tick(&mut self) -> Result<(), SolverStatus> {
        self.searches += 1;
        if self.searches > self.node_limit {
            return Err(SolverStatus::NodeLimit);
        }
        if self.searches % CLOCK_INTERVAL == 0 && self.started.elapsed() >= self.time_limit {
            return Err(SolverStatus::Timeout);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct Edge {
    var: usize,
    left: usize,
    right: usize,
}

/// Bipartite graph with node capacities, edges in variable order.
struct Network {
    left_cap: Vec<i64>,
    right_cap: Vec<i64>,
    edges: Vec<Edge>,
    left_edges: Vec<Vec<usize>>,
    right_edges: Vec<Vec<usize>>,
    cap: i64,
}

impl Network {
    fn recognize(model: &IlpModel) -> Result<Self, Rejection> {
        let n = model.var_count();

        let Some(Objective::Maximize { terms }) = &model.objective else {
            return Err(Rejection::Unsupported("objective must be a maximization".into()));
        };
        let mut weight = vec![0i64; n];
        for &(v, c) in terms {
            weight[v.index()] += c;
        }

        let mut active = vec![false; n];
        for (k, var) in model.vars.iter().enumerate() {
            match var.fixed {
                Some(true) => {
                    return Err(Rejection::Unsupported(format!("x{k} is fixed to 1")));
                }
                Some(false) => {}
                None if weight[k] == 1 => active[k] = true,
                None => {
                    return Err(Rejection::Unsupported(format!(
                        "x{k} has objective weight {}, expected 1",
                        weight[k]
                    )));
                }
            }
        }
        let active_count = active.iter().filter(|&&a| a).count();

        let mut cap = active_count as i64;
        let mut rows: Vec<(Vec<usize>, i64)> = Vec::new();
        for c in &model.constraints {
            let mut merged: BTreeMap<usize, i64> = BTreeMap::new();
            for &(v, a) in &c.terms {
                if active[v.index()] {
                    *merged.entry(v.index()).or_default() += a;
                }
            }
            merged.retain(|_, a| *a != 0);

            if merged.is_empty() {
                let holds = match c.sense {
                    Sense::Le => 0 <= c.rhs,
                    Sense::Eq => 0 == c.rhs,
                    Sense::Ge => 0 >= c.rhs,
                };
                if holds {
                    continue;
                }
                return Err(Rejection::Infeasible(c.label.clone()));
            }
            if c.sense != Sense::Le {
                return Err(Rejection::Unsupported(format!(
                    "row '{}' is not a <= row",
                    c.label
                )));
            }
            if merged.values().any(|&a| a != 1) {
                return Err(Rejection::Unsupported(format!(
                    "row '{}' has non-unit coefficients",
                    c.label
                )));
            }
            if c.rhs < 0 {
                return Err(Rejection::Infeasible(c.label.clone()));
            }

            if merged.len() == active_count {
                cap = cap.min(c.rhs);
            } else {
                rows.push((merged.into_keys().collect(), c.rhs));
            }
        }

        let mut membership: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (r, (vars, _)) in rows.iter().enumerate() {
            for &k in vars {
                membership[k].push(r);
                if membership[k].len() > 2 {
                    return Err(Rejection::Unsupported(format!(
                        "x{k} appears in more than two rows"
                    )));
                }
            }
        }

        // Two-color the rows; `true` is the right side.
        let mut side: Vec<Option<bool>> = vec![None; rows.len()];
        for start in 0..rows.len() {
            if side[start].is_some() {
                continue;
            }
            side[start] = Some(false);
            let mut queue = VecDeque::from([start]);
            while let Some(r) = queue.pop_front() {
                let here = side[r].unwrap_or(false);
                for &k in &rows[r].0 {
                    if let &[a, b] = membership[k].as_slice() {
                        let other = if a == r { b } else { a };
                        match side[other] {
                            None => {
                                side[other] = Some(!here);
                                queue.push_back(other);
                            }
                            Some(s) if s == here => {
                                return Err(Rejection::Unsupported(
                                    "rows do not form a bipartite graph".into(),
                                ));
                            }
                            Some(_) => {}
                        }
                    }
                }
            }
        }

        let mut left_cap = Vec::new();
        let mut right_cap = Vec::new();
        let mut node_of = vec![0usize; rows.len()];
        for (r, (_, rhs)) in rows.iter().enumerate() {
            let caps = if side[r] == Some(true) {
                &mut right_cap
            } else {
                &mut left_cap
            };
            node_of[r] = caps.len();
            caps.push(*rhs);
        }

        let mut edges = Vec::with_capacity(active_count);
        for k in (0..n).filter(|&k| active[k]) {
            let mut left = None;
            let mut right = None;
            for &r in &membership[k] {
                if side[r] == Some(true) {
                    right = Some(node_of[r]);
                } else {
                    left = Some(node_of[r]);
                }
            }
            let left = left.unwrap_or_else(|| {
                left_cap.push(1);
                left_cap.len() - 1
            });
            let right = right.unwrap_or_else(|| {
                right_cap.push(1);
                right_cap.len() - 1
            });
            edges.push(Edge { var: k, left, right });
        }

        let mut left_edges = vec![Vec::new(); left_cap.len()];
        let mut right_edges = vec![Vec::new(); right_cap.len()];
        for (e, edge) in edges.iter().enumerate() {
            left_edges[edge.left].push(e);
            right_edges[edge.right].push(e);
        }

        Ok(Self {
            left_cap,
            right_cap,
            edges,
            left_edges,
            right_edges,
            cap,
        })
    }

    /// Picks edges greedily in order, keeping one whenever the optimum
    /// survives the choice.
    fn lexicographic_optimum(&self, budget: &mut Budget) -> Result<Vec<bool>, SolverStatus> {
        let mut left = self.left_cap.clone();
        let mut right = self.right_cap.clone();
        let mut chosen = vec![false; self.edges.len()];

        let mut remaining = self.max_flow(&left, &right, &chosen, self.cap, budget)?;
        debug!(optimum = remaining, edges = self.edges.len(), "matching optimum found");

        for e in 0..self.edges.len() {
            if remaining == 0 {
                break;
            }
            let Edge { left: l, right: r, .. } = self.edges[e];
            if left[l] == 0 || right[r] == 0 {
                continue;
            }

            left[l] -= 1;
            right[r] -= 1;
            chosen[e] = true;
            if 1 + self.max_flow(&left, &right, &chosen, remaining - 1, budget)? == remaining {
                remaining -= 1;
            } else {
                left[l] += 1;
                right[r] += 1;
                chosen[e] = false;
            }
        }

        debug_assert_eq!(remaining, 0);
        Ok(chosen)
    }

    /// Maximum flow up to `limit` over edges not in `excluded`.
    fn max_flow(
        &self,
        left_cap: &[i64],
        right_cap: &[i64],
        excluded: &[bool],
        limit: i64,
        budget: &mut Budget,
    ) -> Result<i64, SolverStatus> {
        let mut state = FlowState {
            left_cap,
            right_cap,
            excluded,
            left_used: vec![0; left_cap.len()],
            right_used: vec![0; right_cap.len()],
            on: vec![false; self.edges.len()],
            seen_left: Vec::new(),
            seen_right: Vec::new(),
        };

        let mut flow = 0;
        while flow < limit {
            budget.tick()?;
            state.seen_left = vec![false; left_cap.len()];
            state.seen_right = vec![false; right_cap.len()];

            let start = (0..left_cap.len()).find(|&l| {
                state.left_used[l] < state.left_cap[l]
                    && !state.seen_left[l]
                    && self.augment(l, &mut state)
            });
            match start {
                Some(l) => {
                    state.left_used[l] += 1;
                    flow += 1;
                }
                None => break,
            }
        }
        Ok(flow)
    }

    /// Depth-first search for an augmenting path starting at left node `l`.
    fn augment(&self, l: usize, state: &mut FlowState<'_>) -> bool {
        state.seen_left[l] = true;
        for &e in &self.left_edges[l] {
            if state.excluded[e] || state.on[e] {
                continue;
            }
            let r = self.edges[e].right;
            if state.seen_right[r] {
                continue;
            }
            state.seen_right[r] = true;

            if state.right_used[r] < state.right_cap[r] {
                state.right_used[r] += 1;
                state.on[e] = true;
                return true;
            }

            for &back in &self.right_edges[r] {
                if !state.on[back] {
                    continue;
                }
                let l2 = self.edges[back].left;
                if !state.seen_left[l2] && self.augment(l2, state) {
                    state.on[back] = false;
                    state.on[e] = true;
                    return true;
                }
            }
        }
        false
    }
}

struct FlowState<'a> {
    left_cap: &'a [i64],
    right_cap: &'a [i64],
    excluded: &'a [bool],
    left_used: Vec<i64>,
    right_used: Vec<i64>,
    on: Vec<bool>,
    seen_left: Vec<bool>,
    seen_right: Vec<bool>,
}
