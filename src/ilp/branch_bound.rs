//! Depth-first branch and bound over binary variables.
//!
//! # Algorithm
//!
//! 1. Propagate bounds on every constraint until a fixpoint is reached
//! 2. Prune the node when the relaxation bound cannot beat the incumbent
//! 3. Branch on the lowest-index free variable, trying 1 before 0
//!
//! Because 1 is tried first and only strict improvements replace the
//! incumbent, the returned optimum is the lexicographically greatest
//! optimal 0/1 vector in variable order.
//!
//! # Reference
//!
//! Land, A. H. & Doig, A. G. (1960). "An Automatic Method of Solving Discrete
//! Programming Problems", *Econometrica* 28(3), 497-520.

use std::cmp::Ordering;
use std::collections::{BTreeMap, VecDeque};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::model::{IlpModel, Objective, Sense};
use super::solver::{IlpSolution, IlpSolver, SolverConfig, SolverStatus};
use super::variables::VarId;

/// How often (in nodes) the wall clock is consulted.
const CLOCK_INTERVAL: u64 = 256;

/// Generic exact solver for binary integer linear programs.
///
/// Handles any mix of `<=`, `==` and `>=` constraints with integer
/// coefficients. Intended for models of up to a few hundred variables.
///
/// # Examples
///
/// ```
/// use u_flightsched::ilp::{BranchAndBoundSolver, IlpModel, IlpSolver, Objective, SolverConfig};
///
/// let mut model = IlpModel::new("knapsack");
/// let a = model.add_var();
/// let b = model.add_var();
/// let c = model.add_var();
/// model.add_at_most("pick two", vec![a, b, c], 2);
/// model.set_objective(Objective::Maximize { terms: vec![(a, 3), (b, 5), (c, 4)] });
///
/// let solution = BranchAndBoundSolver::new().solve(&model, &SolverConfig::default());
/// assert!(solution.is_optimal());
/// assert_eq!(solution.objective_value, Some(9));
/// ```
pub struct BranchAndBoundSolver;

impl BranchAndBoundSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BranchAndBoundSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl IlpSolver for BranchAndBoundSolver {
    fn solve(&self, model: &IlpModel, config: &SolverConfig) -> IlpSolution {
        let started = Instant::now();

        if let Err(reason) = model.validate() {
            debug!(model = %model.name, %reason, "rejecting invalid model");
            return IlpSolution::empty(SolverStatus::ModelInvalid).finish(started, 0);
        }

        // Internally always maximize.
        let (sign, terms): (i64, &[(VarId, i64)]) = match &model.objective {
            Some(Objective::Maximize { terms }) => (1, terms.as_slice()),
            Some(Objective::Minimize { terms }) => (-1, terms.as_slice()),
            None => (1, &[][..]),
        };
        let mut objective = vec![0i64; model.var_count()];
        for &(v, c) in terms {
            objective[v.index()] += sign * c;
        }

        let rows = model
            .constraints
            .iter()
            .map(|c| Row {
                terms: merge_terms(&c.terms),
                sense: c.sense,
                rhs: c.rhs,
            })
            .collect();

        let mut search = Search {
            rows,
            objective,
            node_limit: config.node_limit,
            time_limit: Duration::from_millis(config.time_limit_ms),
            started,
            nodes: 0,
            best: None,
            stopped: None,
        };
        search.dfs(model.vars.iter().map(|v| v.fixed).collect());

        let nodes = search.nodes;
        if let Some(status) = search.stopped {
            warn!(model = %model.name, ?status, nodes, "branch and bound stopped before proving optimality");
            return IlpSolution::empty(status).finish(started, nodes);
        }

        match search.best {
            Some((value, values)) => {
                debug!(model = %model.name, value, nodes, "branch and bound proved optimality");
                IlpSolution {
                    status: SolverStatus::Optimal,
                    values,
                    objective_value: model.objective.as_ref().map(|_| sign * value),
                    nodes: 0,
                    solve_time_ms: 0,
                }
                .finish(started, nodes)
            }
            None => IlpSolution::empty(SolverStatus::Infeasible).finish(started, nodes),
        }
    }
}

/// A constraint with merged, non-zero coefficients addressed by raw index.
struct Row {
    terms: Vec<(usize, i64)>,
    sense: Sense,
    rhs: i64,
}

impl Row {
    fn has_upper(&self) -> bool {
        matches!(self.sense, Sense::Le | Sense::Eq)
    }

    fn has_lower(&self) -> bool {
        matches!(self.sense, Sense::Ge | Sense::Eq)
    }

    /// Smallest and largest reachable left-hand side under `domain`.
    fn lhs_range(&self, domain: &[Option<bool>]) -> (i64, i64) {
        let (mut lo, mut hi) = (0, 0);
        for &(k, a) in &self.terms {
            match domain[k] {
                Some(true) => {
                    lo += a;
                    hi += a;
                }
                Some(false) => {}
                None if a < 0 => lo += a,
                None => hi += a,
            }
        }
        (lo, hi)
    }
}

fn merge_terms(terms: &[(VarId, i64)]) -> Vec<(usize, i64)> {
    let mut merged: BTreeMap<usize, i64> = BTreeMap::new();
    for &(v, a) in terms {
        *merged.entry(v.index()).or_default() += a;
    }
    merged.into_iter().filter(|&(_, a)| a != 0).collect()
}

struct Search {
    rows: Vec<Row>,
    objective: Vec<i64>,
    node_limit: u64,
    time_limit: Duration,
    started: Instant,
    nodes: u64,
    best: Option<(i64, Vec<bool>)>,
    stopped: Option<SolverStatus>,
}

impl Search {
    fn dfs(&mut self, mut domain: Vec<Option<bool>>) {
        if self.stopped.is_some() {
            return;
        }

        self.nodes += 1;
        if self.nodes > self.node_limit {
            self.stopped = Some(SolverStatus::NodeLimit);
            return;
        }
        if self.nodes % CLOCK_INTERVAL == 0 && self.started.elapsed() >= self.time_limit {
            self.stopped = Some(SolverStatus::Timeout);
            return;
        }

        if !self.propagate(&mut domain) {
            return;
        }

        if let Some((incumbent, _)) = &self.best {
            if self.upper_bound(&domain) <= *incumbent {
                return;
            }
        }

        match domain.iter().position(Option::is_none) {
            None => {
                let values: Vec<bool> = domain.iter().map(|v| *v == Some(true)).collect();
                let value: i64 = values
                    .iter()
                    .zip(&self.objective)
                    .filter(|(on, _)| **on)
                    .map(|(_, c)| c)
                    .sum();
                if self.best.as_ref().map_or(true, |(b, _)| value > *b) {
                    self.best = Some((value, values));
                }
            }
            Some(k) => {
                let mut one = domain.clone();
                one[k] = Some(true);
                self.dfs(one);

                domain[k] = Some(false);
                self.dfs(domain);
            }
        }
    }

    /// Bounds-consistency propagation. Returns `false` on a dead end.
    fn propagate(&self, domain: &mut [Option<bool>]) -> bool {
        loop {
            let mut changed = false;

            for row in &self.rows {
                let (lo, hi) = row.lhs_range(domain);
                if row.has_upper() && lo > row.rhs {
                    return false;
                }
                if row.has_lower() && hi < row.rhs {
                    return false;
                }

                for &(k, a) in &row.terms {
                    if domain[k].is_some() {
                        continue;
                    }
                    let forced = if row.has_upper() && lo + a.abs() > row.rhs {
                        // Any move raising the minimum breaks the row.
                        Some(a < 0)
                    } else if row.has_lower() && hi - a.abs() < row.rhs {
                        Some(a > 0)
                    } else {
                        None
                    };
                    if let Some(value) = forced {
                        domain[k] = Some(value);
                        changed = true;
                    }
                }
            }

            if !changed {
                return true;
            }
        }
    }

    /// Upper bound on the objective reachable below this node.
    ///
    /// Two relaxations of the open part are combined and the tighter one is
    /// kept:
    ///
    /// - a partition of the open variables among binding `<=` rows, each
    ///   row contributing its `cap` heaviest weights;
    /// - a cardinality bound from a max flow over the rows, taken as the sum
    ///   of that many heaviest open weights.
    ///
    /// The second one is exact on capped bipartite matchings with unit
    /// weights.
    fn upper_bound(&self, domain: &[Option<bool>]) -> i64 {
        let mut fixed = 0;
        for (k, v) in domain.iter().enumerate() {
            if *v == Some(true) {
                fixed += self.objective[k];
            }
        }

        let is_open = |k: usize| domain[k].is_none() && self.objective[k] > 0;
        let mut weights: Vec<i64> = (0..domain.len())
            .filter(|&k| is_open(k))
            .map(|k| self.objective[k])
            .collect();
        if weights.is_empty() {
            return fixed;
        }

        let mut packings = self.packings(domain, &is_open);

        // Most restrictive per covered variable first.
        let tighter = |x: &Packing, y: &Packing| -> Ordering {
            (x.cap * y.vars.len() as i64).cmp(&(y.cap * x.vars.len() as i64))
        };
        packings.sort_by(|x, y| tighter(x, y).then(x.row.cmp(&y.row)));
        let forward = grouped_bound(&self.objective, domain.len(), &packings, &is_open);
        packings.sort_by(|x, y| tighter(x, y).then(y.row.cmp(&x.row)));
        let backward = grouped_bound(&self.objective, domain.len(), &packings, &is_open);

        let count = cardinality_bound(domain.len(), weights.len(), &packings);
        weights.sort_unstable_by(|a, b| b.cmp(a));
        let heaviest: i64 = weights.iter().take(count).sum();

        fixed + forward.min(backward).min(heaviest)
    }

    /// Binding `<=` rows restricted to the open variables they can limit.
    fn packings(&self, domain: &[Option<bool>], is_open: &impl Fn(usize) -> bool) -> Vec<Packing> {
        let mut packings = Vec::new();
        for (r, row) in self.rows.iter().enumerate() {
            if !row.has_upper() {
                continue;
            }
            let mut min_a = i64::MAX;
            let mut vars = Vec::new();
            for &(k, a) in &row.terms {
                if a > 0 && is_open(k) {
                    min_a = min_a.min(a);
                    vars.push(k);
                }
            }
            if vars.is_empty() {
                continue;
            }
            let (lo, _) = row.lhs_range(domain);
            let cap = ((row.rhs - lo).max(0)) / min_a;
            if cap < vars.len() as i64 {
                packings.push(Packing { row: r, cap, vars });
            }
        }
        packings
    }
}

/// At most `cap` of `vars` can still be set to 1 without breaking `row`.
struct Packing {
    row: usize,
    cap: i64,
    vars: Vec<usize>,
}

fn grouped_bound(
    objective: &[i64],
    n: usize,
    packings: &[Packing],
    is_open: &impl Fn(usize) -> bool,
) -> i64 {
    let mut taken = vec![false; n];
    let mut bound = 0;

    for packing in packings {
        let mut weights: Vec<i64> = Vec::new();
        for &k in &packing.vars {
            if !taken[k] {
                taken[k] = true;
                weights.push(objective[k]);
            }
        }
        weights.sort_unstable_by(|a, b| b.cmp(a));
        bound += weights.iter().take(packing.cap as usize).sum::<i64>();
    }

    for k in 0..n {
        if is_open(k) && !taken[k] {
            bound += objective[k];
        }
    }
    bound
}

/// Most open variables any completion can set to 1.
///
/// Rows spanning every open variable act as a global cap. Each variable
/// keeps its first two remaining rows; when those rows two-color, the count
/// is a max flow through them with row capacities. Otherwise only the
/// global cap applies.
fn cardinality_bound(n: usize, open: usize, packings: &[Packing]) -> usize {
    let mut global = open as i64;
    let mut local: Vec<&Packing> = Vec::new();
    for packing in packings {
        if packing.vars.len() == open {
            global = global.min(packing.cap);
        } else {
            local.push(packing);
        }
    }

    let mut membership: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (r, packing) in local.iter().enumerate() {
        for &k in &packing.vars {
            if membership[k].len() < 2 {
                membership[k].push(r);
            }
        }
    }

    // Two-color the rows; `true` feeds the sink.
    let mut side: Vec<Option<bool>> = vec![None; local.len()];
    for start in 0..local.len() {
        if side[start].is_some() {
            continue;
        }
        side[start] = Some(false);
        let mut queue = VecDeque::from([start]);
        while let Some(r) = queue.pop_front() {
            let here = side[r] == Some(true);
            for &k in &local[r].vars {
                let &[a, b] = membership[k].as_slice() else {
                    continue;
                };
                let other = if a == r { b } else { a };
                match side[other] {
                    None => {
                        side[other] = Some(!here);
                        queue.push_back(other);
                    }
                    Some(s) if s == here => return global as usize,
                    Some(_) => {}
                }
            }
        }
    }

    let mut graph = FlowGraph::new(2 + local.len());
    for (r, packing) in local.iter().enumerate() {
        let cap = packing.cap.min(packing.vars.len() as i64);
        if side[r] == Some(true) {
            graph.add_edge(2 + r, SINK, cap);
        } else {
            graph.add_edge(SOURCE, 2 + r, cap);
        }
    }

    let mut seen = vec![false; n];
    for packing in &local {
        for &k in &packing.vars {
            if seen[k] {
                continue;
            }
            seen[k] = true;
            match membership[k].as_slice() {
                &[a] if side[a] == Some(true) => graph.add_edge(SOURCE, 2 + a, 1),
                &[a] => graph.add_edge(2 + a, SINK, 1),
                &[a, b] if side[a] == Some(true) => graph.add_edge(2 + b, 2 + a, 1),
                &[a, b] => graph.add_edge(2 + a, 2 + b, 1),
                _ => {}
            }
        }
    }
    // Open variables outside every local row.
    let unconstrained = open as i64 - seen.iter().filter(|&&s| s).count() as i64;

    let routed = graph.max_flow((global - unconstrained).max(0));
    global.min(unconstrained + routed) as usize
}

const SOURCE: usize = 0;
const SINK: usize = 1;

/// Residual graph for Edmonds-Karp max flow.
struct FlowGraph {
    adjacent: Vec<Vec<usize>>,
    to: Vec<usize>,
    residual: Vec<i64>,
}

impl FlowGraph {
    fn new(nodes: usize) -> Self {
        Self {
            adjacent: vec![Vec::new(); nodes],
            to: Vec::new(),
            residual: Vec::new(),
        }
    }

    fn add_edge(&mut self, from: usize, to: usize, cap: i64) {
        self.adjacent[from].push(self.to.len());
        self.to.push(to);
        self.residual.push(cap);
        self.adjacent[to].push(self.to.len());
        self.to.push(from);
        self.residual.push(0);
    }

    /// Flow from [`SOURCE`] to [`SINK`], stopping once `limit` is reached.
    fn max_flow(&mut self, limit: i64) -> i64 {
        let nodes = self.adjacent.len();
        let mut flow = 0;
        while flow < limit {
            let mut via: Vec<Option<usize>> = vec![None; nodes];
            let mut seen = vec![false; nodes];
            seen[SOURCE] = true;
            let mut queue = VecDeque::from([SOURCE]);
            while let Some(u) = queue.pop_front() {
                if u == SINK {
                    break;
                }
                for &e in &self.adjacent[u] {
                    let v = self.to[e];
                    if !seen[v] && self.residual[e] > 0 {
                        seen[v] = true;
                        via[v] = Some(e);
                        queue.push_back(v);
                    }
                }
            }
            if !seen[SINK] {
                break;
            }

            let mut push = limit - flow;
            let mut v = SINK;
            while let Some(e) = via[v] {
                push = push.min(self.residual[e]);
                v = self.to[e ^ 1];
            }
            let mut v = SINK;
            while let Some(e) = via[v] {
                self.residual[e] -= push;
                self.residual[e ^ 1] += push;
                v = self.to[e ^ 1];
            }
            flow += push;
        }
        flow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ilp::LinearConstraint;

    fn solve(model: &IlpModel) -> IlpSolution {
        BranchAndBoundSolver::new().solve(model, &SolverConfig::default())
    }

    #[test]
    fn test_weighted_selection() {
        let mut model = IlpModel::new("test");
        let vars: Vec<VarId> = (0..4).map(|_| model.add_var()).collect();
        model.add_at_most("two", vars.clone(), 2);
        model.set_objective(Objective::Maximize {
            terms: vec![(vars[0], 1), (vars[1], 7), (vars[2], 3), (vars[3], 7)],
        });

        let solution = solve(&model);

        assert!(solution.is_optimal());
        assert_eq!(solution.objective_value, Some(14));
        assert_eq!(solution.values, vec![false, true, false, true]);
    }

    #[test]
    fn test_minimize_with_cover() {
        // Cover both rows with the cheapest pick.
        let mut model = IlpModel::new("cover");
        let a = model.add_var();
        let b = model.add_var();
        let c = model.add_var();
        for (label, vars) in [("r1", vec![a, c]), ("r2", vec![b, c])] {
            model.add_constraint(LinearConstraint {
                label: label.into(),
                terms: vars.into_iter().map(|v| (v, 1)).collect(),
                sense: Sense::Ge,
                rhs: 1,
            });
        }
        model.set_objective(Objective::Minimize {
            terms: vec![(a, 2), (b, 2), (c, 3)],
        });

        let solution = solve(&model);

        assert!(solution.is_optimal());
        assert_eq!(solution.objective_value, Some(3));
        assert_eq!(solution.values, vec![false, false, true]);
    }

    #[test]
    fn test_equality_row() {
        let mut model = IlpModel::new("eq");
        let vars: Vec<VarId> = (0..3).map(|_| model.add_var()).collect();
        model.add_constraint(LinearConstraint {
            label: "exactly two".into(),
            terms: vars.iter().map(|&v| (v, 1)).collect(),
            sense: Sense::Eq,
            rhs: 2,
        });
        model.set_objective(Objective::Minimize {
            terms: vars.iter().map(|&v| (v, 1)).collect(),
        });

        let solution = solve(&model);

        assert!(solution.is_optimal());
        assert_eq!(solution.values.iter().filter(|&&v| v).count(), 2);
        assert_eq!(model.first_violation(&solution.values), None);
    }

    #[test]
    fn test_infeasible() {
        let mut model = IlpModel::new("infeasible");
        let a = model.add_var();
        model.add_fix("on", a, true);
        model.add_fix("off", a, false);

        let solution = solve(&model);

        assert_eq!(solution.status, SolverStatus::Infeasible);
        assert!(solution.values.is_empty());
    }

    #[test]
    fn test_fixed_variables_respected() {
        let mut model = IlpModel::new("fixed");
        let a = model.add_fixed_var(false);
        let b = model.add_var();
        model.set_objective(Objective::Maximize {
            terms: vec![(a, 10), (b, 1)],
        });

        let solution = solve(&model);

        assert_eq!(solution.values, vec![false, true]);
        assert_eq!(solution.objective_value, Some(1));
    }

    #[test]
    fn test_lexicographic_tie_break() {
        // Any single variable is optimal; the lowest index must win.
        let mut model = IlpModel::new("tie");
        let vars: Vec<VarId> = (0..5).map(|_| model.add_var()).collect();
        model.add_at_most("one", vars.clone(), 1);
        model.set_objective(Objective::Maximize {
            terms: vars.iter().map(|&v| (v, 1)).collect(),
        });

        let solution = solve(&model);

        assert_eq!(solution.values, vec![true, false, false, false, false]);
    }

    #[test]
    fn test_no_objective_finds_feasible_point() {
        let mut model = IlpModel::new("feasibility");
        let a = model.add_var();
        let b = model.add_var();
        model.add_constraint(LinearConstraint {
            label: "a + b >= 1".into(),
            terms: vec![(a, 1), (b, 1)],
            sense: Sense::Ge,
            rhs: 1,
        });

        let solution = solve(&model);

        assert!(solution.is_optimal());
        assert_eq!(solution.objective_value, None);
        assert_eq!(model.first_violation(&solution.values), None);
    }

    #[test]
    fn test_node_limit() {
        let mut model = IlpModel::new("big");
        let vars: Vec<VarId> = (0..30).map(|_| model.add_var()).collect();
        model.set_objective(Objective::Maximize {
            terms: vars.iter().map(|&v| (v, 1)).collect(),
        });

        let config = SolverConfig::default().with_node_limit(3);
        let solution = BranchAndBoundSolver::new().solve(&model, &config);

        assert_eq!(solution.status, SolverStatus::NodeLimit);
        assert!(solution.values.is_empty());
    }

    #[test]
    fn test_invalid_model() {
        let mut model = IlpModel::new("invalid");
        model.add_at_most("dangling", vec![VarId(9)], 1);

        let solution = solve(&model);

        assert_eq!(solution.status, SolverStatus::ModelInvalid);
    }

    #[test]
    fn test_negative_coefficients() {
        // a - b <= 0 means a implies b.
        let mut model = IlpModel::new("implication");
        let a = model.add_var();
        let b = model.add_var();
        model.add_constraint(LinearConstraint {
            label: "a implies b".into(),
            terms: vec![(a, 1), (b, -1)],
            sense: Sense::Le,
            rhs: 0,
        });
        model.set_objective(Objective::Maximize {
            terms: vec![(a, 5), (b, -2)],
        });

        let solution = solve(&model);

        assert_eq!(solution.values, vec![true, true]);
        assert_eq!(solution.objective_value, Some(3));
    }

    /// Dense `n x n` assignment with a cardinality cap, row-major variables.
    fn assignment(n: usize, cap: i64) -> IlpModel {
        let mut model = IlpModel::new("assignment");
        let vars: Vec<VarId> = (0..n * n).map(|_| model.add_var()).collect();
        for i in 0..n {
            model.add_at_most(format!("row {i}"), vars[i * n..(i + 1) * n].to_vec(), 1);
        }
        for j in 0..n {
            model.add_at_most(format!("col {j}"), (0..n).map(|i| vars[i * n + j]).collect(), 1);
        }
        model.add_at_most("cap", vars.clone(), cap);
        model.set_objective(Objective::Maximize {
            terms: vars.iter().map(|&v| (v, 1)).collect(),
        });
        model
    }

    #[test]
    fn test_assignment_bound_proves_optimality_quickly() {
        let model = assignment(15, 12);

        let solution = solve(&model);

        assert!(solution.is_optimal());
        assert_eq!(solution.objective_value, Some(12));
        assert!(solution.nodes < 200, "explored {} nodes", solution.nodes);
        for i in 0..12 {
            assert!(solution.values[i * 15 + i]);
        }
        assert_eq!(solution.values.iter().filter(|&&v| v).count(), 12);
    }

    #[test]
    fn test_cardinality_bound_uses_flow() {
        // Rows 0 and 1 admit one variable each; row 2 only links x0 and x2.
        let packings = vec![
            Packing { row: 0, cap: 1, vars: vec![0, 1] },
            Packing { row: 1, cap: 1, vars: vec![2, 3] },
            Packing { row: 2, cap: 1, vars: vec![0, 2] },
        ];
        assert_eq!(cardinality_bound(4, 4, &packings), 2);

        let capped = vec![Packing { row: 0, cap: 1, vars: vec![0, 1, 2, 3] }];
        assert_eq!(cardinality_bound(4, 4, &capped), 1);
    }

    #[test]
    fn test_flow_graph() {
        let mut graph = FlowGraph::new(4);
        graph.add_edge(SOURCE, 2, 3);
        graph.add_edge(SOURCE, 3, 1);
        graph.add_edge(2, SINK, 1);
        graph.add_edge(2, 3, 2);
        graph.add_edge(3, SINK, 5);

        assert_eq!(graph.max_flow(i64::MAX), 4);
    }

    #[test]
    fn test_merge_terms() {
        let merged = merge_terms(&[(VarId(2), 1), (VarId(0), 3), (VarId(2), -1)]);
        assert_eq!(merged, vec![(0, 3)]);
    }
}
