//! Integer linear programming over binary variables.
//!
//! Provides a domain-agnostic model for expressing 0/1 optimization
//! problems with linear constraints, and two exact solvers for it.
//!
//! # Key Components
//!
//! - **Variables**: [`BinVar`] addressed by [`VarId`]
//! - **Constraints**: [`LinearConstraint`] — `Σ a·x (<=|==|>=) b`
//! - **Model**: [`IlpModel`] — container for variables, constraints, objective
//! - **Solvers**: [`IlpSolver`] trait with [`BranchAndBoundSolver`] (any
//!   model) and [`MatchingSolver`] (assignment-shaped models)
//!
//! # Design
//!
//! The layer knows nothing about what variables stand for. Callers keep
//! their own mapping from [`VarId`] to domain entities and read results
//! back through [`IlpSolution::value`].
//!
//! Both solvers break ties the same way: among optimal solutions they
//! return the lexicographically greatest 0/1 vector in variable order.
//!
//! # References
//!
//! Wolsey, L. A. (1998), "Integer Programming"

mod branch_bound;
mod matching;
mod model;
mod solver;
mod variables;

pub use branch_bound::BranchAndBoundSolver;
pub use matching::MatchingSolver;
pub use model::{IlpModel, LinearConstraint, Objective, Sense};
pub use solver::{IlpSolution, IlpSolver, SolverConfig, SolverStatus};
pub use variables::{BinVar, VarId};
