//! Flight instructor scheduling.
//!
//! Assigns students to qualified instructors for one period: every
//! instructor takes at most one student, every student gets at most one
//! instructor, pairs must share a course, and the number of pairs may not
//! exceed the available aircraft. The number of scheduled students is
//! maximized.
//!
//! # Key Components
//!
//! - **Model builder**: [`ModelBuilder`] / [`build_model`] — roster to [`ScheduleModel`]
//! - **Solving**: [`solve_model`] — runs an exact [`ilp`](crate::ilp) solver
//! - **Results**: [`ScheduleReport`] — assignment table, counts, utilization
//! - **Runner**: [`Scheduler`] — the whole pipeline, single or batch
//!
//! # Tie-break
//!
//! When several optimal schedules exist, the one pairing the earliest
//! instructor with the earliest compatible student (then the next, and so
//! on) is returned, regardless of the solver chosen.

mod builder;
mod config;
mod report;
mod runner;

pub use builder::{build_model, ModelBuilder, PairIndex, ScheduleModel};
pub use config::{ScheduleConfig, SolverKind};
pub use report::{AssignmentRow, CourseSummary, ScheduleReport};
pub use runner::{solve_model, verify_assignment, ScheduleRequest, Scheduler};
