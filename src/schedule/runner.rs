//! Scheduling execution pipeline.
//!
//! # Pipeline
//!
//! 1. Validate the roster and build the assignment model
//! 2. Solve it with the configured exact solver
//! 3. Re-check every scheduling invariant on the returned values
//! 4. Extract the report
//!
//! Each run owns its model and solver; nothing is shared between runs.

use tracing::{debug, info};

use crate::domain::{Instructor, Student};
use crate::error::{Result, ScheduleError};
use crate::ilp::{
    BranchAndBoundSolver, IlpSolution, IlpSolver, MatchingSolver, SolverStatus,
};

use super::builder::{ModelBuilder, ScheduleModel};
use super::config::{ScheduleConfig, SolverKind};
use super::report::ScheduleReport;

/// One independent scheduling problem.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScheduleRequest {
    pub instructors: Vec<Instructor>,
    pub students: Vec<Student>,
    pub aircraft_capacity: i64,
}

/// Scheduling runner.
pub struct Scheduler;

impl Scheduler {
    /// Schedules one period.
    ///
    /// # Examples
    ///
    /// ```
    /// use u_flightsched::domain::default_roster;
    /// use u_flightsched::schedule::{ScheduleConfig, Scheduler};
    ///
    /// let (instructors, students) = default_roster(3, 5);
    /// let report = Scheduler::run(&instructors, &students, 3, &ScheduleConfig::default()).unwrap();
    ///
    /// assert_eq!(report.assigned_count, 3);
    /// assert_eq!(report.unassigned_count, 2);
    /// assert_eq!(report.aircraft_utilization_pct().unwrap(), 100.0);
    /// ```
    pub fn run(
        instructors: &[Instructor],
        students: &[Student],
        aircraft_capacity: i64,
        config: &ScheduleConfig,
    ) -> Result<ScheduleReport> {
        let model = ModelBuilder::new()
            .with_reject_empty(config.reject_empty)
            .build(instructors, students, aircraft_capacity)?;

        let solution = solve_model(&model, config)?;
        if config.verify {
            verify_assignment(instructors, students, &model, &solution)?;
        }

        let report = ScheduleReport::extract(instructors, students, &model, &solution)?;
        info!(
            assigned = report.assigned_count,
            unassigned = report.unassigned_count,
            nodes = solution.nodes,
            elapsed_ms = solution.solve_time_ms,
            "schedule solved"
        );
        Ok(report)
    }

    /// Schedules a single request.
    pub fn run_request(request: &ScheduleRequest, config: &ScheduleConfig) -> Result<ScheduleReport> {
        Self::run(
            &request.instructors,
            &request.students,
            request.aircraft_capacity,
            config,
        )
    }

    /// Schedules independent requests, one result per request in order.
    ///
    /// With the `parallel` feature and `config.parallel` set, requests are
    /// spread over the rayon thread pool.
    pub fn run_batch(
        requests: &[ScheduleRequest],
        config: &ScheduleConfig,
    ) -> Vec<Result<ScheduleReport>> {
        #[cfg(feature = "parallel")]
        if config.parallel {
            use rayon::prelude::*;
            return requests
                .par_iter()
                .map(|request| Self::run_request(request, config))
                .collect();
        }

        requests
            .iter()
            .map(|request| Self::run_request(request, config))
            .collect()
    }
}

/// Runs the configured solver and insists on a certified optimum.
///
/// When the matching solver does not recognize the model, the generic
/// branch and bound takes over.
pub fn solve_model(model: &ScheduleModel, config: &ScheduleConfig) -> Result<IlpSolution> {
    let ilp = model.ilp();
    let mut solution = match config.solver {
        SolverKind::Matching => MatchingSolver::new().solve(ilp, &config.solver_config),
        SolverKind::BranchAndBound => BranchAndBoundSolver::new().solve(ilp, &config.solver_config),
    };
    if solution.status == SolverStatus::Unsupported {
        debug!("matching solver declined the model, falling back to branch and bound");
        solution = BranchAndBoundSolver::new().solve(ilp, &config.solver_config);
    }

    match solution.status {
        SolverStatus::Optimal => Ok(solution),
        status => Err(ScheduleError::Solver {
            status,
            detail: match status {
                SolverStatus::Timeout => format!(
                    "no proven optimum within {} ms",
                    config.solver_config.time_limit_ms
                ),
                SolverStatus::NodeLimit => format!(
                    "no proven optimum within {} nodes",
                    config.solver_config.node_limit
                ),
                _ => format!("model '{}' could not be solved", ilp.name),
            },
        }),
    }
}

/// Checks scheduling invariants on solver output.
///
/// - every value is 0/1 and present for every pair,
/// - each instructor teaches at most one student,
/// - each student has at most one instructor,
/// - only qualified pairs are assigned,
/// - the number of pairs fits the aircraft ceiling.
///
/// `instructors` and `students` must be the lists `model` was built from.
pub fn verify_assignment(
    instructors: &[Instructor],
    students: &[Student],
    model: &ScheduleModel,
    solution: &IlpSolution,
) -> Result<()> {
    model.check_roster(instructors, students)?;
    if solution.values.len() != model.ilp().var_count() {
        return Err(ScheduleError::InvariantViolated {
            invariant: "binary decision per pair",
            detail: format!(
                "expected {} values, got {}",
                model.ilp().var_count(),
                solution.values.len()
            ),
        });
    }

    let mut per_instructor = vec![0usize; instructors.len()];
    let mut per_student = vec![0usize; students.len()];
    let mut total = 0usize;

    for pair in model.pairs() {
        if !solution.value(model.var(pair.instructor, pair.student)) {
            continue;
        }
        let instructor = &instructors[pair.instructor];
        let student = &students[pair.student];

        if !instructor.can_teach(student) {
            return Err(ScheduleError::InvariantViolated {
                invariant: "qualification compatibility",
                detail: format!(
                    "instructor {} is not qualified for course {} of student {}",
                    instructor.id, student.course, student.id
                ),
            });
        }

        per_instructor[pair.instructor] += 1;
        if per_instructor[pair.instructor] > 1 {
            return Err(ScheduleError::InvariantViolated {
                invariant: "instructor capacity",
                detail: format!("instructor {} has more than one student", instructor.id),
            });
        }

        per_student[pair.student] += 1;
        if per_student[pair.student] > 1 {
            return Err(ScheduleError::InvariantViolated {
                invariant: "student exclusivity",
                detail: format!("student {} has more than one instructor", student.id),
            });
        }

        total += 1;
    }

    if total > model.aircraft_capacity() as usize {
        return Err(ScheduleError::InvariantViolated {
            invariant: "aircraft ceiling",
            detail: format!(
                "{total} assignments exceed {} aircraft",
                model.aircraft_capacity()
            ),
        });
    }
    Ok(())
}
