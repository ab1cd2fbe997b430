//! Translation of a roster into an assignment ILP.

use std::collections::HashSet;

use tracing::debug;

use crate::domain::{Instructor, Student};
use crate::error::{Result, ScheduleError};
use crate::ilp::{IlpModel, Objective, VarId};

/// Position of an (instructor, student) pair in the input lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PairIndex {
    /// Index into the instructor list.
    pub instructor: usize,
    /// Index into the student list.
    pub student: usize,
}

/// An assignment problem ready for a solver.
///
/// Wraps the generic [`IlpModel`] together with the mapping between its
/// variables and (instructor, student) pairs. Variables are laid out
/// row-major: instructor index first, then student index.
#[derive(Debug, Clone)]
pub struct ScheduleModel {
    model: IlpModel,
    instructor_count: usize,
    student_count: usize,
    aircraft_capacity: u32,
}

impl ScheduleModel {
    /// The underlying ILP.
    pub fn ilp(&self) -> &IlpModel {
        &self.model
    }

    /// Variable deciding whether `instructor` teaches `student`.
    pub fn var(&self, instructor: usize, student: usize) -> VarId {
        debug_assert!(instructor < self.instructor_count && student < self.student_count);
        VarId(instructor * self.student_count + student)
    }

    /// Pair decided by `var`.
    pub fn pair(&self, var: VarId) -> PairIndex {
        PairIndex {
            instructor: var.index() / self.student_count,
            student: var.index() % self.student_count,
        }
    }

    /// Every pair, in variable order.
    pub fn pairs(&self) -> impl Iterator<Item = PairIndex> + '_ {
        (0..self.model.var_count()).map(|k| self.pair(VarId(k)))
    }

    /// Whether the pair may be assigned at all.
    pub fn is_compatible(&self, instructor: usize, student: usize) -> bool {
        self.model.vars[self.var(instructor, student).index()].fixed != Some(false)
    }

    /// Number of instructors the model was built from.
    pub fn instructor_count(&self) -> usize {
        self.instructor_count
    }

    /// Number of students the model was built from.
    pub fn student_count(&self) -> usize {
        self.student_count
    }

    /// Aircraft ceiling on the number of pairs.
    pub fn aircraft_capacity(&self) -> u32 {
        self.aircraft_capacity
    }

    /// Rejects rosters whose sizes differ from the ones this model was built from.
    pub fn check_roster(&self, instructors: &[Instructor], students: &[Student]) -> Result<()> {
        if instructors.len() != self.instructor_count {
            return Err(ScheduleError::invalid(
                "instructor",
                None,
                "list",
                format!(
                    "has {} entries, model was built for {}",
                    instructors.len(),
                    self.instructor_count
                ),
            ));
        }
        if students.len() != self.student_count {
            return Err(ScheduleError::invalid(
                "student",
                None,
                "list",
                format!(
                    "has {} entries, model was built for {}",
                    students.len(),
                    self.student_count
                ),
            ));
        }
        Ok(())
    }
}

/// Builds [`ScheduleModel`]s from validated entities.
///
/// # Examples
///
/// ```
/// use u_flightsched::domain::default_roster;
/// use u_flightsched::schedule::ModelBuilder;
///
/// let (instructors, students) = default_roster(3, 3);
/// let model = ModelBuilder::new().build(&instructors, &students, 3).unwrap();
///
/// assert_eq!(model.ilp().var_count(), 9);
/// // 3 instructor rows, 3 student rows, 1 aircraft ceiling
/// assert_eq!(model.ilp().constraint_count(), 7);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ModelBuilder {
    reject_empty: bool,
}

impl ModelBuilder {
    /// Creates a builder that accepts empty lists.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects empty instructor or student lists as invalid input.
    pub fn with_reject_empty(mut self, reject: bool) -> Self {
        self.reject_empty = reject;
        self
    }

    /// Validates the roster and emits the assignment model.
    ///
    /// The model has one binary variable per (instructor, student) pair,
    /// maximizes their sum, and carries:
    ///
    /// 1. one `<= 1` row per instructor,
    /// 2. one `<= 1` row per student,
    /// 3. every unqualified pair as a variable fixed to 0,
    /// 4. one `<= aircraft_capacity` row over all variables.
    pub fn build(
        &self,
        instructors: &[Instructor],
        students: &[Student],
        aircraft_capacity: i64,
    ) -> Result<ScheduleModel> {
        self.validate(instructors, students, aircraft_capacity)?;
        let capacity = u32::try_from(aircraft_capacity).map_err(|_| {
            ScheduleError::invalid(
                "aircraft",
                None,
                "capacity",
                format!("must be at most {}, got {aircraft_capacity}", u32::MAX),
            )
        })?;

        let mut model = IlpModel::new("flight_scheduling");
        for instructor in instructors {
            for student in students {
                if instructor.can_teach(student) {
                    model.add_var();
                } else {
                    model.add_fixed_var(false);
                }
            }
        }

        let n = students.len();
        let var = |i: usize, j: usize| VarId(i * n + j);

        for (i, instructor) in instructors.iter().enumerate() {
            model.add_at_most(
                format!("instructor {} capacity", instructor.id),
                (0..n).map(|j| var(i, j)).collect(),
                1,
            );
        }
        for (j, student) in students.iter().enumerate() {
            model.add_at_most(
                format!("student {} exclusivity", student.id),
                (0..instructors.len()).map(|i| var(i, j)).collect(),
                1,
            );
        }
        let all: Vec<VarId> = (0..model.var_count()).map(VarId).collect();
        model.add_at_most("aircraft ceiling", all.clone(), aircraft_capacity);
        model.set_objective(Objective::Maximize {
            terms: all.into_iter().map(|v| (v, 1)).collect(),
        });

        debug!(
            instructors = instructors.len(),
            students = students.len(),
            aircraft = capacity,
            vars = model.var_count(),
            constraints = model.constraint_count(),
            "assignment model built"
        );

        Ok(ScheduleModel {
            model,
            instructor_count: instructors.len(),
            student_count: students.len(),
            aircraft_capacity: capacity,
        })
    }

    fn validate(
        &self,
        instructors: &[Instructor],
        students: &[Student],
        aircraft_capacity: i64,
    ) -> Result<()> {
        if aircraft_capacity < 0 {
            return Err(ScheduleError::invalid(
                "aircraft",
                None,
                "capacity",
                format!("must be non-negative, got {aircraft_capacity}"),
            ));
        }
        if self.reject_empty {
            if instructors.is_empty() {
                return Err(ScheduleError::invalid("instructor", None, "list", "must not be empty"));
            }
            if students.is_empty() {
                return Err(ScheduleError::invalid("student", None, "list", "must not be empty"));
            }
        }

        check_ids("instructor", instructors.iter().map(|i| i.id))?;
        check_ids("student", students.iter().map(|s| s.id))?;
        Ok(())
    }
}

fn check_ids(entity: &'static str, ids: impl Iterator<Item = u32>) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if id == 0 {
            return Err(ScheduleError::invalid(entity, Some(id), "id", "must be 1-based"));
        }
        if !seen.insert(id) {
            return Err(ScheduleError::invalid(entity, Some(id), "id", "is used more than once"));
        }
    }
    Ok(())
}

/// Builds a model with the default (lenient) [`ModelBuilder`].
pub fn build_model(
    instructors: &[Instructor],
    students: &[Student],
    aircraft_capacity: i64,
) -> Result<ScheduleModel> {
    ModelBuilder::new().build(instructors, students, aircraft_capacity)
}
