//! Results extraction: assignment table, counts, and utilization.

use crate::domain::{Course, Instructor, Student};
use crate::error::{Result, ScheduleError};
use crate::ilp::IlpSolution;

use super::builder::ScheduleModel;

/// One scheduled (instructor, student) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssignmentRow {
    pub instructor_id: u32,
    /// Courses the instructor is certified for, ascending.
    pub instructor_qualifications: Vec<Course>,
    pub student_id: u32,
    pub student_course: Course,
}

/// Enrollment and assignment totals for one course.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CourseSummary {
    pub course: Course,
    /// Students enrolled in the course.
    pub enrolled: usize,
    /// Enrolled students who got an instructor.
    pub assigned: usize,
}

/// Outcome of one scheduling run, ready for a renderer.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScheduleReport {
    /// Scheduled pairs, ordered by instructor then student position.
    pub assignments: Vec<AssignmentRow>,
    pub assigned_count: usize,
    pub unassigned_count: usize,
    /// Ids of students left without an instructor, in input order.
    pub unassigned_students: Vec<u32>,
    pub instructor_count: usize,
    pub student_count: usize,
    pub aircraft_capacity: u32,
    /// Per-course breakdown, one entry per course.
    pub course_summary: Vec<CourseSummary>,
    /// Solver effort (nodes or augmenting searches).
    pub solver_nodes: u64,
    /// Solver wall time in milliseconds.
    pub solve_time_ms: u64,
}

impl ScheduleReport {
    /// Reads the solved variables back into domain terms.
    ///
    /// `instructors` and `students` must be the lists `model` was built
    /// from; lists of another size are rejected as invalid input.
    pub fn extract(
        instructors: &[Instructor],
        students: &[Student],
        model: &ScheduleModel,
        solution: &IlpSolution,
    ) -> Result<Self> {
        model.check_roster(instructors, students)?;

        let mut assigned = vec![false; students.len()];
        let mut assignments = Vec::new();

        for pair in model.pairs() {
            if !solution.value(model.var(pair.instructor, pair.student)) {
                continue;
            }
            let instructor = &instructors[pair.instructor];
            let student = &students[pair.student];
            assigned[pair.student] = true;
            assignments.push(AssignmentRow {
                instructor_id: instructor.id,
                instructor_qualifications: instructor.qualifications.iter().copied().collect(),
                student_id: student.id,
                student_course: student.course,
            });
        }

        let unassigned_students: Vec<u32> = students
            .iter()
            .zip(&assigned)
            .filter(|&(_, &done)| !done)
            .map(|(s, _)| s.id)
            .collect();

        let course_summary = Course::ALL
            .iter()
            .map(|&course| {
                let (enrolled, got) = students
                    .iter()
                    .zip(&assigned)
                    .filter(|(s, _)| s.course == course)
                    .fold((0, 0), |(e, a), (_, &done)| (e + 1, a + usize::from(done)));
                CourseSummary {
                    course,
                    enrolled,
                    assigned: got,
                }
            })
            .collect();

        let assigned_count = assignments.len();
        Ok(Self {
            assignments,
            assigned_count,
            unassigned_count: students.len() - assigned_count,
            unassigned_students,
            instructor_count: instructors.len(),
            student_count: students.len(),
            aircraft_capacity: model.aircraft_capacity(),
            course_summary,
            solver_nodes: solution.nodes,
            solve_time_ms: solution.solve_time_ms,
        })
    }

    /// Assigned students per instructor, as a percentage.
    pub fn instructor_utilization_pct(&self) -> Result<f64> {
        percentage(
            self.assigned_count,
            self.instructor_count,
            "instructor utilization",
        )
    }

    /// Assigned students per available aircraft, as a percentage.
    pub fn aircraft_utilization_pct(&self) -> Result<f64> {
        percentage(
            self.assigned_count,
            self.aircraft_capacity as usize,
            "aircraft utilization",
        )
    }

    /// Whether the student with display id `student_id` got an instructor.
    pub fn is_assigned(&self, student_id: u32) -> bool {
        self.assignments.iter().any(|row| row.student_id == student_id)
    }

    /// Instructor paired with the student, if any.
    pub fn instructor_of(&self, student_id: u32) -> Option<u32> {
        self.assignments
            .iter()
            .find(|row| row.student_id == student_id)
            .map(|row| row.instructor_id)
    }
}

fn percentage(part: usize, whole: usize, metric: &'static str) -> Result<f64> {
    if whole == 0 {
        return Err(ScheduleError::DivisionByZero { metric });
    }
    Ok(part as f64 / whole as f64 * 100.0)
}
