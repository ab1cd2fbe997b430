//! Flight instructor scheduling as a constrained bipartite assignment.
//!
//! Assigns flight students to qualified instructors for a single period,
//! maximizing the number of scheduled students under:
//!
//! - **Instructor capacity**: one student per instructor.
//! - **Student exclusivity**: one instructor per student.
//! - **Qualification**: the instructor must be certified for the
//!   student's course.
//! - **Aircraft ceiling**: no more pairs than available aircraft.
//!
//! # Architecture
//!
//! - [`domain`]: courses, instructors, students, raw input records.
//! - [`ilp`]: a domain-agnostic 0/1 integer linear programming layer with
//!   a generic branch and bound solver and a specialized b-matching solver.
//! - [`schedule`]: the model builder, the solving pipeline, and results
//!   extraction.
//! - [`generate`]: seeded random rosters.
//!
//! Every call builds its problem from scratch; no state is kept between
//! calls.
//!
//! # Examples
//!
//! ```
//! use u_flightsched::domain::{Course, Instructor, Student};
//!
//! let c = |n| Course::new(n).unwrap();
//! let instructors = vec![
//!     Instructor::new(1, [c(1)]),
//!     Instructor::new(2, [c(1), c(2)]),
//!     Instructor::new(3, [c(1), c(2), c(3)]),
//! ];
//! let students = vec![
//!     Student::new(1, c(1)),
//!     Student::new(2, c(2)),
//!     Student::new(3, c(3)),
//! ];
//!
//! let report = u_flightsched::schedule(&instructors, &students, 3).unwrap();
//! assert_eq!(report.assigned_count, 3);
//! assert_eq!(report.instructor_utilization_pct().unwrap(), 100.0);
//! ```

pub mod domain;
pub mod error;
pub mod generate;
pub mod ilp;
pub mod schedule;

pub use error::{Result, ScheduleError};

/// Schedules one period with the default configuration.
pub fn schedule(
    instructors: &[domain::Instructor],
    students: &[domain::Student],
    aircraft_capacity: i64,
) -> Result<schedule::ScheduleReport> {
    schedule::Scheduler::run(
        instructors,
        students,
        aircraft_capacity,
        &schedule::ScheduleConfig::default(),
    )
}
