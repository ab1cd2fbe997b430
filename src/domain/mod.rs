//! Scheduling entities: courses, instructors, students.
//!
//! [`Instructor`] and [`Student`] are always valid once constructed;
//! [`InstructorInput`] and [`StudentInput`] carry raw form data and are
//! checked on conversion.

mod input;
mod types;

pub use input::{default_roster, parse_roster, InstructorInput, StudentInput};
pub use types::{Course, Instructor, Student};
