//! Validated scheduling entities.

use std::collections::BTreeSet;
use std::fmt;

use crate::error::ScheduleError;

/// A training course an instructor can teach and a student can take.
///
/// Only courses 1, 2 and 3 exist; the constructor rejects anything else,
/// so a `Course` value is always in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "i64", into = "u8"))]
pub struct Course(u8);

impl Course {
    /// Every course, in ascending order.
    pub const ALL: [Course; 3] = [Course(1), Course(2), Course(3)];

    /// Returns the course with the given number, if it exists.
    pub fn new(number: i64) -> Option<Self> {
        match number {
            1..=3 => Some(Course(number as u8)),
            _ => None,
        }
    }

    /// Course number (1, 2 or 3).
    pub fn number(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Course {
    type Error = ScheduleError;

    fn try_from(number: i64) -> Result<Self, Self::Error> {
        Course::new(number).ok_or_else(|| {
            ScheduleError::invalid("course", None, "number", format!("must be 1, 2 or 3, got {number}"))
        })
    }
}

impl From<Course> for u8 {
    fn from(course: Course) -> u8 {
        course.0
    }
}

impl fmt::Display for Course {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A flight instructor and the courses they are certified to teach.
///
/// An empty qualification set is valid; such an instructor is never
/// assignable.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Instructor {
    /// 1-based display id.
    pub id: u32,
    /// Certified courses.
    pub qualifications: BTreeSet<Course>,
}

impl Instructor {
    /// Creates an instructor.
    pub fn new(id: u32, qualifications: impl IntoIterator<Item = Course>) -> Self {
        Self {
            id,
            qualifications: qualifications.into_iter().collect(),
        }
    }

    /// Whether this instructor may teach `course`.
    pub fn is_qualified(&self, course: Course) -> bool {
        self.qualifications.contains(&course)
    }

    /// Whether this instructor may be paired with `student`.
    pub fn can_teach(&self, student: &Student) -> bool {
        self.is_qualified(student.course)
    }
}

/// A flight student enrolled in exactly one course.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Student {
    /// 1-based display id.
    pub id: u32,
    /// Required course.
    pub course: Course,
}

impl Student {
    /// Creates a student.
    pub fn new(id: u32, course: Course) -> Self {
        Self { id, course }
    }
}
