//! Raw roster records as collected by an input form.
//!
//! Records hold unchecked integers. Converting them into [`Instructor`] and
//! [`Student`] validates every field and names the offending entity on
//! failure.

use crate::error::{Result, ScheduleError};

use super::types::{Course, Instructor, Student};

/// Unvalidated instructor record.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InstructorInput {
    /// 1-based display id.
    pub id: i64,
    /// Course numbers the instructor is certified for.
    pub qualifications: Vec<i64>,
}

/// Unvalidated student record.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StudentInput {
    /// 1-based display id.
    pub id: i64,
    /// Course number the student is enrolled in.
    pub course: i64,
}

fn display_id(entity: &'static str, id: i64) -> Result<u32> {
    match u32::try_from(id) {
        Ok(id) if id >= 1 => Ok(id),
        _ => Err(ScheduleError::invalid(
            entity,
            None,
            "id",
            format!("must be a positive integer, got {id}"),
        )),
    }
}

impl TryFrom<&InstructorInput> for Instructor {
    type Error = ScheduleError;

    fn try_from(input: &InstructorInput) -> Result<Self> {
        let id = display_id("instructor", input.id)?;
        let qualifications = input
            .qualifications
            .iter()
            .map(|&n| {
                Course::new(n).ok_or_else(|| {
                    ScheduleError::invalid(
                        "instructor",
                        Some(id),
                        "qualifications",
                        format!("contain {n}, expected only courses 1, 2 or 3"),
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Instructor::new(id, qualifications))
    }
}

impl TryFrom<&StudentInput> for Student {
    type Error = ScheduleError;

    fn try_from(input: &StudentInput) -> Result<Self> {
        let id = display_id("student", input.id)?;
        let course = Course::new(input.course).ok_or_else(|| {
            ScheduleError::invalid(
                "student",
                Some(id),
                "course",
                format!("must be 1, 2 or 3, got {}", input.course),
            )
        })?;
        Ok(Student::new(id, course))
    }
}

/// Validates a whole roster, stopping at the first bad record.
pub fn parse_roster(
    instructors: &[InstructorInput],
    students: &[StudentInput],
) -> Result<(Vec<Instructor>, Vec<Student>)> {
    let instructors = instructors
        .iter()
        .map(Instructor::try_from)
        .collect::<Result<Vec<_>>>()?;
    let students = students
        .iter()
        .map(Student::try_from)
        .collect::<Result<Vec<_>>>()?;
    Ok((instructors, students))
}

/// Builds the roster an untouched input form starts with.
///
/// Instructor `k` (0-based) is qualified for course 1, for course 2 when
/// `k > 0`, and for course 3 when `k > 1`. Student `k` takes course
/// `k % 3 + 1`. Ids are 1-based.
///
/// # Examples
///
/// ```
/// use u_flightsched::domain::{default_roster, Course};
///
/// let (instructors, students) = default_roster(3, 5);
/// assert_eq!(instructors[0].qualifications.len(), 1);
/// assert_eq!(instructors[2].qualifications.len(), 3);
/// assert_eq!(students[4].course, Course::new(2).unwrap());
/// ```
pub fn default_roster(instructors: usize, students: usize) -> (Vec<Instructor>, Vec<Student>) {
    let instructors = (0..instructors)
        .map(|k| {
            let qualifications = Course::ALL
                .into_iter()
                .enumerate()
                .filter(|&(c, _)| k >= c)
                .map(|(_, course)| course);
            Instructor::new(k as u32 + 1, qualifications)
        })
        .collect();
    let students = (0..students)
        .map(|k| Student::new(k as u32 + 1, Course::ALL[k % 3]))
        .collect();
    (instructors, students)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instructor_conversion() {
        let input = InstructorInput {
            id: 2,
            qualifications: vec![3, 1],
        };
        let instructor = Instructor::try_from(&input).unwrap();
        assert_eq!(instructor.id, 2);
        assert_eq!(instructor.qualifications.len(), 2);
    }

    #[test]
    fn test_instructor_bad_qualification() {
        let input = InstructorInput {
            id: 5,
            qualifications: vec![1, 4],
        };
        let err = Instructor::try_from(&input).unwrap_err();
        assert_eq!(
            err,
            ScheduleError::InvalidInput {
                entity: "instructor",
                id: Some(5),
                field: "qualifications",
                reason: "contain 4, expected only courses 1, 2 or 3".into(),
            }
        );
    }

    #[test]
    fn test_student_bad_course() {
        let input = StudentInput { id: 3, course: 0 };
        let err = Student::try_from(&input).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid student 3: course must be 1, 2 or 3, got 0"
        );
    }

    #[test]
    fn test_bad_ids() {
        assert!(Student::try_from(&StudentInput { id: 0, course: 1 }).is_err());
        assert!(Student::try_from(&StudentInput { id: -4, course: 1 }).is_err());
        assert!(Instructor::try_from(&InstructorInput {
            id: i64::MAX,
            qualifications: vec![],
        })
        .is_err());
    }

    #[test]
    fn test_parse_roster_stops_at_first_error() {
        let instructors = vec![InstructorInput {
            id: 1,
            qualifications: vec![1],
        }];
        let students = vec![
            StudentInput { id: 1, course: 1 },
            StudentInput { id: 2, course: 7 },
            StudentInput { id: 3, course: 9 },
        ];
        let err = parse_roster(&instructors, &students).unwrap_err();
        assert!(err.to_string().contains("student 2"));
    }

    #[test]
    fn test_default_roster() {
        let (instructors, students) = default_roster(3, 5);

        let quals: Vec<Vec<u8>> = instructors
            .iter()
            .map(|i| i.qualifications.iter().map(|c| c.number()).collect())
            .collect();
        assert_eq!(quals, vec![vec![1], vec![1, 2], vec![1, 2, 3]]);

        let courses: Vec<u8> = students.iter().map(|s| s.course.number()).collect();
        assert_eq!(courses, vec![1, 2, 3, 1, 2]);
        assert_eq!(students.iter().map(|s| s.id).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
    }
}
