//! Seeded random rosters for benchmarks and randomized tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::{Course, Instructor, Student};
use crate::schedule::ScheduleRequest;

/// Random roster generator.
///
/// # Examples
///
/// ```
/// use u_flightsched::generate::InstanceGenerator;
///
/// let request = InstanceGenerator::new(8, 12).with_seed(7).generate();
/// assert_eq!(request.instructors.len(), 8);
/// assert_eq!(request.students.len(), 12);
/// ```
#[derive(Debug, Clone)]
pub struct InstanceGenerator {
    /// Number of instructors.
    pub instructors: usize,
    /// Number of students.
    pub students: usize,
    /// Probability that an instructor holds a given qualification.
    pub qualification_probability: f64,
    /// Inclusive range the aircraft capacity is drawn from.
    pub aircraft: (i64, i64),
    /// Random seed.
    pub seed: u64,
}

impl InstanceGenerator {
    /// Creates a generator for the given roster size.
    pub fn new(instructors: usize, students: usize) -> Self {
        Self {
            instructors,
            students,
            qualification_probability: 0.5,
            aircraft: (1, instructors.max(1) as i64),
            seed: 42,
        }
    }

    /// Sets the per-course qualification probability (clamped to [0, 1]).
    pub fn with_qualification_probability(mut self, p: f64) -> Self {
        self.qualification_probability = clamp_probability(p);
        self
    }

    /// Sets the inclusive aircraft capacity range.
    pub fn with_aircraft(mut self, min: i64, max: i64) -> Self {
        self.aircraft = (min.min(max), min.max(max));
        self
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Draws one roster.
    ///
    /// Fields set directly are normalized the same way the setters do it.
    pub fn generate(&self) -> ScheduleRequest {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let p = clamp_probability(self.qualification_probability);
        let (low, high) = self.aircraft;

        let instructors = (0..self.instructors)
            .map(|k| {
                let qualifications: Vec<Course> = Course::ALL
                    .into_iter()
                    .filter(|_| rng.random_bool(p))
                    .collect();
                Instructor::new(k as u32 + 1, qualifications)
            })
            .collect();

        let students = (0..self.students)
            .map(|k| Student::new(k as u32 + 1, Course::ALL[rng.random_range(0..Course::ALL.len())]))
            .collect();

        let aircraft_capacity = rng.random_range(low.min(high)..=low.max(high));

        ScheduleRequest {
            instructors,
            students,
            aircraft_capacity,
        }
    }
}

fn clamp_probability(p: f64) -> f64 {
    if p.is_nan() {
        0.0
    } else {
        p.clamp(0.0, 1.0)
    }
}
