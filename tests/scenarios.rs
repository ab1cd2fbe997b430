//! End-to-end scheduling scenarios.

use u_flightsched::domain::{
    default_roster, parse_roster, Course, Instructor, InstructorInput, Student, StudentInput,
};
use u_flightsched::generate::InstanceGenerator;
use u_flightsched::schedule::{ScheduleConfig, Scheduler, SolverKind};
use u_flightsched::ScheduleError;

fn c(n: i64) -> Course {
    Course::new(n).unwrap()
}

fn graded_instructors() -> Vec<Instructor> {
    vec![
        Instructor::new(1, [c(1)]),
        Instructor::new(2, [c(1), c(2)]),
        Instructor::new(3, [c(1), c(2), c(3)]),
    ]
}

fn one_per_course() -> Vec<Student> {
    vec![
        Student::new(1, c(1)),
        Student::new(2, c(2)),
        Student::new(3, c(3)),
    ]
}

fn both_solvers() -> [ScheduleConfig; 2] {
    [
        ScheduleConfig::default(),
        ScheduleConfig::default().with_solver(SolverKind::BranchAndBound),
    ]
}

#[test]
fn every_student_assigned_when_aircraft_suffice() {
    for config in both_solvers() {
        let report = Scheduler::run(&graded_instructors(), &one_per_course(), 3, &config).unwrap();

        assert_eq!(report.assigned_count, 3);
        assert_eq!(report.unassigned_count, 0);
        assert!(report.unassigned_students.is_empty());

        // The only perfect pairing: 1-1, 2-2, 3-3.
        let pairs: Vec<(u32, u32)> = report
            .assignments
            .iter()
            .map(|r| (r.instructor_id, r.student_id))
            .collect();
        assert_eq!(pairs, vec![(1, 1), (2, 2), (3, 3)]);
    }
}

#[test]
fn single_aircraft_schedules_one_student() {
    for config in both_solvers() {
        let report = Scheduler::run(&graded_instructors(), &one_per_course(), 1, &config).unwrap();

        assert_eq!(report.assigned_count, 1);
        assert_eq!(report.unassigned_count, 2);
        assert_eq!(report.aircraft_utilization_pct(), Ok(100.0));
        let pct = report.instructor_utilization_pct().unwrap();
        assert!((pct - 100.0 / 3.0).abs() < 1e-9);
    }
}

#[test]
fn unqualified_pair_never_assigned() {
    let instructors = vec![Instructor::new(1, [c(1)])];
    let students = vec![Student::new(1, c(2))];

    for config in both_solvers() {
        let report = Scheduler::run(&instructors, &students, 5, &config).unwrap();

        assert_eq!(report.assigned_count, 0);
        assert_eq!(report.unassigned_students, vec![1]);
        assert_eq!(report.instructor_utilization_pct(), Ok(0.0));
    }
}

#[test]
fn empty_roster_solves_to_zero() {
    let students = one_per_course();

    let report = Scheduler::run(&[], &students, 3, &ScheduleConfig::default()).unwrap();
    assert_eq!(report.assigned_count, 0);
    assert_eq!(report.unassigned_count, 3);
    assert_eq!(
        report.instructor_utilization_pct(),
        Err(ScheduleError::DivisionByZero {
            metric: "instructor utilization"
        })
    );
    assert_eq!(report.aircraft_utilization_pct(), Ok(0.0));

    let report = Scheduler::run(&graded_instructors(), &[], 3, &ScheduleConfig::default()).unwrap();
    assert_eq!(report.assigned_count, 0);
    assert_eq!(report.unassigned_count, 0);
    assert_eq!(report.instructor_utilization_pct(), Ok(0.0));
}

#[test]
fn strict_mode_rejects_empty_roster() {
    let config = ScheduleConfig::default().with_reject_empty(true);
    let err = Scheduler::run(&[], &one_per_course(), 3, &config).unwrap_err();
    assert!(err.to_string().contains("instructor"));
}

#[test]
fn zero_aircraft_is_a_valid_empty_schedule() {
    let report =
        Scheduler::run(&graded_instructors(), &one_per_course(), 0, &ScheduleConfig::default())
            .unwrap();

    assert_eq!(report.assigned_count, 0);
    assert!(matches!(
        report.aircraft_utilization_pct(),
        Err(ScheduleError::DivisionByZero { .. })
    ));
}

#[test]
fn known_perfect_matching_is_found() {
    let instructors = vec![
        Instructor::new(1, [c(1), c(2)]),
        Instructor::new(2, [c(1)]),
        Instructor::new(3, [c(2), c(3)]),
        Instructor::new(4, [c(3)]),
    ];
    let students = vec![
        Student::new(1, c(2)),
        Student::new(2, c(1)),
        Student::new(3, c(2)),
        Student::new(4, c(3)),
    ];

    for config in both_solvers() {
        let report = Scheduler::run(&instructors, &students, 4, &config).unwrap();
        assert_eq!(report.assigned_count, 4);
        assert_eq!(report.instructor_of(1), Some(1));
        assert_eq!(report.instructor_of(2), Some(2));
        assert_eq!(report.instructor_of(3), Some(3));
        assert_eq!(report.instructor_of(4), Some(4));
    }
}

#[test]
fn form_defaults_match_reference_run() {
    // 3 aircraft, 3 instructors, 5 students as an untouched form starts.
    let (instructors, students) = default_roster(3, 5);
    let report = u_flightsched::schedule(&instructors, &students, 3).unwrap();

    assert_eq!(report.assigned_count, 3);
    assert_eq!(report.unassigned_count, 2);
    assert_eq!(report.instructor_count, 3);
    assert_eq!(report.student_count, 5);
    assert_eq!(report.aircraft_capacity, 3);

    let by_course: Vec<(u8, usize, usize)> = report
        .course_summary
        .iter()
        .map(|s| (s.course.number(), s.enrolled, s.assigned))
        .collect();
    assert_eq!(by_course.iter().map(|t| t.1).sum::<usize>(), 5);
    assert_eq!(by_course.iter().map(|t| t.2).sum::<usize>(), 3);
}

#[test]
fn raw_records_flow_through() {
    let instructors = vec![
        InstructorInput {
            id: 1,
            qualifications: vec![1, 2],
        },
        InstructorInput {
            id: 2,
            qualifications: vec![],
        },
    ];
    let students = vec![
        StudentInput { id: 1, course: 2 },
        StudentInput { id: 2, course: 1 },
    ];
    let (instructors, students) = parse_roster(&instructors, &students).unwrap();

    let report = u_flightsched::schedule(&instructors, &students, 2).unwrap();
    assert_eq!(report.assigned_count, 1);
    assert_eq!(report.assignments[0].instructor_id, 1);
    assert_eq!(report.assignments[0].student_id, 1);
    assert_eq!(report.assignments[0].instructor_qualifications, vec![c(1), c(2)]);
}

#[test]
fn bad_course_reported_with_context() {
    let err = parse_roster(&[], &[StudentInput { id: 7, course: 4 }]).unwrap_err();
    assert_eq!(
        err,
        ScheduleError::InvalidInput {
            entity: "student",
            id: Some(7),
            field: "course",
            reason: "must be 1, 2 or 3, got 4".into(),
        }
    );
}

#[test]
fn repeated_runs_are_identical() {
    let (instructors, students) = default_roster(5, 7);
    let first = u_flightsched::schedule(&instructors, &students, 4).unwrap();
    let second = u_flightsched::schedule(&instructors, &students, 4).unwrap();
    assert_eq!(first.assignments, second.assignments);
}

#[test]
fn solvers_agree_on_rosters_with_hundreds_of_pairs() {
    let exact = ScheduleConfig::default().with_solver(SolverKind::BranchAndBound);

    for (instructors, students) in [(12, 15), (15, 15)] {
        for seed in 1..=5 {
            let request = InstanceGenerator::new(instructors, students)
                .with_aircraft(instructors as i64, instructors as i64)
                .with_seed(seed)
                .generate();

            let fast = Scheduler::run_request(&request, &ScheduleConfig::default());
            let slow = Scheduler::run_request(&request, &exact);

            let (fast, slow) = match (fast, slow) {
                (Ok(fast), Ok(slow)) => (fast, slow),
                (fast, slow) => panic!(
                    "{instructors}x{students} seed {seed}: matching {:?}, branch and bound {:?}",
                    fast.err(),
                    slow.err()
                ),
            };
            assert_eq!(
                fast.assignments, slow.assignments,
                "{instructors}x{students} seed {seed}"
            );
        }
    }
}

#[test]
fn branch_and_bound_handles_tight_aircraft_on_large_roster() {
    let request = InstanceGenerator::new(15, 20)
        .with_qualification_probability(0.7)
        .with_aircraft(9, 9)
        .with_seed(11)
        .generate();
    let config = ScheduleConfig::default().with_solver(SolverKind::BranchAndBound);

    let report = Scheduler::run_request(&request, &config).unwrap();
    let reference = Scheduler::run_request(&request, &ScheduleConfig::default()).unwrap();

    assert!(report.assigned_count <= 9);
    assert_eq!(report.assignments, reference.assignments);
}
