use std::time::{SystemTime, UNIX_EPOCH};

use registrard::db::Store;
use registrard::engine::{self, DropOutcome, EnrollOutcome};
use registrard::store::{self, CourseInput, StudentProfile};

fn temp_store(prefix: &str) -> Store {
    let dir = std::env::temp_dir().join(format!(
        "registrard-{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    Store::open(&dir.join("registrar.sqlite3")).expect("open store")
}

fn seed(store: &Store) {
    let mut conn = store.conn().expect("conn");
    engine::create_student(
        &mut conn,
        "2021001001",
        "upsert01",
        "student123",
        &StudentProfile {
            name: "Test Student".to_string(),
            ..Default::default()
        },
    )
    .expect("create student");
    engine::create_course(
        &conn,
        "CS101",
        &CourseInput {
            course_name: "Intro Course".to_string(),
            credits: 3.0,
            hours: 48,
            capacity: 50,
            status: "open".to_string(),
            ..Default::default()
        },
    )
    .expect("create course");
}

#[test]
fn second_record_updates_in_place() {
    let store = temp_store("upsert-once");
    seed(&store);
    let conn = store.conn().expect("conn");

    engine::record_grade(&conn, "2021001001", "CS101", 70.0, 70.0, Some("2024-2025-1"))
        .expect("first write");
    engine::record_grade(&conn, "2021001001", "CS101", 92.0, 95.0, Some("2024-2025-2"))
        .expect("second write");

    let grades = store::list_student_grades(&conn, "2021001001").expect("list");
    assert_eq!(grades.len(), 1, "upsert must never create a second row");
    let g = &grades[0];
    assert_eq!(g.usual_score, 92.0);
    assert_eq!(g.exam_score, 95.0);
    assert_eq!(g.final_score, 93.8);
    assert_eq!(g.grade_level, "excellent");
    assert_eq!(g.semester.as_deref(), Some("2024-2025-2"));
}

#[test]
fn stored_final_always_matches_components() {
    let store = temp_store("upsert-consistent");
    seed(&store);
    let conn = store.conn().expect("conn");

    for (usual, exam) in [(55.0, 61.5), (88.25, 91.0), (60.0, 60.0)] {
        engine::record_grade(&conn, "2021001001", "CS101", usual, exam, None).expect("write");
        let grades = store::list_student_grades(&conn, "2021001001").expect("list");
        assert_eq!(grades.len(), 1);
        let g = &grades[0];
        assert_eq!(
            g.final_score,
            registrard::calc::final_score(g.usual_score, g.exam_score),
            "stored final must be recomputable from its own components"
        );
    }
}

#[test]
fn grade_survives_dropping_the_enrollment() {
    let store = temp_store("upsert-history");
    seed(&store);
    let mut conn = store.conn().expect("conn");

    assert_eq!(
        engine::enroll(&mut conn, "2021001001", "CS101").expect("enroll"),
        EnrollOutcome::Enrolled
    );
    engine::record_grade(&conn, "2021001001", "CS101", 80.0, 85.0, Some("2024-2025-1"))
        .expect("record");
    assert_eq!(
        engine::drop_course(&conn, "2021001001", "CS101").expect("drop"),
        DropOutcome::Dropped
    );

    // The grade row is history and outlives the enrollment.
    let grades = store::list_student_grades(&conn, "2021001001").expect("list");
    assert_eq!(grades.len(), 1);
    assert_eq!(store::count_enrollments(&conn, "CS101").expect("count"), 0);
}

#[test]
fn delete_grade_removes_exactly_one_row() {
    let store = temp_store("upsert-delete");
    seed(&store);
    let conn = store.conn().expect("conn");

    engine::record_grade(&conn, "2021001001", "CS101", 80.0, 85.0, None).expect("record");
    store::delete_grade(&conn, "2021001001", "CS101").expect("delete");
    assert!(store::list_student_grades(&conn, "2021001001")
        .expect("list")
        .is_empty());

    let err = store::delete_grade(&conn, "2021001001", "CS101").expect_err("already gone");
    assert!(matches!(err, registrard::error::OpError::NotFound(_)));
}
