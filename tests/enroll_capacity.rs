use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

use registrard::db::Store;
use registrard::engine::{self, DropOutcome, EnrollOutcome};
use registrard::error::OpError;
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

fn add_student(store: &Store, student_id: &str, username: &str) {
    let mut conn = store.conn().expect("conn");
    let profile = StudentProfile {
        name: "Test Student".to_string(),
        ..Default::default()
    };
    engine::create_student(&mut conn, student_id, username, "student123", &profile)
        .expect("create student");
}

fn add_course(store: &Store, course_id: &str, capacity: i64, status: &str) {
    let conn = store.conn().expect("conn");
    let input = CourseInput {
        course_name: "Intro Course".to_string(),
        credits: 3.0,
        hours: 48,
        capacity,
        status: status.to_string(),
        ..Default::default()
    };
    engine::create_course(&conn, course_id, &input).expect("create course");
}

#[test]
fn concurrent_enrolls_never_oversell_seats() {
    let store = temp_store("capacity-race");
    add_course(&store, "CS101", 3, "open");
    let n_students = 8;
    for i in 0..n_students {
        add_student(&store, &format!("202100100{i}"), &format!("student0{i}"));
    }

    let barrier = Arc::new(Barrier::new(n_students));
    let mut handles = Vec::new();
    for i in 0..n_students {
        let store = store.clone();
        let barrier = barrier.clone();
        handles.push(thread::spawn(move || {
            let mut conn = store.conn().expect("worker conn");
            barrier.wait();
            engine::enroll(&mut conn, &format!("202100100{i}"), "CS101").expect("enroll call")
        }));
    }

    let outcomes: Vec<EnrollOutcome> = handles
        .into_iter()
        .map(|h| h.join().expect("thread join"))
        .collect();

    let enrolled = outcomes
        .iter()
        .filter(|o| **o == EnrollOutcome::Enrolled)
        .count();
    let full = outcomes
        .iter()
        .filter(|o| **o == EnrollOutcome::CourseFull)
        .count();
    assert_eq!(enrolled, 3, "exactly capacity many enrolls succeed");
    assert_eq!(full, n_students - 3);

    let conn = store.conn().expect("conn");
    assert_eq!(store::count_enrollments(&conn, "CS101").expect("count"), 3);
}

#[test]
fn two_clients_race_for_last_seat() {
    let store = temp_store("last-seat");
    add_course(&store, "CS102", 1, "open");
    add_student(&store, "2021001001", "alice01");
    add_student(&store, "2021001002", "bob02");

    let barrier = Arc::new(Barrier::new(2));
    let spawn = |sid: &'static str| {
        let store = store.clone();
        let barrier = barrier.clone();
        thread::spawn(move || {
            let mut conn = store.conn().expect("worker conn");
            barrier.wait();
            engine::enroll(&mut conn, sid, "CS102").expect("enroll call")
        })
    };
    let a = spawn("2021001001");
    let b = spawn("2021001002");
    let ra = a.join().expect("join a");
    let rb = b.join().expect("join b");

    let mut results = [ra, rb];
    results.sort_by_key(|o| *o != EnrollOutcome::Enrolled);
    assert_eq!(results[0], EnrollOutcome::Enrolled);
    assert_eq!(results[1], EnrollOutcome::CourseFull);

    let conn = store.conn().expect("conn");
    assert_eq!(store::count_enrollments(&conn, "CS102").expect("count"), 1);
}

#[test]
fn duplicate_enroll_is_reported_and_inserts_nothing() {
    let store = temp_store("duplicate");
    add_course(&store, "SE101", 10, "open");
    add_student(&store, "2021002001", "carol03");

    let mut conn = store.conn().expect("conn");
    assert_eq!(
        engine::enroll(&mut conn, "2021002001", "SE101").expect("first"),
        EnrollOutcome::Enrolled
    );
    for _ in 0..3 {
        assert_eq!(
            engine::enroll(&mut conn, "2021002001", "SE101").expect("repeat"),
            EnrollOutcome::AlreadyEnrolled
        );
    }
    assert_eq!(store::count_enrollments(&conn, "SE101").expect("count"), 1);
}

#[test]
fn unknown_student_cannot_take_a_seat() {
    let store = temp_store("ghost-student");
    add_course(&store, "CS103", 5, "open");

    let mut conn = store.conn().expect("conn");
    // Well-formed id, no such student: a typed not-found, never a raw
    // foreign-key failure.
    let err = engine::enroll(&mut conn, "2099999999", "CS103").expect_err("unknown student");
    assert!(matches!(err, OpError::NotFound(_)), "got {err:?}");
    assert_eq!(err.client_message(), "student '2099999999' not found");
    assert_eq!(store::count_enrollments(&conn, "CS103").expect("count"), 0);
}

#[test]
fn closed_course_refuses_enrollment() {
    let store = temp_store("closed");
    add_course(&store, "AI101", 10, "closed");
    add_student(&store, "2021003001", "dave04");

    let mut conn = store.conn().expect("conn");
    assert_eq!(
        engine::enroll(&mut conn, "2021003001", "AI101").expect("enroll"),
        EnrollOutcome::CourseClosed
    );
    assert_eq!(store::count_enrollments(&conn, "AI101").expect("count"), 0);
}

#[test]
fn unknown_course_and_drop_semantics() {
    let store = temp_store("drop");
    add_course(&store, "DS101", 5, "open");
    add_student(&store, "2021004001", "erin05");

    let mut conn = store.conn().expect("conn");
    assert_eq!(
        engine::enroll(&mut conn, "2021004001", "ZZ999").expect("enroll"),
        EnrollOutcome::CourseNotFound
    );

    assert_eq!(
        engine::drop_course(&conn, "2021004001", "DS101").expect("drop"),
        DropOutcome::NotEnrolled
    );
    assert_eq!(
        engine::enroll(&mut conn, "2021004001", "DS101").expect("enroll"),
        EnrollOutcome::Enrolled
    );
    assert_eq!(
        engine::drop_course(&conn, "2021004001", "DS101").expect("drop"),
        DropOutcome::Dropped
    );
    assert_eq!(store::count_enrollments(&conn, "DS101").expect("count"), 0);

    // A freed seat can be taken again.
    assert_eq!(
        engine::enroll(&mut conn, "2021004001", "DS101").expect("re-enroll"),
        EnrollOutcome::Enrolled
    );
}
