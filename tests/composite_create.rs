use std::time::{SystemTime, UNIX_EPOCH};

use registrard::db::Store;
use registrard::engine;
use registrard::error::OpError;
use registrard::store::{self, StudentProfile, TeacherProfile};

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

fn student_profile() -> StudentProfile {
    StudentProfile {
        name: "Test Student".to_string(),
        major: Some("Computer Science".to_string()),
        ..Default::default()
    }
}

#[test]
fn failed_profile_insert_rolls_back_the_account() {
    let store = temp_store("composite-rollback");
    let mut conn = store.conn().expect("conn");

    engine::create_student(&mut conn, "2021001001", "firstuser", "student123", &student_profile())
        .expect("first create");

    // Same student id, fresh username: the profile insert fails, and the
    // account created in the same call must vanish with it.
    let err = engine::create_student(
        &mut conn,
        "2021001001",
        "seconduser",
        "student123",
        &student_profile(),
    )
    .expect_err("duplicate student id");
    assert!(matches!(err, OpError::Conflict(_)), "got {err:?}");

    // The username from the failed call is reusable.
    store::create_account(&conn, "seconduser", "student123", "student")
        .expect("username must not be orphaned");
}

#[test]
fn duplicate_username_is_a_conflict() {
    let store = temp_store("composite-username");
    let mut conn = store.conn().expect("conn");

    engine::create_student(&mut conn, "2021001001", "shared", "student123", &student_profile())
        .expect("first create");
    let err = engine::create_student(
        &mut conn,
        "2021001002",
        "shared",
        "student123",
        &student_profile(),
    )
    .expect_err("duplicate username");
    assert!(matches!(err, OpError::Conflict(_)));

    // Only the first student exists.
    assert_eq!(store::list_students(&conn).expect("list").len(), 1);
}

#[test]
fn teacher_create_matches_role_and_rolls_back_too() {
    let store = temp_store("composite-teacher");
    let mut conn = store.conn().expect("conn");

    engine::create_teacher(
        &mut conn,
        "teacher001",
        "prof_zhang",
        "teacher123",
        &TeacherProfile {
            name: "Prof Zhang".to_string(),
            ..Default::default()
        },
    )
    .expect("create teacher");

    let teacher = store::get_teacher(&conn, "teacher001").expect("get");
    let account = store::authenticate(&conn, "prof_zhang", "teacher123").expect("login");
    assert_eq!(account.role, "teacher");
    assert_eq!(account.user_id, teacher.user_id);

    let err = engine::create_teacher(
        &mut conn,
        "teacher001",
        "prof_li",
        "teacher123",
        &TeacherProfile {
            name: "Prof Li".to_string(),
            ..Default::default()
        },
    )
    .expect_err("duplicate teacher id");
    assert!(matches!(err, OpError::Conflict(_)));
    store::create_account(&conn, "prof_li", "teacher123", "teacher")
        .expect("username must not be orphaned");
}

#[test]
fn invalid_inputs_are_rejected_before_any_insert() {
    let store = temp_store("composite-validate");
    let mut conn = store.conn().expect("conn");

    let cases = [
        ("badid", "validuser1", "student123"),       // malformed student id
        ("2021001001", "x", "student123"),           // username too short
        ("2021001001", "validuser1", "123"),         // password too short
    ];
    for (sid, username, password) in cases {
        let err = engine::create_student(&mut conn, sid, username, password, &student_profile())
            .expect_err("must reject");
        assert!(matches!(err, OpError::Validation(_)), "got {err:?}");
    }
    assert!(store::list_students(&conn).expect("list").is_empty());
    assert!(store::list_accounts(&conn).expect("accounts").is_empty());
}

#[test]
fn account_with_profile_refuses_deletion() {
    let store = temp_store("composite-guard");
    let mut conn = store.conn().expect("conn");

    let user_id =
        engine::create_student(&mut conn, "2021001001", "guarded", "student123", &student_profile())
            .expect("create");

    let err = store::delete_account(&conn, user_id).expect_err("must refuse");
    assert!(matches!(err, OpError::Conflict(_)));

    // Deleting the student removes the account with it.
    store::delete_student(&mut conn, "2021001001").expect("delete student");
    assert!(store::list_accounts(&conn).expect("accounts").is_empty());
}
