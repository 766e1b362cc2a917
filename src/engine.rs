use rusqlite::{Connection, OptionalExtension, TransactionBehavior};

use crate::error::{OpError, OpResult};
use crate::store::{self, StudentProfile, TeacherProfile};
use crate::validate;

/// Result of an enrollment attempt. `Enrolled` is returned only after the
/// insert committed, so a caller seeing it knows the seat is actually held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollOutcome {
    Enrolled,
    AlreadyEnrolled,
    CourseFull,
    CourseClosed,
    CourseNotFound,
}

impl EnrollOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            EnrollOutcome::Enrolled => "enrolled",
            EnrollOutcome::AlreadyEnrolled => "already enrolled in this course",
            EnrollOutcome::CourseFull => "course is full",
            EnrollOutcome::CourseClosed => "course is not open for enrollment",
            EnrollOutcome::CourseNotFound => "course not found",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    Dropped,
    NotEnrolled,
}

/// Attempt to take one seat in a course.
///
/// The whole check-then-insert sequence runs under BEGIN IMMEDIATE, which
/// takes the write lock before the capacity read. Two workers racing for
/// the last seat therefore serialize: the second re-reads the committed
/// count and gets `CourseFull`. The UNIQUE(student_id, course_id)
/// constraint independently backs the duplicate check.
pub fn enroll(conn: &mut Connection, student_id: &str, course_id: &str) -> OpResult<EnrollOutcome> {
    validate::student_id(student_id)?;
    validate::course_id(course_id)?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let student_exists: Option<i64> = tx
        .query_row(
            "SELECT 1 FROM students WHERE student_id = ?",
            [student_id],
            |r| r.get(0),
        )
        .optional()?;
    if student_exists.is_none() {
        return Err(OpError::not_found(format!(
            "student '{student_id}' not found"
        )));
    }

    let course: Option<(i64, String)> = tx
        .query_row(
            "SELECT capacity, status FROM courses WHERE course_id = ?",
            [course_id],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()?;
    let Some((capacity, status)) = course else {
        return Ok(EnrollOutcome::CourseNotFound);
    };
    if status != "open" {
        return Ok(EnrollOutcome::CourseClosed);
    }

    let already: Option<i64> = tx
        .query_row(
            "SELECT 1 FROM enrollments WHERE student_id = ? AND course_id = ?",
            (student_id, course_id),
            |r| r.get(0),
        )
        .optional()?;
    if already.is_some() {
        return Ok(EnrollOutcome::AlreadyEnrolled);
    }

    let count: i64 = tx.query_row(
        "SELECT COUNT(*) FROM enrollments WHERE course_id = ?",
        [course_id],
        |r| r.get(0),
    )?;
    if count >= capacity {
        return Ok(EnrollOutcome::CourseFull);
    }

    tx.execute(
        "INSERT INTO enrollments(student_id, course_id) VALUES(?, ?)",
        (student_id, course_id),
    )?;
    tx.commit()?;
    Ok(EnrollOutcome::Enrolled)
}

/// Unconditional drop. Never touches the grade row; a recorded grade is
/// history and survives the enrollment.
pub fn drop_course(conn: &Connection, student_id: &str, course_id: &str) -> OpResult<DropOutcome> {
    let deleted = conn.execute(
        "DELETE FROM enrollments WHERE student_id = ? AND course_id = ?",
        (student_id, course_id),
    )?;
    if deleted == 0 {
        Ok(DropOutcome::NotEnrolled)
    } else {
        Ok(DropOutcome::Dropped)
    }
}

/// Upsert a grade after validating the component scores and that the
/// referenced student and course exist. Enrollment is deliberately not
/// required: grades may outlive (or predate) the enrollment row.
pub fn record_grade(
    conn: &Connection,
    student_id: &str,
    course_id: &str,
    usual_score: f64,
    exam_score: f64,
    semester: Option<&str>,
) -> OpResult<store::Grade> {
    validate::score(usual_score)?;
    validate::score(exam_score)?;

    let student_exists: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM students WHERE student_id = ?",
            [student_id],
            |r| r.get(0),
        )
        .optional()?;
    if student_exists.is_none() {
        return Err(OpError::not_found(format!(
            "student '{student_id}' not found"
        )));
    }
    let course_exists: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM courses WHERE course_id = ?",
            [course_id],
            |r| r.get(0),
        )
        .optional()?;
    if course_exists.is_none() {
        return Err(OpError::not_found(format!(
            "course '{course_id}' not found"
        )));
    }

    store::upsert_grade(conn, student_id, course_id, usual_score, exam_score, semester)
}

/// Create a student together with its account as one transaction. If the
/// profile insert fails the account insert rolls back with it, so a failed
/// create never leaves an orphaned username behind.
pub fn create_student(
    conn: &mut Connection,
    student_id: &str,
    username: &str,
    password: &str,
    profile: &StudentProfile,
) -> OpResult<i64> {
    validate::student_id(student_id)?;
    validate::username(username)?;
    validate::password(password)?;
    validate::name(&profile.name)?;
    validate::email(profile.email.as_deref().unwrap_or(""))?;
    validate::phone(profile.phone.as_deref().unwrap_or(""))?;

    let tx = conn.transaction()?;
    let user_id = store::create_account(&tx, username, password, "student")?;
    let inserted = tx.execute(
        "INSERT INTO students(
            student_id, user_id, name, gender, birth_date,
            major, grade, class_name, phone, email, address
         ) VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        (
            student_id,
            user_id,
            &profile.name,
            &profile.gender,
            &profile.birth_date,
            &profile.major,
            &profile.grade,
            &profile.class_name,
            &profile.phone,
            &profile.email,
            &profile.address,
        ),
    );
    match inserted {
        Ok(_) => {
            tx.commit()?;
            Ok(user_id)
        }
        Err(e) if is_unique_violation(&e) => Err(OpError::conflict(format!(
            "student '{student_id}' already exists"
        ))),
        Err(e) => Err(e.into()),
    }
}

/// Teacher counterpart of [`create_student`].
pub fn create_teacher(
    conn: &mut Connection,
    teacher_id: &str,
    username: &str,
    password: &str,
    profile: &TeacherProfile,
) -> OpResult<i64> {
    validate::teacher_id(teacher_id)?;
    validate::username(username)?;
    validate::password(password)?;
    validate::name(&profile.name)?;
    validate::email(profile.email.as_deref().unwrap_or(""))?;
    validate::phone(profile.phone.as_deref().unwrap_or(""))?;

    let tx = conn.transaction()?;
    let user_id = store::create_account(&tx, username, password, "teacher")?;
    let inserted = tx.execute(
        "INSERT INTO teachers(
            teacher_id, user_id, name, gender, birth_date,
            department, title, phone, email, office, hire_date
         ) VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        (
            teacher_id,
            user_id,
            &profile.name,
            &profile.gender,
            &profile.birth_date,
            &profile.department,
            &profile.title,
            &profile.phone,
            &profile.email,
            &profile.office,
            &profile.hire_date,
        ),
    );
    match inserted {
        Ok(_) => {
            tx.commit()?;
            Ok(user_id)
        }
        Err(e) if is_unique_violation(&e) => Err(OpError::conflict(format!(
            "teacher '{teacher_id}' already exists"
        ))),
        Err(e) => Err(e.into()),
    }
}

/// Create a course after validating its identifiers and bounds.
pub fn create_course(
    conn: &Connection,
    course_id: &str,
    input: &store::CourseInput,
) -> OpResult<()> {
    validate::course_id(course_id)?;
    validate::credits(input.credits)?;
    validate::hours(input.hours)?;
    validate::capacity(input.capacity)?;
    if input.status != "open" && input.status != "closed" {
        return Err(OpError::validation("status must be open or closed"));
    }
    if let Some(tid) = input.teacher_id.as_deref() {
        store::get_teacher(conn, tid)?;
    }
    store::insert_course(conn, course_id, input)
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(f, _)
            if f.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
