use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::calc::{self, GradeLevel};
use crate::error::{OpError, OpResult};

pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(f, _)
            if f.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

// ==================== entities ====================

#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub user_id: i64,
    pub username: String,
    pub role: String,
    pub status: String,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Student {
    pub student_id: String,
    pub user_id: i64,
    pub name: String,
    pub gender: Option<String>,
    pub birth_date: Option<String>,
    pub major: Option<String>,
    pub grade: Option<String>,
    pub class_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub username: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct StudentProfile {
    pub name: String,
    pub gender: Option<String>,
    pub birth_date: Option<String>,
    pub major: Option<String>,
    pub grade: Option<String>,
    pub class_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Teacher {
    pub teacher_id: String,
    pub user_id: i64,
    pub name: String,
    pub gender: Option<String>,
    pub birth_date: Option<String>,
    pub department: Option<String>,
    pub title: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub office: Option<String>,
    pub hire_date: Option<String>,
    pub username: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TeacherProfile {
    pub name: String,
    pub gender: Option<String>,
    pub birth_date: Option<String>,
    pub department: Option<String>,
    pub title: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub office: Option<String>,
    pub hire_date: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Course {
    pub course_id: String,
    pub course_name: String,
    pub teacher_id: Option<String>,
    pub teacher_name: Option<String>,
    pub credits: f64,
    pub hours: i64,
    pub semester: Option<String>,
    pub class_time: Option<String>,
    pub classroom: Option<String>,
    pub capacity: i64,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrolled_count: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct CourseInput {
    pub course_name: String,
    pub teacher_id: Option<String>,
    pub credits: f64,
    pub hours: i64,
    pub semester: Option<String>,
    pub class_time: Option<String>,
    pub classroom: Option<String>,
    pub capacity: i64,
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrolledCourse {
    pub course_id: String,
    pub course_name: String,
    pub teacher_name: Option<String>,
    pub credits: f64,
    pub semester: Option<String>,
    pub class_time: Option<String>,
    pub classroom: Option<String>,
    pub enrollment_date: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrolledStudent {
    pub student_id: String,
    pub name: String,
    pub major: Option<String>,
    pub grade: Option<String>,
    pub class_name: Option<String>,
    pub enrollment_date: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Grade {
    pub student_id: String,
    pub course_id: String,
    pub usual_score: f64,
    pub exam_score: f64,
    pub final_score: f64,
    pub grade_level: String,
    pub semester: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credits: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
}

// ==================== accounts ====================

pub fn create_account(
    conn: &Connection,
    username: &str,
    password: &str,
    role: &str,
) -> OpResult<i64> {
    match conn.execute(
        "INSERT INTO users(username, password_hash, role, status)
         VALUES(?, ?, ?, 'active')",
        (username, hash_password(password), role),
    ) {
        Ok(_) => Ok(conn.last_insert_rowid()),
        Err(e) if is_constraint_violation(&e) => {
            Err(OpError::conflict(format!("username '{username}' is taken")))
        }
        Err(e) => Err(e.into()),
    }
}

fn account_from_row(row: &rusqlite::Row) -> rusqlite::Result<Account> {
    Ok(Account {
        user_id: row.get("user_id")?,
        username: row.get("username")?,
        role: row.get("role")?,
        status: row.get("status")?,
        created_at: row.get("created_at")?,
    })
}

/// Verify credentials against an active account. The failure message is
/// deliberately the same for a wrong username and a wrong password.
pub fn authenticate(conn: &Connection, username: &str, password: &str) -> OpResult<Account> {
    let account = conn
        .query_row(
            "SELECT user_id, username, role, status, created_at FROM users
             WHERE username = ? AND password_hash = ? AND status = 'active'",
            (username, hash_password(password)),
            account_from_row,
        )
        .optional()?;
    account.ok_or_else(|| OpError::not_found("invalid username or password"))
}

pub fn change_password(
    conn: &Connection,
    username: &str,
    old_password: &str,
    new_password: &str,
) -> OpResult<()> {
    authenticate(conn, username, old_password)?;
    conn.execute(
        "UPDATE users SET password_hash = ?, updated_at = CURRENT_TIMESTAMP
         WHERE username = ?",
        (hash_password(new_password), username),
    )?;
    Ok(())
}

pub fn reset_password(conn: &Connection, user_id: i64, new_password: &str) -> OpResult<()> {
    let changed = conn.execute(
        "UPDATE users SET password_hash = ?, updated_at = CURRENT_TIMESTAMP
         WHERE user_id = ?",
        (hash_password(new_password), user_id),
    )?;
    if changed == 0 {
        return Err(OpError::not_found("user not found"));
    }
    Ok(())
}

pub fn set_account_status(conn: &Connection, user_id: i64, status: &str) -> OpResult<()> {
    if status != "active" && status != "inactive" {
        return Err(OpError::validation("status must be active or inactive"));
    }
    let changed = conn.execute(
        "UPDATE users SET status = ?, updated_at = CURRENT_TIMESTAMP WHERE user_id = ?",
        (status, user_id),
    )?;
    if changed == 0 {
        return Err(OpError::not_found("user not found"));
    }
    Ok(())
}

/// Accounts that still own a student or teacher profile refuse deletion.
pub fn delete_account(conn: &Connection, user_id: i64) -> OpResult<()> {
    let dependent: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM students WHERE user_id = ?1
             UNION ALL
             SELECT 1 FROM teachers WHERE user_id = ?1
             LIMIT 1",
            [user_id],
            |r| r.get(0),
        )
        .optional()?;
    if dependent.is_some() {
        return Err(OpError::conflict(
            "account still owns a student or teacher record",
        ));
    }
    let deleted = conn.execute("DELETE FROM users WHERE user_id = ?", [user_id])?;
    if deleted == 0 {
        return Err(OpError::not_found("user not found"));
    }
    Ok(())
}

pub fn list_accounts(conn: &Connection) -> OpResult<Vec<Account>> {
    let mut stmt = conn.prepare(
        "SELECT user_id, username, role, status, created_at FROM users ORDER BY user_id",
    )?;
    let rows = stmt
        .query_map([], account_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ==================== students ====================

fn student_from_row(row: &rusqlite::Row) -> rusqlite::Result<Student> {
    Ok(Student {
        student_id: row.get("student_id")?,
        user_id: row.get("user_id")?,
        name: row.get("name")?,
        gender: row.get("gender")?,
        birth_date: row.get("birth_date")?,
        major: row.get("major")?,
        grade: row.get("grade")?,
        class_name: row.get("class_name")?,
        phone: row.get("phone")?,
        email: row.get("email")?,
        address: row.get("address")?,
        username: row.get("username").ok(),
        status: row.get("status").ok(),
    })
}

const STUDENT_COLS: &str = "s.student_id, s.user_id, s.name, s.gender, s.birth_date,
     s.major, s.grade, s.class_name, s.phone, s.email, s.address, u.username, u.status";

pub fn get_student(conn: &Connection, student_id: &str) -> OpResult<Student> {
    let student = conn
        .query_row(
            &format!(
                "SELECT {STUDENT_COLS} FROM students s
                 JOIN users u ON s.user_id = u.user_id
                 WHERE s.student_id = ?"
            ),
            [student_id],
            student_from_row,
        )
        .optional()?;
    student.ok_or_else(|| OpError::not_found(format!("student '{student_id}' not found")))
}

pub fn get_student_by_user(conn: &Connection, user_id: i64) -> OpResult<Student> {
    let student = conn
        .query_row(
            &format!(
                "SELECT {STUDENT_COLS} FROM students s
                 JOIN users u ON s.user_id = u.user_id
                 WHERE s.user_id = ?"
            ),
            [user_id],
            student_from_row,
        )
        .optional()?;
    student.ok_or_else(|| OpError::not_found("no student record for this account"))
}

pub fn list_students(conn: &Connection) -> OpResult<Vec<Student>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {STUDENT_COLS} FROM students s
         JOIN users u ON s.user_id = u.user_id
         ORDER BY s.student_id"
    ))?;
    let rows = stmt
        .query_map([], student_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn search_students(conn: &Connection, keyword: &str) -> OpResult<Vec<Student>> {
    let pattern = format!("%{keyword}%");
    let mut stmt = conn.prepare(&format!(
        "SELECT {STUDENT_COLS} FROM students s
         JOIN users u ON s.user_id = u.user_id
         WHERE s.student_id LIKE ?1 OR s.name LIKE ?1
            OR s.major LIKE ?1 OR s.grade LIKE ?1
         ORDER BY s.student_id"
    ))?;
    let rows = stmt
        .query_map([&pattern], student_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn update_student(
    conn: &Connection,
    student_id: &str,
    profile: &StudentProfile,
) -> OpResult<()> {
    let changed = conn.execute(
        "UPDATE students SET
            name = ?, gender = ?, birth_date = ?, major = ?, grade = ?,
            class_name = ?, phone = ?, email = ?, address = ?,
            updated_at = CURRENT_TIMESTAMP
         WHERE student_id = ?",
        (
            &profile.name,
            &profile.gender,
            &profile.birth_date,
            &profile.major,
            &profile.grade,
            &profile.class_name,
            &profile.phone,
            &profile.email,
            &profile.address,
            student_id,
        ),
    )?;
    if changed == 0 {
        return Err(OpError::not_found(format!(
            "student '{student_id}' not found"
        )));
    }
    Ok(())
}

/// Remove a student together with its enrollments, grades and account.
pub fn delete_student(conn: &mut Connection, student_id: &str) -> OpResult<()> {
    let tx = conn.transaction()?;
    let user_id: Option<i64> = tx
        .query_row(
            "SELECT user_id FROM students WHERE student_id = ?",
            [student_id],
            |r| r.get(0),
        )
        .optional()?;
    let Some(user_id) = user_id else {
        return Err(OpError::not_found(format!(
            "student '{student_id}' not found"
        )));
    };
    tx.execute("DELETE FROM enrollments WHERE student_id = ?", [student_id])?;
    tx.execute("DELETE FROM grades WHERE student_id = ?", [student_id])?;
    tx.execute("DELETE FROM students WHERE student_id = ?", [student_id])?;
    tx.execute("DELETE FROM users WHERE user_id = ?", [user_id])?;
    tx.commit()?;
    Ok(())
}

// ==================== teachers ====================

fn teacher_from_row(row: &rusqlite::Row) -> rusqlite::Result<Teacher> {
    Ok(Teacher {
        teacher_id: row.get("teacher_id")?,
        user_id: row.get("user_id")?,
        name: row.get("name")?,
        gender: row.get("gender")?,
        birth_date: row.get("birth_date")?,
        department: row.get("department")?,
        title: row.get("title")?,
        phone: row.get("phone")?,
        email: row.get("email")?,
        office: row.get("office")?,
        hire_date: row.get("hire_date")?,
        username: row.get("username").ok(),
        status: row.get("status").ok(),
    })
}

const TEACHER_COLS: &str = "t.teacher_id, t.user_id, t.name, t.gender, t.birth_date,
     t.department, t.title, t.phone, t.email, t.office, t.hire_date, u.username, u.status";

pub fn get_teacher(conn: &Connection, teacher_id: &str) -> OpResult<Teacher> {
    let teacher = conn
        .query_row(
            &format!(
                "SELECT {TEACHER_COLS} FROM teachers t
                 JOIN users u ON t.user_id = u.user_id
                 WHERE t.teacher_id = ?"
            ),
            [teacher_id],
            teacher_from_row,
        )
        .optional()?;
    teacher.ok_or_else(|| OpError::not_found(format!("teacher '{teacher_id}' not found")))
}

pub fn get_teacher_by_user(conn: &Connection, user_id: i64) -> OpResult<Teacher> {
    let teacher = conn
        .query_row(
            &format!(
                "SELECT {TEACHER_COLS} FROM teachers t
                 JOIN users u ON t.user_id = u.user_id
                 WHERE t.user_id = ?"
            ),
            [user_id],
            teacher_from_row,
        )
        .optional()?;
    teacher.ok_or_else(|| OpError::not_found("no teacher record for this account"))
}

pub fn list_teachers(conn: &Connection) -> OpResult<Vec<Teacher>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TEACHER_COLS} FROM teachers t
         JOIN users u ON t.user_id = u.user_id
         ORDER BY t.teacher_id"
    ))?;
    let rows = stmt
        .query_map([], teacher_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn search_teachers(conn: &Connection, keyword: &str) -> OpResult<Vec<Teacher>> {
    let pattern = format!("%{keyword}%");
    let mut stmt = conn.prepare(&format!(
        "SELECT {TEACHER_COLS} FROM teachers t
         JOIN users u ON t.user_id = u.user_id
         WHERE t.teacher_id LIKE ?1 OR t.name LIKE ?1
            OR t.department LIKE ?1 OR t.title LIKE ?1
         ORDER BY t.teacher_id"
    ))?;
    let rows = stmt
        .query_map([&pattern], teacher_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn update_teacher(
    conn: &Connection,
    teacher_id: &str,
    profile: &TeacherProfile,
) -> OpResult<()> {
    let changed = conn.execute(
        "UPDATE teachers SET
            name = ?, gender = ?, birth_date = ?, department = ?, title = ?,
            phone = ?, email = ?, office = ?, hire_date = ?,
            updated_at = CURRENT_TIMESTAMP
         WHERE teacher_id = ?",
        (
            &profile.name,
            &profile.gender,
            &profile.birth_date,
            &profile.department,
            &profile.title,
            &profile.phone,
            &profile.email,
            &profile.office,
            &profile.hire_date,
            teacher_id,
        ),
    )?;
    if changed == 0 {
        return Err(OpError::not_found(format!(
            "teacher '{teacher_id}' not found"
        )));
    }
    Ok(())
}

/// Remove a teacher and its account. Courses keep their rows but lose the
/// owner reference.
pub fn delete_teacher(conn: &mut Connection, teacher_id: &str) -> OpResult<()> {
    let tx = conn.transaction()?;
    let user_id: Option<i64> = tx
        .query_row(
            "SELECT user_id FROM teachers WHERE teacher_id = ?",
            [teacher_id],
            |r| r.get(0),
        )
        .optional()?;
    let Some(user_id) = user_id else {
        return Err(OpError::not_found(format!(
            "teacher '{teacher_id}' not found"
        )));
    };
    tx.execute(
        "UPDATE courses SET teacher_id = NULL WHERE teacher_id = ?",
        [teacher_id],
    )?;
    tx.execute("DELETE FROM teachers WHERE teacher_id = ?", [teacher_id])?;
    tx.execute("DELETE FROM users WHERE user_id = ?", [user_id])?;
    tx.commit()?;
    Ok(())
}

// ==================== courses ====================

fn course_from_row(row: &rusqlite::Row) -> rusqlite::Result<Course> {
    Ok(Course {
        course_id: row.get("course_id")?,
        course_name: row.get("course_name")?,
        teacher_id: row.get("teacher_id")?,
        teacher_name: row.get("teacher_name").ok(),
        credits: row.get("credits")?,
        hours: row.get("hours")?,
        semester: row.get("semester")?,
        class_time: row.get("class_time")?,
        classroom: row.get("classroom")?,
        capacity: row.get("capacity")?,
        status: row.get("status")?,
        enrolled_count: row.get("enrolled_count").ok(),
    })
}

pub fn list_courses(conn: &Connection) -> OpResult<Vec<Course>> {
    let mut stmt = conn.prepare(
        "SELECT c.*, t.name AS teacher_name,
            (SELECT COUNT(*) FROM enrollments e WHERE e.course_id = c.course_id)
                AS enrolled_count
         FROM courses c
         LEFT JOIN teachers t ON c.teacher_id = t.teacher_id
         ORDER BY c.course_id",
    )?;
    let rows = stmt
        .query_map([], course_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get_course(conn: &Connection, course_id: &str) -> OpResult<Course> {
    let course = conn
        .query_row(
            "SELECT c.*, t.name AS teacher_name,
                (SELECT COUNT(*) FROM enrollments e WHERE e.course_id = c.course_id)
                    AS enrolled_count
             FROM courses c
             LEFT JOIN teachers t ON c.teacher_id = t.teacher_id
             WHERE c.course_id = ?",
            [course_id],
            course_from_row,
        )
        .optional()?;
    course.ok_or_else(|| OpError::not_found(format!("course '{course_id}' not found")))
}

pub fn list_courses_by_teacher(conn: &Connection, teacher_id: &str) -> OpResult<Vec<Course>> {
    let mut stmt = conn.prepare(
        "SELECT c.*, t.name AS teacher_name,
            (SELECT COUNT(*) FROM enrollments e WHERE e.course_id = c.course_id)
                AS enrolled_count
         FROM courses c
         LEFT JOIN teachers t ON c.teacher_id = t.teacher_id
         WHERE c.teacher_id = ?
         ORDER BY c.course_id",
    )?;
    let rows = stmt
        .query_map([teacher_id], course_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn search_courses(conn: &Connection, keyword: &str) -> OpResult<Vec<Course>> {
    let pattern = format!("%{keyword}%");
    let mut stmt = conn.prepare(
        "SELECT c.*, t.name AS teacher_name,
            (SELECT COUNT(*) FROM enrollments e WHERE e.course_id = c.course_id)
                AS enrolled_count
         FROM courses c
         LEFT JOIN teachers t ON c.teacher_id = t.teacher_id
         WHERE c.course_id LIKE ?1 OR c.course_name LIKE ?1 OR c.semester LIKE ?1
         ORDER BY c.course_id",
    )?;
    let rows = stmt
        .query_map([&pattern], course_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn insert_course(conn: &Connection, course_id: &str, input: &CourseInput) -> OpResult<()> {
    match conn.execute(
        "INSERT INTO courses(
            course_id, course_name, teacher_id, credits, hours,
            semester, class_time, classroom, capacity, status
         ) VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        (
            course_id,
            &input.course_name,
            &input.teacher_id,
            input.credits,
            input.hours,
            &input.semester,
            &input.class_time,
            &input.classroom,
            input.capacity,
            &input.status,
        ),
    ) {
        Ok(_) => Ok(()),
        Err(e) if is_constraint_violation(&e) => Err(OpError::conflict(format!(
            "course '{course_id}' already exists"
        ))),
        Err(e) => Err(e.into()),
    }
}

pub fn update_course(conn: &Connection, course_id: &str, input: &CourseInput) -> OpResult<()> {
    let changed = conn.execute(
        "UPDATE courses SET
            course_name = ?, teacher_id = ?, credits = ?, hours = ?,
            semester = ?, class_time = ?, classroom = ?, capacity = ?,
            status = ?, updated_at = CURRENT_TIMESTAMP
         WHERE course_id = ?",
        (
            &input.course_name,
            &input.teacher_id,
            input.credits,
            input.hours,
            &input.semester,
            &input.class_time,
            &input.classroom,
            input.capacity,
            &input.status,
            course_id,
        ),
    )?;
    if changed == 0 {
        return Err(OpError::not_found(format!(
            "course '{course_id}' not found"
        )));
    }
    Ok(())
}

/// Remove a course together with its enrollments and grades.
pub fn delete_course(conn: &mut Connection, course_id: &str) -> OpResult<()> {
    let tx = conn.transaction()?;
    let exists: Option<i64> = tx
        .query_row(
            "SELECT 1 FROM courses WHERE course_id = ?",
            [course_id],
            |r| r.get(0),
        )
        .optional()?;
    if exists.is_none() {
        return Err(OpError::not_found(format!(
            "course '{course_id}' not found"
        )));
    }
    tx.execute("DELETE FROM enrollments WHERE course_id = ?", [course_id])?;
    tx.execute("DELETE FROM grades WHERE course_id = ?", [course_id])?;
    tx.execute("DELETE FROM courses WHERE course_id = ?", [course_id])?;
    tx.commit()?;
    Ok(())
}

// ==================== enrollments ====================

pub fn count_enrollments(conn: &Connection, course_id: &str) -> OpResult<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM enrollments WHERE course_id = ?",
        [course_id],
        |r| r.get(0),
    )?;
    Ok(count)
}

pub fn list_student_courses(conn: &Connection, student_id: &str) -> OpResult<Vec<EnrolledCourse>> {
    let mut stmt = conn.prepare(
        "SELECT c.course_id, c.course_name, t.name AS teacher_name, c.credits,
                c.semester, c.class_time, c.classroom, e.enrollment_date
         FROM enrollments e
         JOIN courses c ON e.course_id = c.course_id
         LEFT JOIN teachers t ON c.teacher_id = t.teacher_id
         WHERE e.student_id = ?
         ORDER BY c.course_id",
    )?;
    let rows = stmt
        .query_map([student_id], |row| {
            Ok(EnrolledCourse {
                course_id: row.get(0)?,
                course_name: row.get(1)?,
                teacher_name: row.get(2)?,
                credits: row.get(3)?,
                semester: row.get(4)?,
                class_time: row.get(5)?,
                classroom: row.get(6)?,
                enrollment_date: row.get(7)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn list_course_students(conn: &Connection, course_id: &str) -> OpResult<Vec<EnrolledStudent>> {
    let mut stmt = conn.prepare(
        "SELECT s.student_id, s.name, s.major, s.grade, s.class_name, e.enrollment_date
         FROM enrollments e
         JOIN students s ON e.student_id = s.student_id
         WHERE e.course_id = ?
         ORDER BY s.student_id",
    )?;
    let rows = stmt
        .query_map([course_id], |row| {
            Ok(EnrolledStudent {
                student_id: row.get(0)?,
                name: row.get(1)?,
                major: row.get(2)?,
                grade: row.get(3)?,
                class_name: row.get(4)?,
                enrollment_date: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ==================== grades ====================

/// Insert or update the grade for one (student, course) pair. The final
/// score and level are recomputed from the component scores on every write;
/// a row can never hold a final score inconsistent with its own components.
pub fn upsert_grade(
    conn: &Connection,
    student_id: &str,
    course_id: &str,
    usual_score: f64,
    exam_score: f64,
    semester: Option<&str>,
) -> OpResult<Grade> {
    let final_score = calc::final_score(usual_score, exam_score);
    let level = GradeLevel::from_score(final_score);
    conn.execute(
        "INSERT INTO grades(
            student_id, course_id, usual_score, exam_score,
            final_score, grade_level, semester
         ) VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(student_id, course_id) DO UPDATE SET
            usual_score = ?3, exam_score = ?4, final_score = ?5,
            grade_level = ?6, semester = ?7, updated_at = CURRENT_TIMESTAMP",
        (
            student_id,
            course_id,
            usual_score,
            exam_score,
            final_score,
            level.as_str(),
            semester,
        ),
    )?;
    Ok(Grade {
        student_id: student_id.to_string(),
        course_id: course_id.to_string(),
        usual_score,
        exam_score,
        final_score,
        grade_level: level.as_str().to_string(),
        semester: semester.map(|s| s.to_string()),
        course_name: None,
        credits: None,
        teacher_name: None,
        student_name: None,
    })
}

pub fn list_student_grades(conn: &Connection, student_id: &str) -> OpResult<Vec<Grade>> {
    let mut stmt = conn.prepare(
        "SELECT g.student_id, g.course_id, g.usual_score, g.exam_score,
                g.final_score, g.grade_level, g.semester,
                c.course_name, c.credits, t.name AS teacher_name
         FROM grades g
         JOIN courses c ON g.course_id = c.course_id
         LEFT JOIN teachers t ON c.teacher_id = t.teacher_id
         WHERE g.student_id = ?
         ORDER BY g.semester DESC, c.course_id",
    )?;
    let rows = stmt
        .query_map([student_id], |row| {
            Ok(Grade {
                student_id: row.get(0)?,
                course_id: row.get(1)?,
                usual_score: row.get(2)?,
                exam_score: row.get(3)?,
                final_score: row.get(4)?,
                grade_level: row.get(5)?,
                semester: row.get(6)?,
                course_name: row.get(7)?,
                credits: row.get(8)?,
                teacher_name: row.get(9)?,
                student_name: None,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn list_course_grades(conn: &Connection, course_id: &str) -> OpResult<Vec<Grade>> {
    let mut stmt = conn.prepare(
        "SELECT g.student_id, g.course_id, g.usual_score, g.exam_score,
                g.final_score, g.grade_level, g.semester, s.name AS student_name
         FROM grades g
         JOIN students s ON g.student_id = s.student_id
         WHERE g.course_id = ?
         ORDER BY g.final_score DESC",
    )?;
    let rows = stmt
        .query_map([course_id], |row| {
            Ok(Grade {
                student_id: row.get(0)?,
                course_id: row.get(1)?,
                usual_score: row.get(2)?,
                exam_score: row.get(3)?,
                final_score: row.get(4)?,
                grade_level: row.get(5)?,
                semester: row.get(6)?,
                course_name: None,
                credits: None,
                teacher_name: None,
                student_name: row.get(7)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn delete_grade(conn: &Connection, student_id: &str, course_id: &str) -> OpResult<()> {
    let deleted = conn.execute(
        "DELETE FROM grades WHERE student_id = ? AND course_id = ?",
        (student_id, course_id),
    )?;
    if deleted == 0 {
        return Err(OpError::not_found("grade not found"));
    }
    Ok(())
}

// ==================== reports ====================

#[derive(Debug, Clone, Serialize)]
pub struct Statistics {
    pub total_students: i64,
    pub total_teachers: i64,
    pub total_courses: i64,
    pub total_enrollments: i64,
    pub total_grades: i64,
    pub average_score: f64,
}

pub fn statistics(conn: &Connection) -> OpResult<Statistics> {
    let count = |sql: &str| -> rusqlite::Result<i64> { conn.query_row(sql, [], |r| r.get(0)) };
    let average: Option<f64> =
        conn.query_row("SELECT AVG(final_score) FROM grades", [], |r| r.get(0))?;
    Ok(Statistics {
        total_students: count("SELECT COUNT(*) FROM students")?,
        total_teachers: count("SELECT COUNT(*) FROM teachers")?,
        total_courses: count("SELECT COUNT(*) FROM courses")?,
        total_enrollments: count("SELECT COUNT(*) FROM enrollments")?,
        total_grades: count("SELECT COUNT(*) FROM grades")?,
        average_score: average.map(calc::trunc2).unwrap_or(0.0),
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct DistributionBucket {
    pub grade_level: String,
    pub count: i64,
}

/// Grade-level histogram, best band first, overall or for one course.
/// Empty inputs produce an empty series.
pub fn grade_distribution(
    conn: &Connection,
    course_id: Option<&str>,
) -> OpResult<Vec<DistributionBucket>> {
    let order = "ORDER BY CASE grade_level
            WHEN 'excellent' THEN 1
            WHEN 'good' THEN 2
            WHEN 'fair' THEN 3
            WHEN 'pass' THEN 4
            WHEN 'fail' THEN 5
         END";
    let map_row = |row: &rusqlite::Row| -> rusqlite::Result<DistributionBucket> {
        Ok(DistributionBucket {
            grade_level: row.get(0)?,
            count: row.get(1)?,
        })
    };
    let rows = match course_id {
        Some(cid) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT grade_level, COUNT(*) FROM grades
                 WHERE course_id = ? GROUP BY grade_level {order}"
            ))?;
            let it = stmt.query_map([cid], map_row)?;
            it.collect::<Result<Vec<_>, _>>()?
        }
        None => {
            let mut stmt = conn.prepare(&format!(
                "SELECT grade_level, COUNT(*) FROM grades GROUP BY grade_level {order}"
            ))?;
            let it = stmt.query_map([], map_row)?;
            it.collect::<Result<Vec<_>, _>>()?
        }
    };
    Ok(rows)
}

#[derive(Debug, Clone, Serialize)]
pub struct SemesterPoint {
    pub semester: String,
    pub average_score: f64,
    pub course_count: i64,
}

/// Per-semester average trend for one student, in semester order.
pub fn semester_trend(conn: &Connection, student_id: &str) -> OpResult<Vec<SemesterPoint>> {
    let mut stmt = conn.prepare(
        "SELECT semester, AVG(final_score), COUNT(*)
         FROM grades
         WHERE student_id = ? AND semester IS NOT NULL
         GROUP BY semester
         ORDER BY semester",
    )?;
    let rows = stmt
        .query_map([student_id], |row| {
            Ok(SemesterPoint {
                semester: row.get(0)?,
                average_score: row.get::<_, f64>(1)?,
                course_count: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows
        .into_iter()
        .map(|mut p| {
            p.average_score = calc::trunc2(p.average_score);
            p
        })
        .collect())
}

#[derive(Debug, Clone, Serialize)]
pub struct MajorAverage {
    pub major: String,
    pub average_score: f64,
    pub student_count: i64,
}

/// Average final score per major, descending.
pub fn major_averages(conn: &Connection) -> OpResult<Vec<MajorAverage>> {
    let mut stmt = conn.prepare(
        "SELECT s.major, AVG(g.final_score), COUNT(DISTINCT s.student_id)
         FROM grades g
         JOIN students s ON g.student_id = s.student_id
         WHERE s.major IS NOT NULL
         GROUP BY s.major
         ORDER BY AVG(g.final_score) DESC",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(MajorAverage {
                major: row.get(0)?,
                average_score: row.get::<_, f64>(1)?,
                student_count: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows
        .into_iter()
        .map(|mut m| {
            m.average_score = calc::trunc2(m.average_score);
            m
        })
        .collect())
}

#[derive(Debug, Clone, Serialize)]
pub struct RankingEntry {
    pub student_id: String,
    pub name: String,
    pub weighted_gpa: f64,
    pub graded_courses: i64,
}

/// Credit-weighted score ranking across all graded students, best first.
pub fn gpa_ranking(conn: &Connection, limit: i64) -> OpResult<Vec<RankingEntry>> {
    let mut stmt = conn.prepare(
        "SELECT s.student_id, s.name,
                SUM(g.final_score * c.credits) / SUM(c.credits), COUNT(*)
         FROM grades g
         JOIN students s ON g.student_id = s.student_id
         JOIN courses c ON g.course_id = c.course_id
         GROUP BY s.student_id
         HAVING SUM(c.credits) > 0
         ORDER BY SUM(g.final_score * c.credits) / SUM(c.credits) DESC
         LIMIT ?",
    )?;
    let rows = stmt
        .query_map([limit], |row| {
            Ok(RankingEntry {
                student_id: row.get(0)?,
                name: row.get(1)?,
                weighted_gpa: row.get::<_, f64>(2)?,
                graded_courses: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows
        .into_iter()
        .map(|mut r| {
            r.weighted_gpa = calc::trunc2(r.weighted_gpa);
            r
        })
        .collect())
}

// ==================== audit log ====================

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub log_id: i64,
    pub username: Option<String>,
    pub action: String,
    pub description: Option<String>,
    pub timestamp: Option<String>,
}

pub fn add_log(
    conn: &Connection,
    username: Option<&str>,
    action: &str,
    description: &str,
) -> OpResult<()> {
    conn.execute(
        "INSERT INTO logs(username, action, description) VALUES(?, ?, ?)",
        (username, action, description),
    )?;
    Ok(())
}

pub fn list_logs(conn: &Connection, limit: i64) -> OpResult<Vec<LogEntry>> {
    let mut stmt = conn.prepare(
        "SELECT log_id, username, action, description, timestamp
         FROM logs ORDER BY log_id DESC LIMIT ?",
    )?;
    let rows = stmt
        .query_map([limit], |row| {
            Ok(LogEntry {
                log_id: row.get(0)?,
                username: row.get(1)?,
                action: row.get(2)?,
                description: row.get(3)?,
                timestamp: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn clear_logs(conn: &Connection) -> OpResult<()> {
    conn.execute("DELETE FROM logs", [])?;
    Ok(())
}
