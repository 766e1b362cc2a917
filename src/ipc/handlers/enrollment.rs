use serde_json::json;

use crate::engine::{self, DropOutcome, EnrollOutcome};
use crate::ipc::helpers::need_str;
use crate::ipc::types::{Ctx, Request};
use crate::ipc::{fail, fail_err, ok, ok_message};
use crate::store;

fn handle_enroll_course(ctx: &mut Ctx, req: &Request) -> serde_json::Value {
    let result = (|| {
        let student_id = need_str(&req.args, "student_id")?.to_string();
        let course_id = need_str(&req.args, "course_id")?.to_string();
        engine::enroll(&mut ctx.conn, &student_id, &course_id)
    })();
    match result {
        Ok(EnrollOutcome::Enrolled) => ok_message(EnrollOutcome::Enrolled.message()),
        Ok(outcome) => fail(outcome.message()),
        Err(e) => fail_err(&e),
    }
}

fn handle_drop_course(ctx: &mut Ctx, req: &Request) -> serde_json::Value {
    let result = (|| {
        let student_id = need_str(&req.args, "student_id")?;
        let course_id = need_str(&req.args, "course_id")?;
        engine::drop_course(&ctx.conn, student_id, course_id)
    })();
    match result {
        Ok(DropOutcome::Dropped) => ok_message("dropped"),
        Ok(DropOutcome::NotEnrolled) => fail("not enrolled in this course"),
        Err(e) => fail_err(&e),
    }
}

fn handle_list_student_courses(ctx: &mut Ctx, req: &Request) -> serde_json::Value {
    let result = (|| {
        let student_id = need_str(&req.args, "student_id")?;
        store::list_student_courses(&ctx.conn, student_id)
    })();
    match result {
        Ok(courses) => ok(json!({ "courses": courses })),
        Err(e) => fail_err(&e),
    }
}

fn handle_list_course_students(ctx: &mut Ctx, req: &Request) -> serde_json::Value {
    let result = (|| {
        let course_id = need_str(&req.args, "course_id")?;
        store::list_course_students(&ctx.conn, course_id)
    })();
    match result {
        Ok(students) => ok(json!({ "students": students })),
        Err(e) => fail_err(&e),
    }
}

pub fn try_handle(ctx: &mut Ctx, req: &Request) -> Option<serde_json::Value> {
    match req.operation.as_str() {
        "enroll_course" => Some(handle_enroll_course(ctx, req)),
        "drop_course" => Some(handle_drop_course(ctx, req)),
        "list_student_courses" => Some(handle_list_student_courses(ctx, req)),
        "list_course_students" => Some(handle_list_course_students(ctx, req)),
        _ => None,
    }
}
