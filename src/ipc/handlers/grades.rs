use serde_json::json;

use crate::engine;
use crate::ipc::helpers::{need_f64, need_str, opt_str};
use crate::ipc::types::{Ctx, Request};
use crate::ipc::{fail_err, ok, ok_message};
use crate::store;

fn handle_record_grade(ctx: &mut Ctx, req: &Request) -> serde_json::Value {
    let result = (|| {
        let student_id = need_str(&req.args, "student_id")?;
        let course_id = need_str(&req.args, "course_id")?;
        let usual_score = need_f64(&req.args, "usual_score")?;
        let exam_score = need_f64(&req.args, "exam_score")?;
        let semester = opt_str(&req.args, "semester");
        engine::record_grade(
            &ctx.conn,
            student_id,
            course_id,
            usual_score,
            exam_score,
            semester.as_deref(),
        )
    })();
    match result {
        Ok(grade) => ok(json!({ "grade": grade })),
        Err(e) => fail_err(&e),
    }
}

fn handle_list_student_grades(ctx: &mut Ctx, req: &Request) -> serde_json::Value {
    let result = (|| {
        let student_id = need_str(&req.args, "student_id")?;
        store::list_student_grades(&ctx.conn, student_id)
    })();
    match result {
        Ok(grades) => ok(json!({ "grades": grades })),
        Err(e) => fail_err(&e),
    }
}

fn handle_list_course_grades(ctx: &mut Ctx, req: &Request) -> serde_json::Value {
    let result = (|| {
        let course_id = need_str(&req.args, "course_id")?;
        store::list_course_grades(&ctx.conn, course_id)
    })();
    match result {
        Ok(grades) => ok(json!({ "grades": grades })),
        Err(e) => fail_err(&e),
    }
}

fn handle_delete_grade(ctx: &mut Ctx, req: &Request) -> serde_json::Value {
    let result = (|| {
        let student_id = need_str(&req.args, "student_id")?;
        let course_id = need_str(&req.args, "course_id")?;
        store::delete_grade(&ctx.conn, student_id, course_id)
    })();
    match result {
        Ok(()) => ok_message("grade deleted"),
        Err(e) => fail_err(&e),
    }
}

pub fn try_handle(ctx: &mut Ctx, req: &Request) -> Option<serde_json::Value> {
    match req.operation.as_str() {
        "record_grade" => Some(handle_record_grade(ctx, req)),
        "list_student_grades" => Some(handle_list_student_grades(ctx, req)),
        "list_course_grades" => Some(handle_list_course_grades(ctx, req)),
        "delete_grade" => Some(handle_delete_grade(ctx, req)),
        _ => None,
    }
}
