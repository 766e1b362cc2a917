use serde_json::json;

use crate::engine;
use crate::ipc::helpers::{need_f64, need_i64, need_str, opt_str};
use crate::ipc::types::{Ctx, Request};
use crate::ipc::{audit, fail_err, ok, ok_message};
use crate::store::{self, CourseInput};

fn input_from_args(args: &serde_json::Value) -> crate::error::OpResult<CourseInput> {
    Ok(CourseInput {
        course_name: need_str(args, "course_name")?.to_string(),
        teacher_id: opt_str(args, "teacher_id"),
        credits: need_f64(args, "credits")?,
        hours: need_i64(args, "hours")?,
        semester: opt_str(args, "semester"),
        class_time: opt_str(args, "class_time"),
        classroom: opt_str(args, "classroom"),
        capacity: args.get("capacity").and_then(|v| v.as_i64()).unwrap_or(50),
        status: opt_str(args, "status").unwrap_or_else(|| "open".to_string()),
    })
}

fn handle_list_courses(ctx: &mut Ctx, _req: &Request) -> serde_json::Value {
    match store::list_courses(&ctx.conn) {
        Ok(courses) => ok(json!({ "courses": courses })),
        Err(e) => fail_err(&e),
    }
}

fn handle_get_course(ctx: &mut Ctx, req: &Request) -> serde_json::Value {
    let result = (|| {
        let course_id = need_str(&req.args, "course_id")?;
        store::get_course(&ctx.conn, course_id)
    })();
    match result {
        Ok(course) => ok(json!({ "course": course })),
        Err(e) => fail_err(&e),
    }
}

fn handle_list_courses_by_teacher(ctx: &mut Ctx, req: &Request) -> serde_json::Value {
    let result = (|| {
        let teacher_id = need_str(&req.args, "teacher_id")?;
        store::list_courses_by_teacher(&ctx.conn, teacher_id)
    })();
    match result {
        Ok(courses) => ok(json!({ "courses": courses })),
        Err(e) => fail_err(&e),
    }
}

fn handle_search_courses(ctx: &mut Ctx, req: &Request) -> serde_json::Value {
    let result = (|| {
        let keyword = need_str(&req.args, "keyword")?;
        store::search_courses(&ctx.conn, keyword)
    })();
    match result {
        Ok(courses) => ok(json!({ "courses": courses })),
        Err(e) => fail_err(&e),
    }
}

fn handle_add_course(ctx: &mut Ctx, req: &Request) -> serde_json::Value {
    let result = (|| {
        let course_id = need_str(&req.args, "course_id")?;
        let input = input_from_args(&req.args)?;
        engine::create_course(&ctx.conn, course_id, &input)?;
        audit(
            &ctx.conn,
            None,
            "add_course",
            &format!("course {course_id} created"),
        );
        Ok(())
    })();
    match result {
        Ok(()) => ok_message("course created"),
        Err(e) => fail_err(&e),
    }
}

fn handle_update_course(ctx: &mut Ctx, req: &Request) -> serde_json::Value {
    let result = (|| {
        let course_id = need_str(&req.args, "course_id")?;
        let input = input_from_args(&req.args)?;
        store::update_course(&ctx.conn, course_id, &input)?;
        audit(
            &ctx.conn,
            None,
            "update_course",
            &format!("course {course_id} updated"),
        );
        Ok(())
    })();
    match result {
        Ok(()) => ok_message("course updated"),
        Err(e) => fail_err(&e),
    }
}

fn handle_delete_course(ctx: &mut Ctx, req: &Request) -> serde_json::Value {
    let result = (|| {
        let course_id = need_str(&req.args, "course_id")?.to_string();
        store::delete_course(&mut ctx.conn, &course_id)?;
        audit(
            &ctx.conn,
            None,
            "delete_course",
            &format!("course {course_id} deleted"),
        );
        Ok(())
    })();
    match result {
        Ok(()) => ok_message("course deleted"),
        Err(e) => fail_err(&e),
    }
}

pub fn try_handle(ctx: &mut Ctx, req: &Request) -> Option<serde_json::Value> {
    match req.operation.as_str() {
        "list_courses" => Some(handle_list_courses(ctx, req)),
        "get_course" => Some(handle_get_course(ctx, req)),
        "list_courses_by_teacher" => Some(handle_list_courses_by_teacher(ctx, req)),
        "search_courses" => Some(handle_search_courses(ctx, req)),
        "add_course" => Some(handle_add_course(ctx, req)),
        "update_course" => Some(handle_update_course(ctx, req)),
        "delete_course" => Some(handle_delete_course(ctx, req)),
        _ => None,
    }
}
