use serde_json::json;

use crate::engine;
use crate::ipc::helpers::{need_i64, need_str, opt_str};
use crate::ipc::types::{Ctx, Request};
use crate::ipc::{audit, fail_err, ok, ok_message};
use crate::store::{self, StudentProfile};

fn profile_from_args(args: &serde_json::Value) -> crate::error::OpResult<StudentProfile> {
    Ok(StudentProfile {
        name: need_str(args, "name")?.to_string(),
        gender: opt_str(args, "gender"),
        birth_date: opt_str(args, "birth_date"),
        major: opt_str(args, "major"),
        grade: opt_str(args, "grade"),
        class_name: opt_str(args, "class_name"),
        phone: opt_str(args, "phone"),
        email: opt_str(args, "email"),
        address: opt_str(args, "address"),
    })
}

fn handle_get_student_profile(ctx: &mut Ctx, req: &Request) -> serde_json::Value {
    let result = (|| {
        let user_id = need_i64(&req.args, "user_id")?;
        store::get_student_by_user(&ctx.conn, user_id)
    })();
    match result {
        Ok(student) => ok(json!({ "student": student })),
        Err(e) => fail_err(&e),
    }
}

fn handle_get_student(ctx: &mut Ctx, req: &Request) -> serde_json::Value {
    let result = (|| {
        let student_id = need_str(&req.args, "student_id")?;
        store::get_student(&ctx.conn, student_id)
    })();
    match result {
        Ok(student) => ok(json!({ "student": student })),
        Err(e) => fail_err(&e),
    }
}

fn handle_list_students(ctx: &mut Ctx, _req: &Request) -> serde_json::Value {
    match store::list_students(&ctx.conn) {
        Ok(students) => ok(json!({ "students": students })),
        Err(e) => fail_err(&e),
    }
}

fn handle_search_students(ctx: &mut Ctx, req: &Request) -> serde_json::Value {
    let result = (|| {
        let keyword = need_str(&req.args, "keyword")?;
        store::search_students(&ctx.conn, keyword)
    })();
    match result {
        Ok(students) => ok(json!({ "students": students })),
        Err(e) => fail_err(&e),
    }
}

fn handle_add_student(ctx: &mut Ctx, req: &Request) -> serde_json::Value {
    let result = (|| {
        let student_id = need_str(&req.args, "student_id")?.to_string();
        let username = need_str(&req.args, "username")?.to_string();
        let password = need_str(&req.args, "password")?.to_string();
        let profile = profile_from_args(&req.args)?;
        let user_id =
            engine::create_student(&mut ctx.conn, &student_id, &username, &password, &profile)?;
        audit(
            &ctx.conn,
            None,
            "add_student",
            &format!("student {student_id} created"),
        );
        Ok(user_id)
    })();
    match result {
        Ok(user_id) => ok(json!({ "user_id": user_id })),
        Err(e) => fail_err(&e),
    }
}

fn handle_update_student(ctx: &mut Ctx, req: &Request) -> serde_json::Value {
    let result = (|| {
        let student_id = need_str(&req.args, "student_id")?;
        let profile = profile_from_args(&req.args)?;
        store::update_student(&ctx.conn, student_id, &profile)?;
        audit(
            &ctx.conn,
            None,
            "update_student",
            &format!("student {student_id} updated"),
        );
        Ok(())
    })();
    match result {
        Ok(()) => ok_message("student updated"),
        Err(e) => fail_err(&e),
    }
}

fn handle_delete_student(ctx: &mut Ctx, req: &Request) -> serde_json::Value {
    let result = (|| {
        let student_id = need_str(&req.args, "student_id")?.to_string();
        store::delete_student(&mut ctx.conn, &student_id)?;
        audit(
            &ctx.conn,
            None,
            "delete_student",
            &format!("student {student_id} deleted"),
        );
        Ok(())
    })();
    match result {
        Ok(()) => ok_message("student deleted"),
        Err(e) => fail_err(&e),
    }
}

pub fn try_handle(ctx: &mut Ctx, req: &Request) -> Option<serde_json::Value> {
    match req.operation.as_str() {
        "get_student_profile" => Some(handle_get_student_profile(ctx, req)),
        "get_student" => Some(handle_get_student(ctx, req)),
        "list_students" => Some(handle_list_students(ctx, req)),
        "search_students" => Some(handle_search_students(ctx, req)),
        "add_student" => Some(handle_add_student(ctx, req)),
        "update_student" => Some(handle_update_student(ctx, req)),
        "delete_student" => Some(handle_delete_student(ctx, req)),
        _ => None,
    }
}
