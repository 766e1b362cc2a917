use serde_json::json;

use crate::engine;
use crate::ipc::helpers::{need_i64, need_str, opt_str};
use crate::ipc::types::{Ctx, Request};
use crate::ipc::{audit, fail_err, ok, ok_message};
use crate::store::{self, TeacherProfile};

fn profile_from_args(args: &serde_json::Value) -> crate::error::OpResult<TeacherProfile> {
    Ok(TeacherProfile {
        name: need_str(args, "name")?.to_string(),
        gender: opt_str(args, "gender"),
        birth_date: opt_str(args, "birth_date"),
        department: opt_str(args, "department"),
        title: opt_str(args, "title"),
        phone: opt_str(args, "phone"),
        email: opt_str(args, "email"),
        office: opt_str(args, "office"),
        hire_date: opt_str(args, "hire_date"),
    })
}

fn handle_get_teacher_profile(ctx: &mut Ctx, req: &Request) -> serde_json::Value {
    let result = (|| {
        let user_id = need_i64(&req.args, "user_id")?;
        store::get_teacher_by_user(&ctx.conn, user_id)
    })();
    match result {
        Ok(teacher) => ok(json!({ "teacher": teacher })),
        Err(e) => fail_err(&e),
    }
}

fn handle_get_teacher(ctx: &mut Ctx, req: &Request) -> serde_json::Value {
    let result = (|| {
        let teacher_id = need_str(&req.args, "teacher_id")?;
        store::get_teacher(&ctx.conn, teacher_id)
    })();
    match result {
        Ok(teacher) => ok(json!({ "teacher": teacher })),
        Err(e) => fail_err(&e),
    }
}

fn handle_list_teachers(ctx: &mut Ctx, _req: &Request) -> serde_json::Value {
    match store::list_teachers(&ctx.conn) {
        Ok(teachers) => ok(json!({ "teachers": teachers })),
        Err(e) => fail_err(&e),
    }
}

fn handle_search_teachers(ctx: &mut Ctx, req: &Request) -> serde_json::Value {
    let result = (|| {
        let keyword = need_str(&req.args, "keyword")?;
        store::search_teachers(&ctx.conn, keyword)
    })();
    match result {
        Ok(teachers) => ok(json!({ "teachers": teachers })),
        Err(e) => fail_err(&e),
    }
}

fn handle_add_teacher(ctx: &mut Ctx, req: &Request) -> serde_json::Value {
    let result = (|| {
        let teacher_id = need_str(&req.args, "teacher_id")?.to_string();
        let username = need_str(&req.args, "username")?.to_string();
        let password = need_str(&req.args, "password")?.to_string();
        let profile = profile_from_args(&req.args)?;
        let user_id =
            engine::create_teacher(&mut ctx.conn, &teacher_id, &username, &password, &profile)?;
        audit(
            &ctx.conn,
            None,
            "add_teacher",
            &format!("teacher {teacher_id} created"),
        );
        Ok(user_id)
    })();
    match result {
        Ok(user_id) => ok(json!({ "user_id": user_id })),
        Err(e) => fail_err(&e),
    }
}

fn handle_update_teacher(ctx: &mut Ctx, req: &Request) -> serde_json::Value {
    let result = (|| {
        let teacher_id = need_str(&req.args, "teacher_id")?;
        let profile = profile_from_args(&req.args)?;
        store::update_teacher(&ctx.conn, teacher_id, &profile)?;
        audit(
            &ctx.conn,
            None,
            "update_teacher",
            &format!("teacher {teacher_id} updated"),
        );
        Ok(())
    })();
    match result {
        Ok(()) => ok_message("teacher updated"),
        Err(e) => fail_err(&e),
    }
}

fn handle_delete_teacher(ctx: &mut Ctx, req: &Request) -> serde_json::Value {
    let result = (|| {
        let teacher_id = need_str(&req.args, "teacher_id")?.to_string();
        store::delete_teacher(&mut ctx.conn, &teacher_id)?;
        audit(
            &ctx.conn,
            None,
            "delete_teacher",
            &format!("teacher {teacher_id} deleted"),
        );
        Ok(())
    })();
    match result {
        Ok(()) => ok_message("teacher deleted"),
        Err(e) => fail_err(&e),
    }
}

pub fn try_handle(ctx: &mut Ctx, req: &Request) -> Option<serde_json::Value> {
    match req.operation.as_str() {
        "get_teacher_profile" => Some(handle_get_teacher_profile(ctx, req)),
        "get_teacher" => Some(handle_get_teacher(ctx, req)),
        "list_teachers" => Some(handle_list_teachers(ctx, req)),
        "search_teachers" => Some(handle_search_teachers(ctx, req)),
        "add_teacher" => Some(handle_add_teacher(ctx, req)),
        "update_teacher" => Some(handle_update_teacher(ctx, req)),
        "delete_teacher" => Some(handle_delete_teacher(ctx, req)),
        _ => None,
    }
}
