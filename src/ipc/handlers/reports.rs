use serde_json::json;

use crate::ipc::helpers::{need_str, opt_i64, opt_str};
use crate::ipc::types::{Ctx, Request};
use crate::ipc::{fail_err, ok, ok_message};
use crate::store;

fn handle_get_statistics(ctx: &mut Ctx, _req: &Request) -> serde_json::Value {
    match store::statistics(&ctx.conn) {
        Ok(stats) => ok(json!({ "statistics": stats })),
        Err(e) => fail_err(&e),
    }
}

fn handle_get_grade_distribution(ctx: &mut Ctx, req: &Request) -> serde_json::Value {
    let course_id = opt_str(&req.args, "course_id");
    match store::grade_distribution(&ctx.conn, course_id.as_deref()) {
        Ok(buckets) => ok(json!({ "distribution": buckets })),
        Err(e) => fail_err(&e),
    }
}

fn handle_get_semester_trend(ctx: &mut Ctx, req: &Request) -> serde_json::Value {
    let result = (|| {
        let student_id = need_str(&req.args, "student_id")?;
        store::semester_trend(&ctx.conn, student_id)
    })();
    match result {
        Ok(points) => ok(json!({ "trend": points })),
        Err(e) => fail_err(&e),
    }
}

fn handle_get_major_averages(ctx: &mut Ctx, _req: &Request) -> serde_json::Value {
    match store::major_averages(&ctx.conn) {
        Ok(rows) => ok(json!({ "majors": rows })),
        Err(e) => fail_err(&e),
    }
}

fn handle_get_gpa_ranking(ctx: &mut Ctx, req: &Request) -> serde_json::Value {
    let limit = opt_i64(&req.args, "limit").unwrap_or(50);
    match store::gpa_ranking(&ctx.conn, limit) {
        Ok(rows) => ok(json!({ "ranking": rows })),
        Err(e) => fail_err(&e),
    }
}

fn handle_get_logs(ctx: &mut Ctx, req: &Request) -> serde_json::Value {
    let limit = opt_i64(&req.args, "limit").unwrap_or(100);
    match store::list_logs(&ctx.conn, limit) {
        Ok(logs) => ok(json!({ "logs": logs })),
        Err(e) => fail_err(&e),
    }
}

fn handle_clear_logs(ctx: &mut Ctx, _req: &Request) -> serde_json::Value {
    match store::clear_logs(&ctx.conn) {
        Ok(()) => ok_message("logs cleared"),
        Err(e) => fail_err(&e),
    }
}

pub fn try_handle(ctx: &mut Ctx, req: &Request) -> Option<serde_json::Value> {
    match req.operation.as_str() {
        "get_statistics" => Some(handle_get_statistics(ctx, req)),
        "get_grade_distribution" => Some(handle_get_grade_distribution(ctx, req)),
        "get_semester_trend" => Some(handle_get_semester_trend(ctx, req)),
        "get_major_averages" => Some(handle_get_major_averages(ctx, req)),
        "get_gpa_ranking" => Some(handle_get_gpa_ranking(ctx, req)),
        "get_logs" => Some(handle_get_logs(ctx, req)),
        "clear_logs" => Some(handle_clear_logs(ctx, req)),
        _ => None,
    }
}
