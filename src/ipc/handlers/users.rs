use serde_json::json;

use crate::ipc::helpers::{need_i64, need_str};
use crate::ipc::types::{Ctx, Request};
use crate::ipc::{audit, fail_err, ok, ok_message};
use crate::store;

fn handle_list_users(ctx: &mut Ctx, _req: &Request) -> serde_json::Value {
    match store::list_accounts(&ctx.conn) {
        Ok(users) => ok(json!({ "users": users })),
        Err(e) => fail_err(&e),
    }
}

fn handle_set_user_status(ctx: &mut Ctx, req: &Request) -> serde_json::Value {
    let result = (|| {
        let user_id = need_i64(&req.args, "user_id")?;
        let status = need_str(&req.args, "status")?;
        store::set_account_status(&ctx.conn, user_id, status)?;
        audit(
            &ctx.conn,
            None,
            "set_user_status",
            &format!("user {user_id} set {status}"),
        );
        Ok(())
    })();
    match result {
        Ok(()) => ok_message("status updated"),
        Err(e) => fail_err(&e),
    }
}

fn handle_delete_user(ctx: &mut Ctx, req: &Request) -> serde_json::Value {
    let result = (|| {
        let user_id = need_i64(&req.args, "user_id")?;
        store::delete_account(&ctx.conn, user_id)?;
        audit(
            &ctx.conn,
            None,
            "delete_user",
            &format!("user {user_id} deleted"),
        );
        Ok(())
    })();
    match result {
        Ok(()) => ok_message("user deleted"),
        Err(e) => fail_err(&e),
    }
}

pub fn try_handle(ctx: &mut Ctx, req: &Request) -> Option<serde_json::Value> {
    match req.operation.as_str() {
        "list_users" => Some(handle_list_users(ctx, req)),
        "set_user_status" => Some(handle_set_user_status(ctx, req)),
        "delete_user" => Some(handle_delete_user(ctx, req)),
        _ => None,
    }
}
