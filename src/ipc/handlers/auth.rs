use serde_json::json;

use crate::ipc::helpers::{need_i64, need_str};
use crate::ipc::types::{Ctx, Request};
use crate::ipc::{audit, fail_err, ok, ok_message};
use crate::{store, validate};

fn handle_login(ctx: &mut Ctx, req: &Request) -> serde_json::Value {
    let creds = (|| {
        let username = need_str(&req.args, "username")?;
        let password = need_str(&req.args, "password")?;
        Ok((username, password))
    })();
    let (username, password) = match creds {
        Ok(v) => v,
        Err(e) => return fail_err(&e),
    };

    match store::authenticate(&ctx.conn, username, password) {
        Ok(account) => {
            audit(
                &ctx.conn,
                Some(username),
                "login",
                &format!("user {username} logged in"),
            );
            ok(json!({ "user": account }))
        }
        Err(e) => fail_err(&e),
    }
}

fn handle_change_password(ctx: &mut Ctx, req: &Request) -> serde_json::Value {
    let result = (|| {
        let username = need_str(&req.args, "username")?;
        let old_password = need_str(&req.args, "old_password")?;
        let new_password = need_str(&req.args, "new_password")?;
        validate::password(new_password)?;
        store::change_password(&ctx.conn, username, old_password, new_password)
    })();
    match result {
        Ok(()) => ok_message("password changed"),
        Err(e) => fail_err(&e),
    }
}

/// Administrative reset; no old password required.
fn handle_reset_password(ctx: &mut Ctx, req: &Request) -> serde_json::Value {
    let result = (|| {
        let user_id = need_i64(&req.args, "user_id")?;
        let new_password = need_str(&req.args, "new_password")?;
        validate::password(new_password)?;
        store::reset_password(&ctx.conn, user_id, new_password)?;
        audit(
            &ctx.conn,
            None,
            "reset_password",
            &format!("password reset for user {user_id}"),
        );
        Ok(())
    })();
    match result {
        Ok(()) => ok_message("password reset"),
        Err(e) => fail_err(&e),
    }
}

pub fn try_handle(ctx: &mut Ctx, req: &Request) -> Option<serde_json::Value> {
    match req.operation.as_str() {
        "login" => Some(handle_login(ctx, req)),
        "change_password" => Some(handle_change_password(ctx, req)),
        "reset_password" => Some(handle_reset_password(ctx, req)),
        _ => None,
    }
}
