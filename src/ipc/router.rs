use super::fail;
use super::handlers;
use super::types::{Ctx, Request};

/// Flat operation-name dispatch. Each handler module claims the
/// operations it knows; anything left over is a structured failure, not a
/// dropped connection.
pub fn handle_request(ctx: &mut Ctx, req: &Request) -> serde_json::Value {
    if let Some(resp) = handlers::auth::try_handle(ctx, req) {
        return resp;
    }
    if let Some(resp) = handlers::users::try_handle(ctx, req) {
        return resp;
    }
    if let Some(resp) = handlers::students::try_handle(ctx, req) {
        return resp;
    }
    if let Some(resp) = handlers::teachers::try_handle(ctx, req) {
        return resp;
    }
    if let Some(resp) = handlers::courses::try_handle(ctx, req) {
        return resp;
    }
    if let Some(resp) = handlers::enrollment::try_handle(ctx, req) {
        return resp;
    }
    if let Some(resp) = handlers::grades::try_handle(ctx, req) {
        return resp;
    }
    if let Some(resp) = handlers::reports::try_handle(ctx, req) {
        return resp;
    }

    fail(format!("unknown operation: {}", req.operation))
}
