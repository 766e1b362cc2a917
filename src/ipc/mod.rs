mod helpers;
mod router;
mod types;

pub mod handlers;

pub use router::handle_request;
pub use types::{Ctx, Request};

use serde_json::json;

use crate::error::OpError;

pub fn ok(data: serde_json::Value) -> serde_json::Value {
    json!({
        "success": true,
        "data": data,
    })
}

pub fn ok_message(message: impl Into<String>) -> serde_json::Value {
    json!({
        "success": true,
        "message": message.into(),
    })
}

pub fn fail(message: impl Into<String>) -> serde_json::Value {
    json!({
        "success": false,
        "message": message.into(),
    })
}

/// Serialize an operation error. Database failures are logged server-side
/// and crossed the wire as a generic message; the taxonomy (validation,
/// conflict, not-found) goes through as-is.
pub fn fail_err(err: &OpError) -> serde_json::Value {
    if let OpError::Db(e) = err {
        tracing::error!(error = %e, "database error");
    }
    fail(err.client_message())
}

/// Append an audit row. A failed write must not fail the operation that
/// triggered it, but it is warned about rather than dropped on the floor.
pub(crate) fn audit(
    conn: &rusqlite::Connection,
    username: Option<&str>,
    action: &str,
    description: &str,
) {
    if let Err(e) = crate::store::add_log(conn, username, action, description) {
        tracing::warn!(action, error = %e, "audit log write failed");
    }
}
