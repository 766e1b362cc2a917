use rusqlite::Connection;
use serde::Deserialize;

/// One framed request: an operation name plus a bag of arguments,
/// validated per-operation by the handler that claims it.
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    pub operation: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

/// Per-worker dispatch context. Each connection worker owns its own
/// database connection so its uncommitted transactions stay invisible to
/// other workers.
pub struct Ctx {
    pub conn: Connection,
}

impl Ctx {
    pub fn new(conn: Connection) -> Self {
        Ctx { conn }
    }
}
