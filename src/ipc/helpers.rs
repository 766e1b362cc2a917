use serde_json::Value;

use crate::error::{OpError, OpResult};

/// Required string argument.
pub fn need_str<'a>(args: &'a Value, key: &str) -> OpResult<&'a str> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| OpError::validation(format!("missing args.{key}")))
}

/// Optional string argument; absent, null and empty all mean "not given".
pub fn opt_str(args: &Value, key: &str) -> Option<String> {
    args.get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

pub fn need_f64(args: &Value, key: &str) -> OpResult<f64> {
    args.get(key)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| OpError::validation(format!("missing args.{key}")))
}

pub fn need_i64(args: &Value, key: &str) -> OpResult<i64> {
    args.get(key)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| OpError::validation(format!("missing args.{key}")))
}

pub fn opt_i64(args: &Value, key: &str) -> Option<i64> {
    args.get(key).and_then(|v| v.as_i64())
}
