//! CDP JSON-RPC message framing.
//!
//! Outgoing commands carry an auto-incremented `id`; the browser answers
//! with the same `id` and either `result` or `error`. Messages without an
//! `id` are events, which this client does not subscribe to.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CdpError;

#[derive(Debug, Serialize)]
struct Command<'a> {
    id: u64,
    method: &'a str,
    params: &'a Value,
}

/// Serialise one command frame.
pub fn encode_command(id: u64, method: &str, params: &Value) -> Result<String, CdpError> {
    serde_json::to_string(&Command { id, method, params })
        .map_err(|e| CdpError::Protocol(format!("failed to serialise {method}: {e}")))
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    Response {
        id: u64,
        outcome: Result<Value, RpcError>,
    },
    Event {
        method: String,
    },
}

/// Classify one text frame from the browser.
pub fn decode_incoming(text: &str) -> Result<Incoming, CdpError> {
    let json: Value = serde_json::from_str(text)
        .map_err(|e| CdpError::Protocol(format!("malformed frame: {e}")))?;

    if let Some(id) = json.get("id").and_then(Value::as_u64) {
        let outcome = match json.get("error") {
            Some(err) => Err(serde_json::from_value(err.clone()).map_err(|e| {
                CdpError::Protocol(format!("malformed error object for id {id}: {e}"))
            })?),
            None => Ok(json.get("result").cloned().unwrap_or(Value::Null)),
        };
        return Ok(Incoming::Response { id, outcome });
    }

    match json.get("method").and_then(Value::as_str) {
        Some(method) => Ok(Incoming::Event {
            method: method.to_string(),
        }),
        None => Err(CdpError::Protocol(
            "frame is neither response nor event".to_string(),
        )),
    }
}

/// Unwrap a `Runtime.evaluate` result, surfacing page exceptions.
pub fn evaluate_value(result: &Value) -> Result<Value, CdpError> {
    if let Some(exception) = result.get("exceptionDetails") {
        let message = exception
            .get("exception")
            .and_then(|e| e.get("description"))
            .and_then(Value::as_str)
            .or_else(|| exception.get("text").and_then(Value::as_str))
            .unwrap_or("unknown exception");
        return Err(CdpError::JsException(message.to_string()));
    }
    Ok(result
        .get("result")
        .and_then(|r| r.get("value"))
        .cloned()
        .unwrap_or(Value::Null))
}
