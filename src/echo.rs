//! Purpose: The `POST /` echo handler and its JSON envelopes.
//! Exports: `EchoState`, `EchoEnvelope`, `ErrorEnvelope`, `ErrorBody`, `echo`.
//! Role: Receive -> decode -> log -> respond; no other side effects.
//! Invariants: Success responses are always 200 `{"status":"ok","received":<value>}`.
//! Invariants: `received` is the decoded body, never reordered or transformed.
//! Invariants: Undecodable bodies become `null` unless strict mode is on (then 400).
//! Invariants: Bodies nested past `MAX_NESTING_DEPTH` count as undecodable.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Error, ErrorKind, status_code};
use crate::json::parse;

pub const STATUS_OK: &str = "ok";

#[derive(Clone, Copy, Debug, Default)]
pub struct EchoState {
    pub strict_json: bool,
}

#[derive(Debug, Serialize)]
pub struct EchoEnvelope {
    pub status: &'static str,
    pub received: Value,
}

impl EchoEnvelope {
    pub fn ok(received: Value) -> Self {
        Self {
            status: STATUS_OK,
            received,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<&'static str>,
}

impl From<&Error> for ErrorEnvelope {
    fn from(err: &Error) -> Self {
        Self {
            error: ErrorBody {
                kind: format!("{:?}", err.kind()),
                message: err.message().unwrap_or("error").to_string(),
                hint: err.hint().map(str::to_string),
                category: err.category(),
            },
        }
    }
}

pub async fn echo(State(state): State<Arc<EchoState>>, body: Bytes) -> Response {
    let received = match decode_body(&body, state.strict_json) {
        Ok(received) => received,
        Err(err) => return error_response(err),
    };
    info!("Received JSON: {received}");
    Json(EchoEnvelope::ok(received)).into_response()
}

fn decode_body(body: &[u8], strict_json: bool) -> Result<Value, Error> {
    match parse::from_slice(body) {
        Ok(value) => Ok(value),
        Err(err) => {
            let category = parse::categorize(body, &err);
            if strict_json {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message("invalid JSON body")
                    .with_hint(parse::hint_for_error(category, "POST /"))
                    .with_category(category.label())
                    .with_source(err));
            }
            debug!(
                category = category.label(),
                bytes = body.len(),
                "request body could not be decoded; echoing null"
            );
            Ok(Value::Null)
        }
    }
}

fn error_response(err: Error) -> Response {
    let status = status_code(err.kind());
    (status, Json(ErrorEnvelope::from(&err))).into_response()
}
