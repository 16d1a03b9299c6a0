use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestInit, Response};

use crate::types::{DeleteRequest, DeleteResponse, ErrorBody, LogEntry, LogUpdate, NewLog};

pub const LOGS_URL: &str = "/api/logs";

/// Failure of a call to the log service. The display text is what the page
/// shows in its error banner.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ApiError {
    #[error("{0}")]
    Network(String),
    #[error("Network response was not ok: {status_text}{}", detail_suffix(.detail))]
    Status {
        status: u16,
        status_text: String,
        detail: Option<String>,
    },
    #[error("Unexpected response: {0}")]
    Decode(String),
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_ref()
        .map(|d| format!(" ({d})"))
        .unwrap_or_default()
}

fn describe(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| value.dyn_ref::<js_sys::Error>().map(|e| e.message().into()))
        .unwrap_or_else(|| format!("{:?}", value))
}

fn network(value: JsValue) -> ApiError {
    ApiError::Network(describe(&value))
}

async fn send<B, T>(method: &str, body: Option<&B>) -> Result<T, ApiError>
where
    B: Serialize,
    T: DeserializeOwned,
{
    let window = web_sys::window().ok_or_else(|| ApiError::Network("window not available".into()))?;

    let opts = RequestInit::new();
    opts.set_method(method);
    if let Some(body) = body {
        let json = serde_json::to_string(body).map_err(|e| ApiError::Decode(e.to_string()))?;
        let headers = Headers::new().map_err(network)?;
        headers
            .set("Content-Type", "application/json")
            .map_err(network)?;
        opts.set_headers(headers.as_ref());
        opts.set_body(&JsValue::from_str(&json));
    }

    let request = Request::new_with_str_and_init(LOGS_URL, &opts).map_err(network)?;
    let resp_value = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(network)?;
    let resp: Response = resp_value.dyn_into().map_err(network)?;
    let json = JsFuture::from(resp.json().map_err(network)?).await;

    if !resp.ok() {
        let detail = json
            .ok()
            .and_then(|value| serde_wasm_bindgen::from_value::<ErrorBody>(value).ok())
            .map(|body| body.error);
        return Err(ApiError::Status {
            status: resp.status(),
            status_text: resp.status_text(),
            detail,
        });
    }

    let json = json.map_err(|e| ApiError::Decode(describe(&e)))?;
    serde_wasm_bindgen::from_value(json).map_err(|e| ApiError::Decode(e.to_string()))
}

pub async fn fetch_logs() -> Result<Vec<LogEntry>, ApiError> {
    send::<(), _>("GET", None).await
}

pub async fn create_log(log: &NewLog) -> Result<LogEntry, ApiError> {
    send("POST", Some(log)).await
}

pub async fn update_log(update: &LogUpdate) -> Result<LogEntry, ApiError> {
    send("PUT", Some(update)).await
}

pub async fn delete_log(id: String) -> Result<DeleteResponse, ApiError> {
    send("DELETE", Some(&DeleteRequest { id })).await
}
