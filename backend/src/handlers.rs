use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Json,
};
use std::sync::Arc;
use tracing::warn;

use crate::{
    error::Result,
    services::LogService,
    storage::schema::LogEntry,
    types::{CreateLog, DeleteLog, MessageResponse, UpdateLog, DELETED_MESSAGE},
};

pub async fn list_logs(State(service): State<Arc<LogService>>) -> Result<Json<Vec<LogEntry>>> {
    let logs = service
        .list()
        .await
        .inspect_err(|e| warn!("Logs retrieval failed: {}", e))?;
    Ok(Json(logs))
}

pub async fn create_log(
    State(service): State<Arc<LogService>>,
    payload: std::result::Result<Json<CreateLog>, JsonRejection>,
) -> Result<(StatusCode, Json<LogEntry>)> {
    let Json(request) = payload?;
    let created = service
        .create(request)
        .await
        .inspect_err(|e| warn!("Log creation failed: {}", e))?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn delete_log(
    State(service): State<Arc<LogService>>,
    payload: std::result::Result<Json<DeleteLog>, JsonRejection>,
) -> Result<Json<MessageResponse>> {
    let Json(request) = payload?;
    service
        .delete(request)
        .await
        .inspect_err(|e| warn!("Log deletion failed: {}", e))?;
    Ok(Json(MessageResponse::new(DELETED_MESSAGE)))
}

pub async fn update_log(
    State(service): State<Arc<LogService>>,
    payload: std::result::Result<Json<UpdateLog>, JsonRejection>,
) -> Result<Json<LogEntry>> {
    let Json(request) = payload?;
    let updated = service
        .update(request)
        .await
        .inspect_err(|e| warn!("Log update failed: {}", e))?;
    Ok(Json(updated))
}
