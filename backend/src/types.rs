use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DELETED_MESSAGE: &str = "Log deleted successfully";

/// Body of `POST /api/logs`. Unknown fields are dropped.
#[derive(Debug, Default, Deserialize)]
pub struct CreateLog {
    pub content: Option<String>,
    pub date: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Body of `PUT /api/logs`. Omitted fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateLog {
    pub id: Option<String>,
    pub content: Option<String>,
    pub date: Option<String>,
}

/// Body of `DELETE /api/logs`.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteLog {
    pub id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
