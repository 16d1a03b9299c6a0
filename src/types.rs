use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: String,
    pub content: String,
    pub date: NaiveDate,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl LogEntry {
    /// Value for a date input, e.g. `2024-05-01`.
    pub fn date_value(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// `2024-05-01 - 07:30:00`: the entry's date, then the UTC time it was logged.
    pub fn heading(&self) -> String {
        format!("{} - {}", self.date_value(), self.timestamp.format("%H:%M:%S"))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewLog {
    pub content: String,
    pub date: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LogUpdate {
    pub id: String,
    pub content: String,
    pub date: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DeleteRequest {
    pub id: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
