//! Shape and validation of a persisted log entry.

use chrono::{DateTime, Datelike, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, ServiceError};

/// Collection every log entry is stored in.
pub const COLLECTION: &str = "logs";

pub(crate) const CREATE_COLLECTION: &str = r"
    CREATE TABLE IF NOT EXISTS logs (
        seq        INTEGER PRIMARY KEY AUTOINCREMENT,
        id         TEXT NOT NULL UNIQUE,
        content    TEXT NOT NULL CHECK (length(trim(content)) > 0),
        date       TEXT NOT NULL,
        timestamp  TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_logs_timestamp ON logs(timestamp DESC);
";

pub(crate) const SELECT_COLUMNS: &str =
    "id, content, date, timestamp, created_at, updated_at";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: Uuid,
    pub content: String,
    pub date: NaiveDate,
    pub timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated entry that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLogEntry {
    pub content: String,
    pub date: NaiveDate,
    pub timestamp: Option<DateTime<Utc>>,
}

impl NewLogEntry {
    pub fn validate(
        content: Option<&str>,
        date: Option<&str>,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<Self> {
        let content = content.ok_or_else(|| ServiceError::validation("content is required"))?;
        let date = date.ok_or_else(|| ServiceError::validation("date is required"))?;
        Ok(Self {
            content: normalize_content(content)?,
            date: parse_date(date)?,
            timestamp: timestamp.map(check_instant).transpose()?,
        })
    }
}

/// Only four-digit years keep the stored text fixed-width and readable back.
pub fn check_instant(instant: DateTime<Utc>) -> Result<DateTime<Utc>> {
    if (0..=9999).contains(&instant.year()) {
        Ok(instant)
    } else {
        Err(ServiceError::validation(format!(
            "timestamp '{}' is out of range",
            instant.to_rfc3339()
        )))
    }
}

/// Trims content and rejects it when nothing is left.
pub fn normalize_content(content: &str) -> Result<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::validation("content is required"));
    }
    Ok(trimmed.to_string())
}

/// Accepts a calendar date (`2024-05-01`) or an RFC 3339 instant, whose UTC
/// date is kept.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ServiceError::validation("date is required"));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|instant| instant.with_timezone(&Utc).date_naive())
        .map_err(|_| ServiceError::validation(format!("invalid date '{raw}'")))
}

pub fn parse_id(raw: Option<&str>) -> Result<Uuid> {
    let raw = raw.ok_or_else(|| ServiceError::validation("id is required"))?;
    Uuid::parse_str(raw.trim())
        .map_err(|_| ServiceError::validation(format!("invalid id '{raw}'")))
}

/// Instants are stored with a fixed width so text order matches time order.
pub(crate) fn encode_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn encode_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn decode_instant(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|instant| instant.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

pub(crate) fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<LogEntry> {
    let id: String = row.get(0)?;
    let date: String = row.get(2)?;
    let timestamp: String = row.get(3)?;
    let created_at: String = row.get(4)?;
    let updated_at: String = row.get(5)?;

    Ok(LogEntry {
        id: Uuid::parse_str(&id).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?,
        content: row.get(1)?,
        date: NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?,
        timestamp: decode_instant(3, &timestamp)?,
        created_at: decode_instant(4, &created_at)?,
        updated_at: decode_instant(5, &updated_at)?,
    })
}
