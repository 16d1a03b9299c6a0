//! Storage layer for daily logs.
//!
//! The store is an embedded SQLite database holding the `logs` collection.
//! [`ConnectionManager`] opens it once per process and hands out clones of
//! the same [`Database`] handle to every request.

pub mod schema;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::OnceCell;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Result, ServiceError};
use schema::{LogEntry, NewLogEntry};

/// Where the store lives, parsed from the connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionTarget {
    Memory,
    File(PathBuf),
}

impl ConnectionTarget {
    pub fn parse(url: &str) -> Self {
        let url = url.trim();
        let rest = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
            .unwrap_or(url);
        if rest == ":memory:" {
            Self::Memory
        } else {
            Self::File(PathBuf::from(rest))
        }
    }
}

impl std::fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => f.write_str(":memory:"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Shared handle to the open store.
#[derive(Debug, Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens the store and makes sure the log collection exists. Blocking.
    pub fn open(target: &ConnectionTarget) -> Result<Self> {
        let conn = match target {
            ConnectionTarget::Memory => Connection::open_in_memory()?,
            ConnectionTarget::File(path) => open_file(path)?,
        };
        conn.execute_batch(schema::CREATE_COLLECTION)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Whether both handles refer to the same underlying connection.
    pub fn same_connection(&self, other: &Database) -> bool {
        Arc::ptr_eq(&self.conn, &other.conn)
    }

    /// Runs `op` against the connection on the blocking pool.
    pub async fn run<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock();
            op(&guard)
        })
        .await?
    }
}

fn open_file(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ServiceError::StorageUnavailable(format!(
                    "failed to create directory {}: {e}",
                    parent.display()
                ))
            })?;
        }
    }
    let conn = Connection::open(path).map_err(|e| {
        ServiceError::StorageUnavailable(format!(
            "failed to open database at {}: {e}",
            path.display()
        ))
    })?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
    Ok(conn)
}

/// Lazily opens the store on first use and caches the handle.
///
/// Callers that arrive while the first attempt is still in flight wait for
/// that attempt instead of opening their own. A failed attempt is not cached,
/// so the next caller tries again.
#[derive(Debug)]
pub struct ConnectionManager {
    target: ConnectionTarget,
    handle: OnceCell<Database>,
}

impl ConnectionManager {
    pub fn new(database_url: &str) -> Self {
        Self {
            target: ConnectionTarget::parse(database_url),
            handle: OnceCell::new(),
        }
    }

    pub fn target(&self) -> &ConnectionTarget {
        &self.target
    }

    pub fn is_connected(&self) -> bool {
        self.handle.initialized()
    }

    pub async fn connect(&self) -> Result<Database> {
        let db = self
            .handle
            .get_or_try_init(|| async {
                let target = self.target.clone();
                info!("Connecting to log store at {}", target);
                let db = tokio::task::spawn_blocking(move || Database::open(&target)).await??;
                info!("Log store ready");
                Ok::<_, ServiceError>(db)
            })
            .await?;
        Ok(db.clone())
    }
}

pub fn list_logs(conn: &Connection) -> Result<Vec<LogEntry>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM {} ORDER BY timestamp DESC, created_at DESC, seq DESC",
        schema::SELECT_COLUMNS,
        schema::COLLECTION
    ))?;
    let logs = stmt
        .query_map([], schema::row_to_entry)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(logs)
}

pub fn find_log(conn: &Connection, id: &Uuid) -> Result<Option<LogEntry>> {
    let entry = conn
        .query_row(
            &format!(
                "SELECT {} FROM {} WHERE id = ?1",
                schema::SELECT_COLUMNS,
                schema::COLLECTION
            ),
            [id.to_string()],
            schema::row_to_entry,
        )
        .optional()?;
    Ok(entry)
}

pub fn insert_log(conn: &Connection, entry: &NewLogEntry) -> Result<LogEntry> {
    let id = Uuid::new_v4();
    let now = Utc::now();
    let timestamp = entry.timestamp.unwrap_or(now);

    // Commit only once the stored row reads back cleanly.
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        r"
        INSERT INTO logs (id, content, date, timestamp, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?5)
        ",
        params![
            id.to_string(),
            entry.content,
            schema::encode_date(&entry.date),
            schema::encode_instant(&timestamp),
            schema::encode_instant(&now),
        ],
    )?;
    let stored = find_log(&tx, &id)?.ok_or_else(|| {
        ServiceError::StorageUnavailable(format!("log {id} vanished after insert"))
    })?;
    tx.commit()?;
    debug!("Inserted log {}", id);
    Ok(stored)
}

/// Applies the given changes; `None` when no log has that id.
pub fn update_log(
    conn: &Connection,
    id: &Uuid,
    content: Option<&str>,
    date: Option<NaiveDate>,
) -> Result<Option<LogEntry>> {
    let changed = conn.execute(
        r"
        UPDATE logs
        SET content = COALESCE(?1, content),
            date = COALESCE(?2, date),
            updated_at = ?3
        WHERE id = ?4
        ",
        params![
            content,
            date.as_ref().map(schema::encode_date),
            schema::encode_instant(&Utc::now()),
            id.to_string(),
        ],
    )?;
    if changed == 0 {
        return Ok(None);
    }
    debug!("Updated log {}", id);
    find_log(conn, id)
}

/// Returns whether a log was removed.
pub fn delete_log(conn: &Connection, id: &Uuid) -> Result<bool> {
    let removed = conn.execute("DELETE FROM logs WHERE id = ?1", [id.to_string()])?;
    debug!("Deleted {} log(s) with id {}", removed, id);
    Ok(removed > 0)
}

pub fn count_logs(conn: &Connection) -> Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM logs", [], |row| row.get(0))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Datelike, Duration};

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(schema::CREATE_COLLECTION).unwrap();
        conn
    }

    fn new_entry(content: &str, date: &str) -> NewLogEntry {
        NewLogEntry::validate(Some(content), Some(date), None).unwrap()
    }

    #[test]
    fn parses_connection_strings() {
        assert_eq!(ConnectionTarget::parse(":memory:"), ConnectionTarget::Memory);
        assert_eq!(ConnectionTarget::parse("sqlite::memory:"), ConnectionTarget::Memory);
        assert_eq!(
            ConnectionTarget::parse("sqlite:///var/lib/logs.db"),
            ConnectionTarget::File(PathBuf::from("/var/lib/logs.db"))
        );
        assert_eq!(
            ConnectionTarget::parse("dailylog.db"),
            ConnectionTarget::File(PathBuf::from("dailylog.db"))
        );
    }

    #[test]
    fn insert_assigns_server_fields() {
        let conn = memory_db();
        let before = Utc::now() - Duration::milliseconds(1);
        let entry = insert_log(&conn, &new_entry("Went for a run", "2024-05-01")).unwrap();

        assert_eq!(entry.content, "Went for a run");
        assert_eq!(entry.date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert!(entry.timestamp >= before);
        assert!(entry.timestamp <= Utc::now());
        assert_eq!(entry.created_at, entry.updated_at);
    }

    #[test]
    fn insert_honors_supplied_timestamp() {
        let conn = memory_db();
        let at = DateTime::parse_from_rfc3339("2023-01-02T03:04:05Z")
            .unwrap()
            .with_timezone(&Utc);
        let new = NewLogEntry::validate(Some("backfilled"), Some("2023-01-02"), Some(at)).unwrap();
        let entry = insert_log(&conn, &new).unwrap();
        assert_eq!(entry.timestamp, at);
    }

    #[test]
    fn list_orders_newest_timestamp_first() {
        let conn = memory_db();
        let base = Utc::now();
        for (i, content) in ["first", "second", "third"].iter().enumerate() {
            let at = base - Duration::minutes(10 - i as i64);
            let new = NewLogEntry::validate(Some(content), Some("2024-05-01"), Some(at)).unwrap();
            insert_log(&conn, &new).unwrap();
        }

        let logs = list_logs(&conn).unwrap();
        let contents: Vec<_> = logs.iter().map(|l| l.content.as_str()).collect();
        assert_eq!(contents, ["third", "second", "first"]);
    }

    #[test]
    fn update_changes_only_mutable_fields() {
        let conn = memory_db();
        let original = insert_log(&conn, &new_entry("draft", "2024-05-01")).unwrap();
        let new_date = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();

        let updated = update_log(&conn, &original.id, Some("final"), Some(new_date))
            .unwrap()
            .unwrap();
        assert_eq!(updated.id, original.id);
        assert_eq!(updated.timestamp, original.timestamp);
        assert_eq!(updated.created_at, original.created_at);
        assert_eq!(updated.content, "final");
        assert_eq!(updated.date, new_date);
        assert!(updated.updated_at >= original.updated_at);
    }

    #[test]
    fn update_keeps_omitted_fields() {
        let conn = memory_db();
        let original = insert_log(&conn, &new_entry("keep me", "2024-05-01")).unwrap();
        let updated = update_log(&conn, &original.id, None, None).unwrap().unwrap();
        assert_eq!(updated.content, "keep me");
        assert_eq!(updated.date, original.date);
    }

    #[test]
    fn unreadable_insert_is_rolled_back() {
        let conn = memory_db();
        let at = DateTime::parse_from_rfc3339("2024-05-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
            .with_year(10000)
            .unwrap();
        let entry = NewLogEntry {
            content: "from the far future".into(),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            timestamp: Some(at),
        };

        assert!(insert_log(&conn, &entry).is_err());
        assert_eq!(count_logs(&conn).unwrap(), 0);
        assert!(list_logs(&conn).unwrap().is_empty());
    }

    #[test]
    fn update_unknown_id_is_none() {
        let conn = memory_db();
        assert!(update_log(&conn, &Uuid::new_v4(), Some("x"), None)
            .unwrap()
            .is_none());
    }

    #[test]
    fn delete_reports_whether_removed() {
        let conn = memory_db();
        let entry = insert_log(&conn, &new_entry("bye", "2024-05-01")).unwrap();
        assert!(delete_log(&conn, &entry.id).unwrap());
        assert!(!delete_log(&conn, &entry.id).unwrap());
        assert_eq!(count_logs(&conn).unwrap(), 0);
    }

    #[test]
    fn unicode_content_round_trips() {
        let conn = memory_db();
        let entry = insert_log(&conn, &new_entry("今日は走った 🏃", "2024-05-01")).unwrap();
        let found = find_log(&conn, &entry.id).unwrap().unwrap();
        assert_eq!(found.content, "今日は走った 🏃");
    }

    #[tokio::test]
    async fn connect_opens_once() {
        let manager = ConnectionManager::new(":memory:");
        assert!(!manager.is_connected());

        let first = manager.connect().await.unwrap();
        let second = manager.connect().await.unwrap();
        assert!(manager.is_connected());
        assert!(first.same_connection(&second));
    }

    #[tokio::test]
    async fn unreachable_target_is_storage_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();
        let url = blocker.join("nested").join("logs.db");
        let manager = ConnectionManager::new(url.to_str().unwrap());

        let err = manager.connect().await.unwrap_err();
        assert!(matches!(err, ServiceError::StorageUnavailable(_)));
        assert!(!manager.is_connected());

        // The failure is not remembered: once the path is usable, connect works.
        std::fs::remove_file(&blocker).unwrap();
        let db = manager.connect().await.unwrap();
        assert!(manager.is_connected());
        assert!(db.same_connection(&manager.connect().await.unwrap()));
        assert!(url.exists());
    }
}
