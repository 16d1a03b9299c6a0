use tracing::{debug, info};

use crate::{
    error::{Result, ServiceError},
    storage::{
        self,
        schema::{self, LogEntry, NewLogEntry},
        ConnectionManager,
    },
    types::{CreateLog, DeleteLog, UpdateLog},
};

/// CRUD over the log collection. Every operation fetches the shared
/// connection first, which opens the store on the very first call.
#[derive(Debug)]
pub struct LogService {
    connections: ConnectionManager,
}

impl LogService {
    pub fn new(connections: ConnectionManager) -> Self {
        Self { connections }
    }

    pub fn connections(&self) -> &ConnectionManager {
        &self.connections
    }

    pub async fn list(&self) -> Result<Vec<LogEntry>> {
        let db = self.connections.connect().await?;
        let logs = db.run(storage::list_logs).await?;
        debug!("Listed {} logs", logs.len());
        Ok(logs)
    }

    pub async fn create(&self, request: CreateLog) -> Result<LogEntry> {
        let db = self.connections.connect().await?;
        let entry = NewLogEntry::validate(
            request.content.as_deref(),
            request.date.as_deref(),
            request.timestamp,
        )?;
        let created = db.run(move |conn| storage::insert_log(conn, &entry)).await?;
        info!("Created log {} for {}", created.id, created.date);
        Ok(created)
    }

    /// Deleting an id that does not exist still succeeds.
    pub async fn delete(&self, request: DeleteLog) -> Result<()> {
        let db = self.connections.connect().await?;
        let id = schema::parse_id(request.id.as_deref())?;
        let removed = db.run(move |conn| storage::delete_log(conn, &id)).await?;
        if removed {
            info!("Deleted log {}", id);
        } else {
            debug!("Delete of unknown log {} treated as success", id);
        }
        Ok(())
    }

    pub async fn update(&self, request: UpdateLog) -> Result<LogEntry> {
        let db = self.connections.connect().await?;
        let id = schema::parse_id(request.id.as_deref())?;
        let content = request
            .content
            .as_deref()
            .map(schema::normalize_content)
            .transpose()?;
        let date = request
            .date
            .as_deref()
            .map(schema::parse_date)
            .transpose()?;

        let updated = db
            .run(move |conn| storage::update_log(conn, &id, content.as_deref(), date))
            .await?
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))?;
        info!("Updated log {}", updated.id);
        Ok(updated)
    }
}
