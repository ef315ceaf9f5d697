//! SQLite complaint store.

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Params, Row};
use tracing::{debug, info};
use triage_core::{ComplaintResult, ComplaintStatus, Error, Result, StoredComplaint};
use uuid::Uuid;

use crate::schema::SCHEMA_SQL;
use crate::ComplaintSink;

const DB_FILE: &str = "civictriage.db";

const SELECT_COLUMNS: &str = "id, created_at, status, content_hash, result_json";

/// SQLite-backed complaint store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

/// Columns as stored, before decoding.
struct ComplaintRow {
    id: String,
    created_at: String,
    status: String,
    content_hash: String,
    result_json: String,
}

impl ComplaintRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            created_at: row.get("created_at")?,
            status: row.get("status")?,
            content_hash: row.get("content_hash")?,
            result_json: row.get("result_json")?,
        })
    }

    fn decode(self) -> Result<StoredComplaint> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| Error::Database(format!("bad complaint id '{}': {}", self.id, e)))?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| Error::Database(format!("bad created_at for {}: {}", id, e)))?
            .with_timezone(&Utc);
        let status = ComplaintStatus::parse(&self.status)
            .ok_or_else(|| Error::Database(format!("bad status '{}' for {}", self.status, id)))?;
        let result: ComplaintResult = serde_json::from_str(&self.result_json)?;
        Ok(StoredComplaint {
            id,
            created_at,
            status,
            content_hash: self.content_hash,
            result,
        })
    }
}

fn db_err(e: rusqlite::Error) -> Error {
    Error::Database(e.to_string())
}

fn query_rows<P: Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<ComplaintRow>> {
    let mut stmt = conn.prepare_cached(sql).map_err(db_err)?;
    let rows = stmt
        .query_map(params, ComplaintRow::from_row)
        .map_err(db_err)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(db_err)?;
    Ok(rows)
}

fn timestamp(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl SqliteStore {
    /// Open or create the store at `db_dir/civictriage.db`.
    pub fn open(db_dir: impl AsRef<Path>) -> Result<Self> {
        let db_dir = db_dir.as_ref();
        std::fs::create_dir_all(db_dir).map_err(|e| Error::Storage(e.to_string()))?;
        let db_path = db_dir.join(DB_FILE);

        let conn = Connection::open(&db_path).map_err(db_err)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(db_err)?;
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path,
        };
        info!(
            "SqliteStore initialized: {} complaints, path={}",
            store.count_complaints()?,
            store.db_path.display()
        );
        Ok(store)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn count_complaints(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM complaints", [], |row| row.get(0))
            .map_err(db_err)?;
        Ok(n as usize)
    }

    /// Newest first, optionally restricted to one status.
    pub fn list_complaints(
        &self,
        limit: usize,
        status: Option<ComplaintStatus>,
    ) -> Result<Vec<StoredComplaint>> {
        let conn = self.conn.lock();
        let limit = limit.min(i64::MAX as usize) as i64;
        let rows = match status {
            Some(status) => query_rows(
                &conn,
                &format!(
                    "SELECT {} FROM complaints WHERE status = ?1 \
                     ORDER BY created_at DESC, rowid DESC LIMIT ?2",
                    SELECT_COLUMNS
                ),
                params![status.as_str(), limit],
            )?,
            None => query_rows(
                &conn,
                &format!(
                    "SELECT {} FROM complaints ORDER BY created_at DESC, rowid DESC LIMIT ?1",
                    SELECT_COLUMNS
                ),
                params![limit],
            )?,
        };
        rows.into_iter().map(ComplaintRow::decode).collect()
    }

    pub fn get_complaint(&self, id: &Uuid) -> Result<Option<StoredComplaint>> {
        let conn = self.conn.lock();
        let row = conn
            .query_row(
                &format!("SELECT {} FROM complaints WHERE id = ?1", SELECT_COLUMNS),
                params![id.to_string()],
                ComplaintRow::from_row,
            )
            .optional()
            .map_err(db_err)?;
        row.map(ComplaintRow::decode).transpose()
    }

    /// Move a complaint to a new workflow status and return the updated record.
    pub fn update_status(&self, id: &Uuid, status: ComplaintStatus) -> Result<StoredComplaint> {
        let changed = {
            let conn = self.conn.lock();
            conn.execute(
                "UPDATE complaints SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![status.as_str(), timestamp(&Utc::now()), id.to_string()],
            )
            .map_err(db_err)?
        };
        if changed == 0 {
            return Err(Error::NotFound(format!("complaint {}", id)));
        }
        debug!("Complaint {} -> {}", id, status.as_str());
        self.get_complaint(id)?
            .ok_or_else(|| Error::NotFound(format!("complaint {}", id)))
    }
}

impl ComplaintSink for SqliteStore {
    fn persist(&self, complaint: &StoredComplaint) -> Result<()> {
        let result_json = serde_json::to_string(&complaint.result)?;
        let analysis = &complaint.result.risk_analysis;

        let conn = self.conn.lock();
        conn.prepare_cached(
            "INSERT INTO complaints \
             (id, filename, created_at, status, risk_score, severity, priority, content_hash, result_json) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .map_err(db_err)?
        .execute(params![
            complaint.id.to_string(),
            complaint.result.filename,
            timestamp(&complaint.created_at),
            complaint.status.as_str(),
            analysis.risk_score,
            analysis.severity.to_string(),
            analysis.priority.to_string(),
            complaint.content_hash,
            result_json,
        ])
        .map_err(db_err)?;
        debug!("Persisted complaint {} ({})", complaint.id, complaint.result.filename);
        Ok(())
    }
}
