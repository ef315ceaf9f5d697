//! Database schema SQL.

/// Ranked complaints. `result_json` holds the full `ComplaintResult`; the
/// scalar columns duplicate the fields the dashboard filters and sorts on.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS complaints (
    id TEXT PRIMARY KEY,
    filename TEXT NOT NULL,
    created_at TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'open',
    risk_score REAL NOT NULL,
    severity TEXT NOT NULL,
    priority TEXT NOT NULL,
    content_hash TEXT NOT NULL,
    result_json TEXT NOT NULL,
    updated_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_complaints_created ON complaints(created_at);
CREATE INDEX IF NOT EXISTS idx_complaints_status ON complaints(status);
CREATE INDEX IF NOT EXISTS idx_complaints_hash ON complaints(content_hash);
"#;
