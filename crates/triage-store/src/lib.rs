//! CivicTriage Store: persistence of ranked complaints.

pub mod schema;
pub mod sqlite;

pub use sqlite::SqliteStore;

use chrono::Utc;
use sha2::{Digest, Sha256};
use triage_core::{ComplaintResult, ComplaintStatus, Result, StoredComplaint};
use uuid::Uuid;

/// Destination for ranked results.
pub trait ComplaintSink: Send + Sync {
    fn persist(&self, complaint: &StoredComplaint) -> Result<()>;
}

/// SHA-256 hex digest of a complaint text.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Wrap a ranked result as a new open record with a fresh id.
pub fn new_record(result: ComplaintResult) -> StoredComplaint {
    StoredComplaint {
        id: Uuid::new_v4(),
        created_at: Utc::now(),
        status: ComplaintStatus::Open,
        content_hash: content_hash(&result.extracted.complaint),
        result,
    }
}
