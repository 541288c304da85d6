//! Outcome of schema migrations over a directory's records

use super::ids::RecordId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Per-record result of a batch schema change (rename, type change, field
/// delete, category removal).
///
/// Batches are not atomic. Records that failed are listed and kept as a
/// [`PendingMigration`] until a retry rewrites them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    /// Records rewritten
    pub succeeded: usize,
    /// Records that could not be read or written
    pub failed: usize,
    pub failed_ids: Vec<RecordId>,
    /// Records that needed no change
    pub skipped: usize,
}

impl MigrationReport {
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }

    pub(crate) fn record_failure(&mut self, id: RecordId) {
        self.failed += 1;
        self.failed_ids.push(id);
    }

    /// Warn when the batch left records behind.
    pub(crate) fn warn_if_partial(&self, op: &str, directory: &str) {
        if !self.is_complete() {
            warn!(
                op,
                directory,
                succeeded = self.succeeded,
                failed = self.failed,
                failed_ids = ?self.failed_ids,
                "schema migration partially applied"
            );
        }
    }
}

/// The per-record rewrite a batch applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "camelCase")]
pub enum MigrationStep {
    /// Move the value under `from` to the field's current key, coercing it to
    /// the field's current type when `retype` is set
    #[serde(rename_all = "camelCase")]
    MoveValue {
        field_id: String,
        from: String,
        retype: bool,
    },
    /// Drop a key from every record
    RemoveKey { key: String },
    /// Clear category paths that pass through any of these nodes
    ClearCategory { nodes: Vec<String> },
}

/// A batch that left records behind, stored until they are retried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingMigration {
    pub id: String,
    #[serde(flatten)]
    pub step: MigrationStep,
    pub record_ids: Vec<RecordId>,
    pub created_at: DateTime<Utc>,
}

impl PendingMigration {
    pub fn new(step: MigrationStep, record_ids: Vec<RecordId>) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            step,
            record_ids,
            created_at: Utc::now(),
        }
    }
}
