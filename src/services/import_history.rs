//! Import history
//!
//! Keeps the most recent import runs in memory, newest first.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::ImportResult;

const MAX_HISTORY_SIZE: usize = 100;

/// How an import run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportRunStatus {
    Completed,
    Failed,
}

/// One import run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRun {
    pub id: Uuid,
    pub user_id: Uuid,
    pub filename: String,
    pub status: ImportRunStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub created: u32,
    pub updated: u32,
    pub error_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response for listing import history
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportHistoryResponse {
    pub runs: Vec<ImportRun>,
    pub total: usize,
}

/// Bounded in-memory history of import runs
pub struct ImportHistory {
    runs: RwLock<VecDeque<ImportRun>>,
}

impl ImportHistory {
    pub fn new() -> Self {
        Self {
            runs: RwLock::new(VecDeque::with_capacity(MAX_HISTORY_SIZE)),
        }
    }

    /// Record a run that processed the file, whatever the row outcomes
    pub fn record_completed(
        &self,
        id: Uuid,
        user_id: Uuid,
        filename: &str,
        started_at: DateTime<Utc>,
        result: &ImportResult,
    ) {
        let completed_at = Utc::now();
        self.add_entry(ImportRun {
            id,
            user_id,
            filename: filename.to_string(),
            status: ImportRunStatus::Completed,
            started_at,
            completed_at,
            duration_ms: duration_ms(started_at, completed_at),
            created: result.created,
            updated: result.updated,
            error_count: result.errors.len(),
            error: None,
        });
    }

    /// Record a run rejected before any row was processed
    pub fn record_failed(&self, id: Uuid, user_id: Uuid, filename: &str, started_at: DateTime<Utc>, error: String) {
        let completed_at = Utc::now();
        self.add_entry(ImportRun {
            id,
            user_id,
            filename: filename.to_string(),
            status: ImportRunStatus::Failed,
            started_at,
            completed_at,
            duration_ms: duration_ms(started_at, completed_at),
            created: 0,
            updated: 0,
            error_count: 0,
            error: Some(error),
        });
    }

    fn add_entry(&self, run: ImportRun) {
        let mut runs = self.runs.write();
        if runs.len() >= MAX_HISTORY_SIZE {
            runs.pop_back();
        }
        runs.push_front(run);
    }

    /// Recent runs of one user
    pub fn recent_for_user(&self, user_id: Uuid, limit: usize) -> ImportHistoryResponse {
        let runs: Vec<ImportRun> = self
            .runs
            .read()
            .iter()
            .filter(|r| r.user_id == user_id)
            .take(limit)
            .cloned()
            .collect();
        let total = runs.len();

        ImportHistoryResponse { runs, total }
    }
}

impl Default for ImportHistory {
    fn default() -> Self {
        Self::new()
    }
}

fn duration_ms(started_at: DateTime<Utc>, completed_at: DateTime<Utc>) -> u64 {
    (completed_at - started_at).num_milliseconds().max(0) as u64
}
