//! Lead import types

use serde::{Deserialize, Serialize};

/// Errors shown inline before collapsing into a "+N more" line
pub const SUMMARY_ERROR_LIMIT: usize = 5;

/// Outcome of one spreadsheet import.
///
/// Every data row contributes exactly one outcome: a created property, an
/// updated property, or one error string of the form `"Row N: <message>"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub created: u32,
    pub updated: u32,
    pub errors: Vec<String>,
}

impl ImportResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_created(&mut self) {
        self.created += 1;
    }

    pub fn record_updated(&mut self) {
        self.updated += 1;
    }

    pub fn record_error(&mut self, row_number: usize, message: impl std::fmt::Display) {
        self.errors.push(format!("Row {}: {}", row_number, message));
    }

    pub fn processed(&self) -> u32 {
        self.created + self.updated + self.errors.len() as u32
    }

    /// Human readable report, truncating the error list
    pub fn summary(&self) -> String {
        let mut report = format!("Created {}, updated {}", self.created, self.updated);
        if !self.errors.is_empty() {
            report.push_str(&format!(", {} error(s)\n", self.errors.len()));
            for err in self.errors.iter().take(SUMMARY_ERROR_LIMIT) {
                report.push_str(err);
                report.push('\n');
            }
            if self.errors.len() > SUMMARY_ERROR_LIMIT {
                report.push_str(&format!("+{} more\n", self.errors.len() - SUMMARY_ERROR_LIMIT));
            }
        }
        report
    }
}

/// Import request over NATS (workbook bytes are base64 encoded)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyImportRequest {
    pub filename: String,
    #[serde(default)]
    pub content_base64: String,
}

/// Import history listing request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportHistoryRequest {
    #[serde(default)]
    pub limit: Option<usize>,
}
