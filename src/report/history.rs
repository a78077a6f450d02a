//! Append-only run history with a caller-chosen capacity.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::FilterReport;

/// A report together with the time it was recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub report: FilterReport,
}

/// Bounded log of filtering reports, oldest first.
///
/// When full, appending drops the oldest entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportHistory {
    capacity: usize,
    entries: VecDeque<HistoryEntry>,
}

impl ReportHistory {
    /// Creates a history holding at most `capacity` reports.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity.min(1024)),
        }
    }

    pub fn push(&mut self, report: FilterReport) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(HistoryEntry {
            timestamp: Utc::now(),
            report,
        });
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Mean retention rate across the recorded runs.
    pub fn mean_retention_rate(&self) -> Option<f64> {
        if self.entries.is_empty() {
            return None;
        }
        let total: f64 = self.entries.iter().map(|e| e.report.retention_rate).sum();
        Some(total / self.entries.len() as f64)
    }
}
