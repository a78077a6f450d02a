//! Reports produced by filtering and diversity runs.
//!
//! A [`FilterReport`] is created for every filtering invocation, including
//! empty and degraded ones. Reports are plain data and serialize to JSON.

mod history;
pub mod stats;

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::candidate::ImageId;
use crate::pipeline::StrategyKind;
use crate::quality::Metric;

pub use history::{HistoryEntry, ReportHistory};
pub use stats::{metric_statistics, percentile, MetricStatistics, Quartiles};

/// Outcome summary of one filtering run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterReport {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Strategy the caller selected.
    pub strategy: StrategyKind,
    /// Strategy actually applied when `strategy` is adaptive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_strategy: Option<StrategyKind>,
    pub input_count: usize,
    pub retained_count: usize,
    pub rejected_count: usize,
    pub retention_rate: f64,
    /// Human-readable reasons for every rejected image.
    pub rejection_reasons: BTreeMap<ImageId, Vec<String>>,
    pub metric_statistics: BTreeMap<Metric, MetricStatistics>,
    /// Batch quartiles, present when a percentile computation ran.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub percentiles: BTreeMap<Metric, Quartiles>,
    pub duration_secs: f64,
}

impl FilterReport {
    /// Creates a report with zero counts for the given strategy.
    pub fn empty(strategy: StrategyKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            strategy,
            resolved_strategy: None,
            input_count: 0,
            retained_count: 0,
            rejected_count: 0,
            retention_rate: 0.0,
            rejection_reasons: BTreeMap::new(),
            metric_statistics: BTreeMap::new(),
            percentiles: BTreeMap::new(),
            duration_secs: 0.0,
        }
    }

    /// Sets the counts and derived retention rate.
    pub fn with_counts(mut self, input: usize, retained: usize) -> Self {
        self.input_count = input;
        self.retained_count = retained;
        self.rejected_count = input.saturating_sub(retained);
        self.retention_rate = if input == 0 {
            0.0
        } else {
            retained as f64 / input as f64
        };
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_secs = duration.as_secs_f64();
        self
    }

    /// Strategy whose decision produced the retained set.
    pub fn effective_strategy(&self) -> StrategyKind {
        self.resolved_strategy.unwrap_or(self.strategy)
    }

    /// One-line summary suitable for logs.
    pub fn summary(&self) -> String {
        let strategy = match self.resolved_strategy {
            Some(resolved) => format!("{} -> {}", self.strategy, resolved),
            None => self.strategy.to_string(),
        };
        format!(
            "{}: retained {}/{} ({:.1}%), rejected {} in {:.3}s",
            strategy,
            self.retained_count,
            self.input_count,
            self.retention_rate * 100.0,
            self.rejected_count,
            self.duration_secs
        )
    }
}

/// Outcome summary of one diversity optimization run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiversityReport {
    pub input_count: usize,
    pub output_count: usize,
    /// Number of dense clusters found.
    pub cluster_count: usize,
    /// Number of points labelled as noise.
    pub noise_count: usize,
    /// Noise points restored by the backfill rule.
    pub backfilled_count: usize,
    /// True when the input was small enough to skip clustering.
    pub skipped: bool,
    /// Ids dropped as redundant.
    pub removed: Vec<ImageId>,
    pub duration_secs: f64,
}

impl DiversityReport {
    pub fn removed_count(&self) -> usize {
        self.input_count.saturating_sub(self.output_count)
    }

    pub fn summary(&self) -> String {
        if self.skipped {
            return format!("diversity skipped for {} images", self.input_count);
        }
        format!(
            "diversity kept {}/{} across {} clusters ({} noise, {} backfilled)",
            self.output_count,
            self.input_count,
            self.cluster_count,
            self.noise_count,
            self.backfilled_count
        )
    }
}
