// Tue Jan 27 2026 - Alex

use crate::config::StagingMode;
use crate::orchestration::outcome::{EmptyReason, PipelineFailure, PipelineOutcome, PipelineResult};
use crate::source::PartitionKey;
use serde::Serialize;
use std::time::Duration;

/// A source that could not be staged, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StagingFailure {
    pub source: String,
    pub error: String,
}

/// Everything one run produced. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct RunReport {
    results: Vec<PipelineResult>,
    duration: Duration,
    staging_mode: StagingMode,
    staging_failures: Vec<StagingFailure>,
}

impl RunReport {
    /// `results` must already be sorted by (source, key).
    pub fn new(
        results: Vec<PipelineResult>,
        duration: Duration,
        staging_mode: StagingMode,
        staging_failures: Vec<StagingFailure>,
    ) -> Self {
        Self {
            results,
            duration,
            staging_mode,
            staging_failures,
        }
    }

    pub fn results(&self) -> &[PipelineResult] {
        &self.results
    }

    pub fn get(&self, source: &str, key: &PartitionKey) -> Option<&PipelineResult> {
        self.results.iter().find(|r| r.source == source && &r.key == key)
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn staging_mode(&self) -> StagingMode {
        self.staging_mode
    }

    pub fn staging_failures(&self) -> &[StagingFailure] {
        &self.staging_failures
    }

    /// Distinct (source, key) pairs located, whatever became of them.
    pub fn attempted(&self) -> usize {
        self.results.len()
    }

    pub fn with_results(&self) -> usize {
        self.results.iter().filter(|r| r.has_results()).count()
    }

    pub fn empty(&self) -> usize {
        self.results.iter().filter(|r| r.is_empty()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| r.is_failed()).count()
    }

    pub fn trainer_failures(&self) -> usize {
        self.results.iter().map(|r| r.trainer_failures.len()).sum()
    }

    pub fn rows_dropped(&self) -> usize {
        self.results.iter().map(|r| r.dropped_rows).sum()
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            staging_mode: self.staging_mode,
            duration_ms: u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX),
            attempted: self.attempted(),
            with_results: self.with_results(),
            empty: self.empty(),
            failed: self.failed(),
            trainer_failures: self.trainer_failures(),
            rows_dropped: self.rows_dropped(),
            staging_failures: self.staging_failures.clone(),
            partitions: self.results.iter().map(PartitionSummary::from_result).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankEntry {
    pub routine: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionStatus {
    Ranked,
    Empty,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartitionSummary {
    pub source: String,
    pub key: PartitionKey,
    pub status: PartitionStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ranking: Vec<RankEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_reason: Option<EmptyReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<PipelineFailure>,
    pub dropped_rows: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trainer_failures: Vec<String>,
}

impl PartitionSummary {
    pub fn from_result(result: &PipelineResult) -> Self {
        let mut summary = Self {
            source: result.source.clone(),
            key: result.key.clone(),
            status: PartitionStatus::Ranked,
            ranking: Vec::new(),
            empty_reason: None,
            failure: None,
            dropped_rows: result.dropped_rows,
            trainer_failures: result.trainer_failures.iter().map(|f| f.to_string()).collect(),
        };

        match &result.outcome {
            PipelineOutcome::Ranked(ranked) => {
                summary.ranking = ranked.iter()
                    .map(|r| RankEntry {
                        routine: r.routine.clone(),
                        score: r.error_score,
                    })
                    .collect();
            }
            PipelineOutcome::Empty(reason) => {
                summary.status = PartitionStatus::Empty;
                summary.empty_reason = Some(reason.clone());
            }
            PipelineOutcome::Failed(failure) => {
                summary.status = PartitionStatus::Failed;
                summary.failure = Some(failure.clone());
            }
        }

        summary
    }

    pub fn best(&self) -> Option<&RankEntry> {
        self.ranking.first()
    }
}

/// Serializable digest of a [`RunReport`]; artifacts are left out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub staging_mode: StagingMode,
    pub duration_ms: u64,
    pub attempted: usize,
    pub with_results: usize,
    pub empty: usize,
    pub failed: usize,
    pub trainer_failures: usize,
    pub rows_dropped: usize,
    pub staging_failures: Vec<StagingFailure>,
    pub partitions: Vec<PartitionSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::{FailureCause, RankedResults, TrainerResult, TrainingFailure};
    use std::sync::Arc;

    fn ranked(scores: &[(&str, f64)]) -> RankedResults {
        RankedResults::new(
            scores.iter()
                .enumerate()
                .map(|(index, (routine, score))| TrainerResult {
                    routine: routine.to_string(),
                    index,
                    artifact: Arc::new(()),
                    error_score: *score,
                })
                .collect(),
        )
        .unwrap()
    }

    fn report() -> RunReport {
        let mut b = PipelineResult::new("s", PartitionKey::from("B"), PipelineOutcome::Ranked(ranked(&[("one", 2.0)])));
        b.trainer_failures.push(TrainingFailure::new("two", 1, FailureCause::Panicked("x".to_string())));
        b.dropped_rows = 3;

        RunReport::new(
            vec![
                PipelineResult::empty("s", PartitionKey::from("A"), EmptyReason::InsufficientData { rows: 2, required: 4 }),
                b,
                PipelineResult::new("s", PartitionKey::from("C"), PipelineOutcome::Ranked(ranked(&[("one", 5.0), ("two", 3.0)]))),
                PipelineResult::failed("t", PartitionKey::Int(1), PipelineFailure::SourceUnreadable("gone".to_string())),
            ],
            Duration::from_millis(1500),
            StagingMode::Direct,
            Vec::new(),
        )
    }

    #[test]
    fn test_counts() {
        let report = report();
        assert_eq!(report.attempted(), 4);
        assert_eq!(report.with_results(), 2);
        assert_eq!(report.empty(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.trainer_failures(), 1);
        assert_eq!(report.rows_dropped(), 3);
    }

    #[test]
    fn test_summary_partitions() {
        let summary = report().summary();
        assert_eq!(summary.duration_ms, 1500);
        assert_eq!(summary.partitions.len(), 4);

        let c = &summary.partitions[2];
        assert_eq!(c.status, PartitionStatus::Ranked);
        assert_eq!(c.best().unwrap().routine, "two");
        assert_eq!(c.ranking.len(), 2);

        let a = &summary.partitions[0];
        assert_eq!(a.status, PartitionStatus::Empty);
        assert!(a.best().is_none());
    }

    #[test]
    fn test_huge_duration_saturates() {
        let report = RunReport::new(Vec::new(), Duration::MAX, StagingMode::Direct, Vec::new());
        assert_eq!(report.summary().duration_ms, u64::MAX);
    }

    #[test]
    fn test_summary_serializes() {
        let value = serde_json::to_value(report().summary()).unwrap();
        assert_eq!(value["attempted"], 4);
        assert_eq!(value["partitions"][0]["empty_reason"]["reason"], "insufficient_data");
        assert_eq!(value["partitions"][3]["failure"]["failure"], "source_unreadable");
        assert_eq!(value["partitions"][1]["key"], "B");
    }
}
