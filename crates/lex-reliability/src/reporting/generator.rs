use super::comparison::{CleaningComparison, DataLossLevel};
use crate::cleaning::{CleaningConfig, CleaningOutcome};
use crate::consistency::ConsistencyIssue;
use crate::correlation::DomainFinding;
use crate::error::Result;
use crate::pipeline::{CategoryShift, PipelineResult};
use crate::quality::{
    ACCEPTABLE_OUTLIER_PERCENTAGE, DatasetSummary, RecommendationTier, ReliabilityReport,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

// ============================================================================
// Comprehensive Report Types
// ============================================================================

/// How much cleaning improved the reliability score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImprovementVerdict {
    /// More than 5 points gained.
    Significant,
    Positive,
    /// No gain; the cleaned data should be reviewed before use.
    ReviewCarefully,
}

impl ImprovementVerdict {
    pub fn from_improvement(points: f64) -> Self {
        if points > 5.0 {
            Self::Significant
        } else if points > 0.0 {
            Self::Positive
        } else {
            Self::ReviewCarefully
        }
    }
}

impl fmt::Display for ImprovementVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Significant => "outlier cleaning improved reliability significantly",
            Self::Positive => "outlier cleaning had a positive effect",
            Self::ReviewCarefully => "outlier cleaning should be evaluated carefully",
        };
        f.write_str(text)
    }
}

/// Component scores of one dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub final_score: f64,
    pub tier: RecommendationTier,
    pub normality_score: f64,
    pub outlier_score: f64,
    pub correlation_score: f64,
    pub consistency_score: f64,
}

impl From<&ReliabilityReport> for ScoreSummary {
    fn from(report: &ReliabilityReport) -> Self {
        Self {
            final_score: report.final_score,
            tier: report.tier,
            normality_score: report.normality_score,
            outlier_score: report.outlier_score,
            correlation_score: report.correlation_score,
            consistency_score: report.consistency_score,
        }
    }
}

/// One row of the grid search table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigurationSummary {
    pub config: CleaningConfig,
    pub label: String,
    pub rows_removed: usize,
    pub data_loss_pct: f64,
    pub loss_score: u8,
    pub final_score: f64,
    pub selected: bool,
}

/// Serializable summary of a pipeline run, used for `--json` output and
/// report files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComprehensiveReport {
    // Metadata
    /// Timestamp when the report was generated
    pub generated_at: String,
    /// Path to the input file
    pub input_file: String,
    pub duration_ms: u64,

    pub dataset: DatasetSummary,

    // Scores
    pub full_scores: ScoreSummary,
    /// `None` when no cleaning configuration was evaluated
    pub clean_scores: Option<ScoreSummary>,
    pub score_improvement: Option<f64>,
    pub verdict: Option<ImprovementVerdict>,

    // Cleaning
    pub best_config: Option<String>,
    pub data_loss_pct: Option<f64>,
    pub loss_level: Option<DataLossLevel>,
    pub configurations: Vec<ConfigurationSummary>,
    pub comparison: Option<CleaningComparison>,
    pub correlation_shifts: Vec<CategoryShift>,

    // Findings on the full dataset
    pub non_normal_columns: Vec<String>,
    pub high_outlier_columns: Vec<String>,
    pub high_vif_columns: Vec<String>,
    pub domain_anomalies: Vec<DomainFinding>,
    pub consistency_issues: Vec<ConsistencyIssue>,
}

/// Builds and writes [`ComprehensiveReport`]s.
pub struct ReportGenerator;

impl ReportGenerator {
    pub fn build_comprehensive_report(
        input_file: &str,
        result: &PipelineResult,
    ) -> ComprehensiveReport {
        let full = &result.full_analysis;
        let best = result.best_outcome();

        let configurations = result
            .search
            .outcomes
            .iter()
            .enumerate()
            .map(|(index, outcome)| {
                Self::configuration_summary(outcome, result.search.best_index == Some(index))
            })
            .collect();

        let non_normal_columns = full
            .normality
            .iter()
            .filter(|r| !r.is_normal)
            .map(|r| r.column.clone())
            .collect();

        let high_outlier_columns = full
            .outliers
            .iter()
            .filter(|r| r.average_percentage >= ACCEPTABLE_OUTLIER_PERCENTAGE)
            .map(|r| r.column.clone())
            .collect();

        let domain_anomalies = full
            .correlation
            .as_ref()
            .map(|c| c.domain_anomalies().cloned().collect())
            .unwrap_or_default();

        ComprehensiveReport {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            input_file: input_file.to_string(),
            duration_ms: result.duration_ms,
            dataset: full.summary,
            full_scores: ScoreSummary::from(&result.full_report),
            clean_scores: result.clean_report().map(ScoreSummary::from),
            score_improvement: result.score_improvement,
            verdict: result.score_improvement.map(ImprovementVerdict::from_improvement),
            best_config: best.map(|o| o.config.to_string()),
            data_loss_pct: best.map(|o| o.data_loss_pct),
            loss_level: best.map(|o| DataLossLevel::from_pct(o.data_loss_pct)),
            configurations,
            comparison: result.comparison.clone(),
            correlation_shifts: result.correlation_shifts.clone(),
            non_normal_columns,
            high_outlier_columns,
            high_vif_columns: result.full_report.high_vif_columns.clone(),
            domain_anomalies,
            consistency_issues: full.consistency.clone().unwrap_or_default(),
        }
    }

    fn configuration_summary(outcome: &CleaningOutcome, selected: bool) -> ConfigurationSummary {
        ConfigurationSummary {
            config: outcome.config,
            label: outcome.config.to_string(),
            rows_removed: outcome.rows_removed,
            data_loss_pct: outcome.data_loss_pct,
            loss_score: outcome.loss_score,
            final_score: outcome.report.final_score,
            selected,
        }
    }

    /// Write a comprehensive report as pretty-printed JSON, creating parent
    /// directories as needed.
    pub fn write_report_to_file(report: &ComprehensiveReport, path: &Path) -> Result<PathBuf> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut file = File::create(path)?;
        file.write_all(serde_json::to_string_pretty(report)?.as_bytes())?;

        info!("Report saved: {}", path.display());

        Ok(path.to_path_buf())
    }
}
