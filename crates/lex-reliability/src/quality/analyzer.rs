use crate::config::ReliabilityConfig;
use crate::consistency::{ConsistencyChecker, ConsistencyIssue};
use crate::correlation::{CorrelationAnalysis, CorrelationAnalyzer};
use crate::error::{Result, ResultExt};
use crate::normality::{NormalityResult, NormalityTester};
use crate::outliers::{OutlierDetector, OutlierResult};
use crate::utils::{numeric_column_names, percentage};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Shape of the analyzed dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub observations: usize,
    pub columns: usize,
    pub numeric_columns: usize,
    /// Missing cells over all cells, 0-100.
    pub missing_percentage: f64,
}

impl DatasetSummary {
    pub fn of(df: &DataFrame) -> Self {
        let cells = df.height() * df.width();
        let missing: usize = df.get_columns().iter().map(missing_cells).sum();
        Self {
            observations: df.height(),
            columns: df.width(),
            numeric_columns: numeric_column_names(df).len(),
            missing_percentage: percentage(missing, cells),
        }
    }
}

/// Nulls, plus NaN in float columns.
fn missing_cells(col: &Column) -> usize {
    if !matches!(col.dtype(), DataType::Float32 | DataType::Float64) {
        return col.null_count();
    }
    col.as_materialized_series()
        .cast(&DataType::Float64)
        .ok()
        .and_then(|s| {
            s.f64()
                .ok()
                .map(|ca| ca.into_iter().filter(|v| v.is_none_or(f64::is_nan)).count())
        })
        .unwrap_or_else(|| col.null_count())
}

/// Output of the four analyzers on one dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReliabilityAnalysis {
    pub summary: DatasetSummary,
    pub normality: Vec<NormalityResult>,
    pub outliers: Vec<OutlierResult>,
    /// `None` when the dataset has no numeric columns.
    pub correlation: Option<CorrelationAnalysis>,
    /// `None` when the dataset has no numeric columns.
    pub consistency: Option<Vec<ConsistencyIssue>>,
}

/// Runs normality, outlier, correlation and consistency analysis.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReliabilityAnalyzer {
    correlation: CorrelationAnalyzer,
}

impl ReliabilityAnalyzer {
    pub fn new(config: &ReliabilityConfig) -> Self {
        Self {
            correlation: CorrelationAnalyzer::new(config.compute_vif),
        }
    }

    pub fn analyze(&self, df: &DataFrame) -> Result<ReliabilityAnalysis> {
        let summary = DatasetSummary::of(df);
        debug!(
            "Analyzing {} rows, {} numeric columns",
            summary.observations, summary.numeric_columns
        );

        let normality = NormalityTester::analyze(df).context("Normality testing")?;
        let outliers = OutlierDetector::analyze(df).context("Outlier detection")?;

        let (correlation, consistency) = if summary.numeric_columns == 0 {
            (None, None)
        } else {
            (
                Some(
                    self.correlation
                        .analyze(df)
                        .context("Correlation analysis")?,
                ),
                Some(ConsistencyChecker::check(df).context("Consistency checks")?),
            )
        };

        Ok(ReliabilityAnalysis {
            summary,
            normality,
            outliers,
            correlation,
            consistency,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts_missing_cells() {
        let df = df![
            "fare_amount" => [Some(1.0), None, Some(3.0), Some(4.0)],
            "vehicle_type" => [Some("a"), Some("b"), None, None],
        ]
        .unwrap();
        let summary = DatasetSummary::of(&df);
        assert_eq!(summary.observations, 4);
        assert_eq!(summary.columns, 2);
        assert_eq!(summary.numeric_columns, 1);
        assert!((summary.missing_percentage - 37.5).abs() < 1e-9);
    }

    #[test]
    fn test_summary_counts_nan_as_missing() {
        let df = df![
            "fare_amount" => [Some(1.0), Some(f64::NAN), None, Some(4.0)],
            "rating" => [Some(4.5f32), Some(f32::NAN), Some(5.0), Some(3.0)],
            "vehicle_type" => ["a", "b", "c", "d"],
        ]
        .unwrap();
        let summary = DatasetSummary::of(&df);
        // 2 in fare_amount, 1 in rating, out of 12 cells
        assert!((summary.missing_percentage - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_numeric_columns_leaves_parts_empty() {
        let df = df!["vehicle_type" => ["sedan", "suv", "van"]].unwrap();
        let analysis = ReliabilityAnalyzer::default().analyze(&df).unwrap();
        assert!(analysis.normality.is_empty());
        assert!(analysis.outliers.is_empty());
        assert!(analysis.correlation.is_none());
        assert!(analysis.consistency.is_none());
    }

    #[test]
    fn test_empty_frame_is_not_an_error() {
        let analysis = ReliabilityAnalyzer::default()
            .analyze(&DataFrame::empty())
            .unwrap();
        assert_eq!(analysis.summary.observations, 0);
        assert_eq!(analysis.summary.missing_percentage, 0.0);
    }
}
