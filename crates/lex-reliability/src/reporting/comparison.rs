//! Before/after statistics for a cleaned dataset.

use crate::cleaning::ColumnRemovalSummary;
use crate::error::Result;
use crate::utils::{
    column_values, mean, median, numeric_column_names, percent_change, percentage, std_dev,
    valid_values,
};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of the rows lost to cleaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataLossLevel {
    /// Below 5%.
    Acceptable,
    /// Below 10%.
    Caution,
    High,
}

impl DataLossLevel {
    pub fn from_pct(data_loss_pct: f64) -> Self {
        if data_loss_pct < 5.0 {
            Self::Acceptable
        } else if data_loss_pct < 10.0 {
            Self::Caution
        } else {
            Self::High
        }
    }
}

impl fmt::Display for DataLossLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Acceptable => "acceptable data loss",
            Self::Caution => "moderate data loss, review carefully",
            Self::High => "high data loss, reconsider the strategy",
        };
        f.write_str(text)
    }
}

/// Change of one column's statistics. Standard deviations are NaN below two values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnComparison {
    pub column: String,
    pub mean_before: f64,
    pub mean_after: f64,
    pub std_before: f64,
    pub std_after: f64,
    pub median_before: f64,
    pub median_after: f64,
    pub mean_change_pct: f64,
    pub std_change_pct: f64,
    pub median_change_pct: f64,
    pub outliers_removed: usize,
}

/// Dataset-level comparison of original and cleaned data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningComparison {
    pub columns: Vec<ColumnComparison>,
    pub original_rows: usize,
    pub cleaned_rows: usize,
    pub total_outliers_removed: usize,
    pub data_loss_pct: f64,
    pub loss_level: DataLossLevel,
}

/// Descriptive statistics of one column's valid values.
struct ColumnStats {
    mean: f64,
    std: f64,
    median: f64,
}

impl ColumnStats {
    fn of(values: &[f64]) -> Option<Self> {
        Some(Self {
            mean: mean(values)?,
            std: std_dev(values, 1).unwrap_or(f64::NAN),
            median: median(values)?,
        })
    }
}

/// Compares an original dataset with its cleaned version.
pub struct BeforeAfterComparator;

impl BeforeAfterComparator {
    /// Compare every numeric column present in both frames.
    ///
    /// Columns without valid values on either side are left out. Changes
    /// against a zero baseline are reported as 0%.
    pub fn compare(
        original: &DataFrame,
        cleaned: &DataFrame,
        removals: &[ColumnRemovalSummary],
    ) -> Result<CleaningComparison> {
        let cleaned_numeric = numeric_column_names(cleaned);
        let mut columns = Vec::new();

        for name in numeric_column_names(original) {
            if !cleaned_numeric.contains(&name) {
                continue;
            }
            let before = ColumnStats::of(&valid_values(&column_values(original, &name)?));
            let after = ColumnStats::of(&valid_values(&column_values(cleaned, &name)?));
            let (Some(before), Some(after)) = (before, after) else {
                continue;
            };

            let outliers_removed = removals
                .iter()
                .find(|r| r.column == name)
                .map_or(0, |r| r.rows_removed);

            columns.push(ColumnComparison {
                column: name,
                mean_change_pct: percent_change(before.mean, after.mean),
                std_change_pct: percent_change(before.std, after.std),
                median_change_pct: percent_change(before.median, after.median),
                mean_before: before.mean,
                mean_after: after.mean,
                std_before: before.std,
                std_after: after.std,
                median_before: before.median,
                median_after: after.median,
                outliers_removed,
            });
        }

        let original_rows = original.height();
        let cleaned_rows = cleaned.height();
        let data_loss_pct = percentage(original_rows.saturating_sub(cleaned_rows), original_rows);

        Ok(CleaningComparison {
            columns,
            original_rows,
            cleaned_rows,
            total_outliers_removed: removals.iter().map(|r| r.rows_removed).sum(),
            data_loss_pct,
            loss_level: DataLossLevel::from_pct(data_loss_pct),
        })
    }
}
