//! Outlier detection.
//!
//! Each numeric column is measured under the three methods of
//! [`OutlierMethod`] at their conventional thresholds. The same mask
//! functions drive row removal in [`crate::cleaning`].

mod methods;

pub use methods::{OutlierMethod, outlier_mask};

use crate::error::Result;
use crate::utils::{column_values, numeric_column_names, percentage};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Count and share of flagged values for one method.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MethodOutlierStats {
    pub count: usize,
    /// Share of the column's valid values, 0-100.
    pub percentage: f64,
}

/// Outlier profile of one numeric column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlierResult {
    pub column: String,
    pub valid_count: usize,
    pub iqr: MethodOutlierStats,
    pub zscore: MethodOutlierStats,
    /// Absent when the column's MAD is zero.
    pub modified_zscore: Option<MethodOutlierStats>,
    /// Mean percentage over the methods that produced an entry.
    pub average_percentage: f64,
}

impl OutlierResult {
    /// Stats for `method`, if it was applicable.
    pub fn stats(&self, method: OutlierMethod) -> Option<MethodOutlierStats> {
        match method {
            OutlierMethod::Iqr => Some(self.iqr),
            OutlierMethod::ZScore => Some(self.zscore),
            OutlierMethod::ModifiedZScore => self.modified_zscore,
        }
    }
}

/// Per-column outlier measurement.
pub struct OutlierDetector;

impl OutlierDetector {
    /// Measure a row-aligned column. `None` below 3 valid values.
    pub fn detect_values(column: &str, values: &[Option<f64>]) -> Option<OutlierResult> {
        let valid_count = values.iter().flatten().count();

        let stats_for = |method: OutlierMethod| {
            outlier_mask(values, method, method.default_threshold()).map(|mask| {
                let count = mask.iter().filter(|&&f| f).count();
                MethodOutlierStats {
                    count,
                    percentage: percentage(count, valid_count),
                }
            })
        };

        let iqr = stats_for(OutlierMethod::Iqr)?;
        let zscore = stats_for(OutlierMethod::ZScore)?;
        let modified_zscore = stats_for(OutlierMethod::ModifiedZScore);

        let applied: Vec<f64> = [Some(iqr), Some(zscore), modified_zscore]
            .into_iter()
            .flatten()
            .map(|s| s.percentage)
            .collect();
        let average_percentage = applied.iter().sum::<f64>() / applied.len() as f64;

        Some(OutlierResult {
            column: column.to_string(),
            valid_count,
            iqr,
            zscore,
            modified_zscore,
            average_percentage,
        })
    }

    /// Measure a single column of `df`.
    pub fn detect_column(df: &DataFrame, column: &str) -> Result<Option<OutlierResult>> {
        let values = column_values(df, column)?;
        Ok(Self::detect_values(column, &values))
    }

    /// Measure every numeric column, skipping those with too few values.
    pub fn analyze(df: &DataFrame) -> Result<Vec<OutlierResult>> {
        let mut results = Vec::new();
        for name in numeric_column_names(df) {
            if let Some(result) = Self::detect_column(df, &name)? {
                debug!(
                    "Outliers '{}': iqr={} zscore={} modified={:?} avg={:.2}%",
                    name,
                    result.iqr.count,
                    result.zscore.count,
                    result.modified_zscore.map(|s| s.count),
                    result.average_percentage
                );
                results.push(result);
            }
        }
        Ok(results)
    }
}
