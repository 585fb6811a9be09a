//! Normality testing.
//!
//! Every numeric column with at least three valid values is put through four
//! tests and gets a majority verdict:
//!
//! - Shapiro-Wilk (only up to [`SHAPIRO_MAX_SAMPLE`] values)
//! - Kolmogorov-Smirnov against a normal fitted to the column
//! - Jarque-Bera on skewness and kurtosis
//! - Anderson-Darling against its 5% critical value
//!
//! A column is normal when at least half of the applied tests vote normal.

mod edf;
mod moments;
mod shapiro_wilk;

pub use edf::{AndersonDarling, KolmogorovSmirnov, anderson_darling, kolmogorov_smirnov};
pub use moments::{JarqueBera, jarque_bera};
pub use shapiro_wilk::{SHAPIRO_MAX_SAMPLE, ShapiroWilk, shapiro_wilk};

use crate::error::Result;
use crate::utils::{column_values, numeric_column_names, valid_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Significance level shared by the p-value based tests.
pub const SIGNIFICANCE: f64 = 0.05;

/// Minimum valid values for a column to be tested.
pub const MIN_VALID_VALUES: usize = 3;

/// Normality verdict for one numeric column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalityResult {
    pub column: String,
    pub sample_size: usize,
    /// `None` when the column is too large for Shapiro-Wilk.
    pub shapiro_statistic: Option<f64>,
    pub shapiro_p: Option<f64>,
    pub ks_statistic: f64,
    pub ks_p: f64,
    pub jb_statistic: f64,
    pub jb_p: f64,
    pub anderson_statistic: f64,
    pub anderson_critical_value: f64,
    pub normal_votes: usize,
    pub tests_applied: usize,
    pub normal_ratio: f64,
    pub is_normal: bool,
}

/// Majority vote over the applied tests.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Verdict {
    normal_votes: usize,
    tests_applied: usize,
    normal_ratio: f64,
    is_normal: bool,
}

impl Verdict {
    /// A tie counts as normal.
    fn from_votes(votes: &[bool]) -> Self {
        let normal_votes = votes.iter().filter(|&&v| v).count();
        let tests_applied = votes.len();
        let normal_ratio = normal_votes as f64 / tests_applied as f64;
        Self {
            normal_votes,
            tests_applied,
            normal_ratio,
            is_normal: normal_ratio >= 0.5,
        }
    }
}

/// Per-column normality testing.
pub struct NormalityTester;

impl NormalityTester {
    /// Test one column's valid values. `None` below [`MIN_VALID_VALUES`].
    pub fn test_values(column: &str, values: &[f64]) -> Option<NormalityResult> {
        if values.len() < MIN_VALID_VALUES {
            return None;
        }

        let shapiro = shapiro_wilk(values);
        let ks = kolmogorov_smirnov(values);
        let jb = jarque_bera(values);
        let ad = anderson_darling(values);

        // NaN p-values compare false and count as non-normal votes
        let mut votes = vec![ks.p_value > SIGNIFICANCE, jb.p_value > SIGNIFICANCE, ad.passes()];
        if let Some(sw) = shapiro {
            votes.push(sw.p_value > SIGNIFICANCE);
        }

        let verdict = Verdict::from_votes(&votes);

        Some(NormalityResult {
            column: column.to_string(),
            sample_size: values.len(),
            shapiro_statistic: shapiro.map(|s| s.statistic),
            shapiro_p: shapiro.map(|s| s.p_value),
            ks_statistic: ks.statistic,
            ks_p: ks.p_value,
            jb_statistic: jb.statistic,
            jb_p: jb.p_value,
            anderson_statistic: ad.statistic,
            anderson_critical_value: ad.critical_value,
            normal_votes: verdict.normal_votes,
            tests_applied: verdict.tests_applied,
            normal_ratio: verdict.normal_ratio,
            is_normal: verdict.is_normal,
        })
    }

    /// Test a single column of `df`.
    pub fn test_column(df: &DataFrame, column: &str) -> Result<Option<NormalityResult>> {
        let values = valid_values(&column_values(df, column)?);
        Ok(Self::test_values(column, &values))
    }

    /// Test every numeric column, skipping those with too few values.
    pub fn analyze(df: &DataFrame) -> Result<Vec<NormalityResult>> {
        let mut results = Vec::new();
        for name in numeric_column_names(df) {
            match Self::test_column(df, &name)? {
                Some(result) => {
                    debug!(
                        "Normality '{}': {}/{} tests normal",
                        name, result.normal_votes, result.tests_applied
                    );
                    results.push(result);
                }
                None => debug!("Normality '{}': skipped, fewer than 3 values", name),
            }
        }
        Ok(results)
    }
}
