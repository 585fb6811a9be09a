//! Variance inflation factors.
//!
//! Optional: compiled with the `vif` cargo feature. Whether the capability
//! exists is resolved once through [`VifCapability::detect`]; when it does
//! not, or the data cannot support the computation, the report is skipped
//! with a warning and the rest of the analysis is unaffected.

use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// VIF above which a column is flagged as a multicollinearity risk.
pub const HIGH_VIF_THRESHOLD: f64 = 10.0;

/// Whether VIF support is compiled into this build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VifCapability {
    Available,
    Unavailable,
}

impl VifCapability {
    pub fn detect() -> Self {
        if cfg!(feature = "vif") {
            Self::Available
        } else {
            Self::Unavailable
        }
    }
}

/// VIF of one column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VifEntry {
    pub column: String,
    /// Infinite when the columns are perfectly collinear.
    pub vif: f64,
    pub high: bool,
}

/// Outcome of the VIF sub-analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VifReport {
    Computed { entries: Vec<VifEntry> },
    Skipped { reason: String },
}

impl VifReport {
    fn skipped(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        warn!("VIF skipped: {}", reason);
        Self::Skipped { reason }
    }

    /// Columns with VIF above [`HIGH_VIF_THRESHOLD`].
    pub fn high_vif_columns(&self) -> Vec<&str> {
        match self {
            Self::Computed { entries } => entries
                .iter()
                .filter(|e| e.high)
                .map(|e| e.column.as_str())
                .collect(),
            Self::Skipped { .. } => Vec::new(),
        }
    }
}

/// Compute VIFs over `columns` if `capability` allows it.
pub fn vif_report(
    df: &DataFrame,
    columns: &[String],
    capability: VifCapability,
) -> Result<VifReport> {
    match capability {
        #[cfg(feature = "vif")]
        VifCapability::Available => inflation::compute(df, columns),
        _ => {
            let _ = (df, columns);
            Ok(VifReport::skipped("VIF support is not compiled into this build"))
        }
    }
}

#[cfg(feature = "vif")]
mod inflation {
    use super::{HIGH_VIF_THRESHOLD, VifEntry, VifReport};
    use crate::correlation::matrix::pearson;
    use crate::error::Result;
    use crate::utils::column_values;
    use polars::prelude::*;

    /// Pivots smaller than this are treated as zero.
    const SINGULAR_EPS: f64 = 1e-12;

    pub(super) fn compute(df: &DataFrame, columns: &[String]) -> Result<VifReport> {
        if columns.len() < 2 {
            return Ok(VifReport::skipped("at least 2 numeric columns are required"));
        }

        let data = columns
            .iter()
            .map(|name| column_values(df, name))
            .collect::<Result<Vec<_>>>()?;

        // Keep only rows complete across every column
        let complete: Vec<usize> = (0..df.height())
            .filter(|&row| data.iter().all(|col| col[row].is_some()))
            .collect();
        if complete.is_empty() {
            return Ok(VifReport::skipped("no rows are complete across numeric columns"));
        }

        let mut kept_names = Vec::new();
        let mut kept = Vec::new();
        for (name, col) in columns.iter().zip(&data) {
            let values: Vec<Option<f64>> = complete.iter().map(|&row| col[row]).collect();
            let first = values[0];
            if values.iter().any(|v| *v != first) {
                kept_names.push(name.clone());
                kept.push(values);
            }
        }
        if kept.len() < 2 {
            return Ok(VifReport::skipped("at least 2 non-constant numeric columns are required"));
        }

        // Standardization leaves Pearson r unchanged, so VIF is the diagonal
        // of the inverse correlation matrix.
        let k = kept.len();
        let mut corr = vec![vec![0.0; k]; k];
        for i in 0..k {
            corr[i][i] = 1.0;
            for j in (i + 1)..k {
                let r = pearson(&kept[i], &kept[j]);
                corr[i][j] = r;
                corr[j][i] = r;
            }
        }

        let diagonal = match invert(corr) {
            Some(inverse) => (0..k).map(|i| inverse[i][i]).collect(),
            None => vec![f64::INFINITY; k],
        };

        let entries = kept_names
            .into_iter()
            .zip(diagonal)
            .map(|(column, vif)| VifEntry {
                column,
                vif,
                high: vif > HIGH_VIF_THRESHOLD,
            })
            .collect();
        Ok(VifReport::Computed { entries })
    }

    /// Gauss-Jordan inversion with partial pivoting. `None` if singular.
    pub(super) fn invert(mut a: Vec<Vec<f64>>) -> Option<Vec<Vec<f64>>> {
        let n = a.len();
        let mut inv: Vec<Vec<f64>> = (0..n)
            .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
            .collect();

        for col in 0..n {
            let pivot = (col..n).max_by(|&x, &y| a[x][col].abs().total_cmp(&a[y][col].abs()))?;
            if a[pivot][col].is_nan() || a[pivot][col].abs() <= SINGULAR_EPS {
                return None;
            }
            a.swap(col, pivot);
            inv.swap(col, pivot);

            let p = a[col][col];
            for j in 0..n {
                a[col][j] /= p;
                inv[col][j] /= p;
            }
            for row in 0..n {
                if row == col {
                    continue;
                }
                let factor = a[row][col];
                if factor == 0.0 {
                    continue;
                }
                for j in 0..n {
                    a[row][j] -= factor * a[col][j];
                    inv[row][j] -= factor * inv[col][j];
                }
            }
        }
        Some(inv)
    }
}
