//! Outlier methods and their mask functions.

use crate::utils::{mean, median, quantile_sorted, sorted, std_dev, valid_values};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Consistency constant relating MAD to the normal standard deviation.
const MODIFIED_Z_SCALE: f64 = 0.6745;

/// Outlier detection method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierMethod {
    /// Tukey fences around the interquartile range.
    Iqr,
    /// Absolute standard score (population standard deviation).
    #[serde(rename = "zscore")]
    ZScore,
    /// MAD-based robust standard score.
    #[serde(rename = "modified_zscore")]
    ModifiedZScore,
}

/// Pure mask function: row-aligned values in, row-aligned flags out.
type MaskFn = fn(&[Option<f64>], f64) -> Option<Vec<bool>>;

impl OutlierMethod {
    pub const ALL: [OutlierMethod; 3] = [
        OutlierMethod::Iqr,
        OutlierMethod::ZScore,
        OutlierMethod::ModifiedZScore,
    ];

    /// Threshold used by the detector when none is given.
    pub fn default_threshold(self) -> f64 {
        match self {
            Self::Iqr => 1.5,
            Self::ZScore => 3.0,
            Self::ModifiedZScore => 3.5,
        }
    }

    /// Stable identifier, as used in configuration files.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Iqr => "iqr",
            Self::ZScore => "zscore",
            Self::ModifiedZScore => "modified_zscore",
        }
    }

    /// Dispatch table from method to its mask function.
    fn mask_fn(self) -> MaskFn {
        match self {
            Self::Iqr => iqr_mask,
            Self::ZScore => zscore_mask,
            Self::ModifiedZScore => modified_zscore_mask,
        }
    }
}

impl fmt::Display for OutlierMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flag outliers in a row-aligned column. Missing values are never flagged.
///
/// `None` when the column has fewer than 3 valid values or the method is
/// degenerate for it (MAD = 0 for the modified Z-score).
pub fn outlier_mask(
    values: &[Option<f64>],
    method: OutlierMethod,
    threshold: f64,
) -> Option<Vec<bool>> {
    if values.iter().flatten().count() < 3 {
        return None;
    }
    (method.mask_fn())(values, threshold)
}

fn flag_where(values: &[Option<f64>], is_outlier: impl Fn(f64) -> bool) -> Vec<bool> {
    values
        .iter()
        .map(|v| v.is_some_and(&is_outlier))
        .collect()
}

fn iqr_mask(values: &[Option<f64>], threshold: f64) -> Option<Vec<bool>> {
    let data = sorted(&valid_values(values));
    let q1 = quantile_sorted(&data, 0.25);
    let q3 = quantile_sorted(&data, 0.75);
    let iqr = q3 - q1;
    let (lower, upper) = (q1 - threshold * iqr, q3 + threshold * iqr);
    Some(flag_where(values, |v| v < lower || v > upper))
}

fn zscore_mask(values: &[Option<f64>], threshold: f64) -> Option<Vec<bool>> {
    let data = valid_values(values);
    let mu = mean(&data)?;
    let sd = std_dev(&data, 0)?;
    if sd == 0.0 {
        // Every score is undefined; nothing stands out
        return Some(vec![false; values.len()]);
    }
    Some(flag_where(values, |v| ((v - mu) / sd).abs() > threshold))
}

fn modified_zscore_mask(values: &[Option<f64>], threshold: f64) -> Option<Vec<bool>> {
    let data = valid_values(values);
    let med = median(&data)?;
    let deviations: Vec<f64> = data.iter().map(|v| (v - med).abs()).collect();
    let mad = median(&deviations)?;
    if mad == 0.0 {
        return None;
    }
    Some(flag_where(values, |v| {
        (MODIFIED_Z_SCALE * (v - med) / mad).abs() > threshold
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spiked() -> Vec<Option<f64>> {
        [10.0, 12.0, 11.0, 13.0, 9.0, 10.0, 500.0]
            .into_iter()
            .map(Some)
            .collect()
    }

    fn flagged(mask: &[bool]) -> Vec<usize> {
        mask.iter()
            .enumerate()
            .filter(|(_, f)| **f)
            .map(|(i, _)| i)
            .collect()
    }

    #[test]
    fn test_each_method_uses_its_own_mask() {
        // Zero MAD with one spike whose population z is sqrt(8)
        let values: Vec<Option<f64>> = [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 50.0]
            .into_iter()
            .map(Some)
            .collect();

        let iqr = outlier_mask(&values, OutlierMethod::Iqr, 1.5).unwrap();
        assert_eq!(flagged(&iqr), vec![8]);

        let zscore = outlier_mask(&values, OutlierMethod::ZScore, 3.0).unwrap();
        assert!(flagged(&zscore).is_empty());

        assert!(outlier_mask(&values, OutlierMethod::ModifiedZScore, 3.5).is_none());
    }

    #[test]
    fn test_iqr_flags_only_spike() {
        let mask = outlier_mask(&spiked(), OutlierMethod::Iqr, 1.5).unwrap();
        assert_eq!(flagged(&mask), vec![6]);
    }

    #[test]
    fn test_modified_zscore_flags_only_spike() {
        let mask = outlier_mask(&spiked(), OutlierMethod::ModifiedZScore, 3.5).unwrap();
        assert_eq!(flagged(&mask), vec![6]);
    }

    #[test]
    fn test_zscore_bounded_by_sample_size() {
        // With 7 values no population z-score can exceed sqrt(6)
        let strict = outlier_mask(&spiked(), OutlierMethod::ZScore, 3.0).unwrap();
        assert!(flagged(&strict).is_empty());

        let grid = outlier_mask(&spiked(), OutlierMethod::ZScore, 2.0).unwrap();
        assert_eq!(flagged(&grid), vec![6]);
    }

    #[test]
    fn test_nulls_never_flagged() {
        let mut values = spiked();
        values.insert(2, None);
        let mask = outlier_mask(&values, OutlierMethod::Iqr, 1.5).unwrap();
        assert_eq!(mask.len(), 8);
        assert!(!mask[2]);
        assert_eq!(flagged(&mask), vec![7]);
    }

    #[test]
    fn test_zero_mad_skips_modified_zscore() {
        let values: Vec<Option<f64>> = [5.0, 5.0, 5.0, 5.0, 9.0].into_iter().map(Some).collect();
        assert!(outlier_mask(&values, OutlierMethod::ModifiedZScore, 3.5).is_none());
        assert!(outlier_mask(&values, OutlierMethod::Iqr, 1.5).is_some());
    }

    #[test]
    fn test_constant_column_zscore_flags_nothing() {
        let values = vec![Some(2.0); 4];
        let mask = outlier_mask(&values, OutlierMethod::ZScore, 1.5).unwrap();
        assert!(mask.iter().all(|f| !f));
    }

    #[test]
    fn test_too_few_values() {
        let values = vec![Some(1.0), None, Some(100.0)];
        for method in OutlierMethod::ALL {
            assert!(outlier_mask(&values, method, 1.5).is_none());
        }
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&OutlierMethod::ALL).unwrap();
        assert_eq!(json, r#"["iqr","zscore","modified_zscore"]"#);
        assert_eq!(OutlierMethod::ModifiedZScore.to_string(), "modified_zscore");
    }
}
