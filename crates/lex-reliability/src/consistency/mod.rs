//! Data consistency rules.
//!
//! A fixed rule set for trip records:
//!
//! - monetary and measurement columns must not be negative
//! - fare and distance should rarely be exactly zero
//! - no value should exceed ten times its column's 99.9th percentile
//!
//! Named rules apply only to numeric columns with exactly those names.

use crate::error::Result;
use crate::utils::{
    column_values, is_numeric_dtype, numeric_column_names, percentage, quantile, valid_values,
};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Columns that must never hold negative values.
pub const NON_NEGATIVE_COLUMNS: [&str; 4] =
    ["fare_amount", "distance", "duration", "tip_amount"];

/// Columns whose zero rate is monitored.
pub const ZERO_RATE_COLUMNS: [&str; 2] = ["fare_amount", "distance"];

/// Zero rate (percent of all rows) above which a column is flagged.
pub const MAX_ZERO_PERCENTAGE: f64 = 5.0;

/// Multiple of the 99.9th percentile beyond which a value is extreme.
pub const EXTREME_MULTIPLIER: f64 = 10.0;

const EXTREME_QUANTILE: f64 = 0.999;

/// Which rule an issue violates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyRule {
    NegativeValues,
    ExcessiveZeros,
    ExtremeValues,
}

impl fmt::Display for ConsistencyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NegativeValues => "negative values",
            Self::ExcessiveZeros => "excessive zeros",
            Self::ExtremeValues => "extreme values",
        };
        f.write_str(name)
    }
}

/// One violated rule on one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyIssue {
    pub rule: ConsistencyRule,
    pub column: String,
    pub count: usize,
    /// Share of all rows, 0-100.
    pub percentage: f64,
    pub description: String,
}

impl ConsistencyIssue {
    fn new(rule: ConsistencyRule, column: &str, count: usize, rows: usize) -> Self {
        let percentage = percentage(count, rows);
        let description = match rule {
            ConsistencyRule::NegativeValues => format!("{}: {} negative values", column, count),
            ConsistencyRule::ExcessiveZeros => {
                format!("{}: {} zero values ({:.1}%)", column, count, percentage)
            }
            ConsistencyRule::ExtremeValues => {
                format!("{}: {} extremely high values", column, count)
            }
        };
        Self {
            rule,
            column: column.to_string(),
            count,
            percentage,
            description,
        }
    }
}

/// Applies the consistency rules.
pub struct ConsistencyChecker;

impl ConsistencyChecker {
    /// All issues, ordered by rule and then by column.
    pub fn check(df: &DataFrame) -> Result<Vec<ConsistencyIssue>> {
        let rows = df.height();
        let mut issues = Vec::new();

        for name in NON_NEGATIVE_COLUMNS {
            if let Some(values) = Self::named_numeric(df, name)? {
                let count = values.iter().flatten().filter(|&&v| v < 0.0).count();
                if count > 0 {
                    issues.push(ConsistencyIssue::new(
                        ConsistencyRule::NegativeValues,
                        name,
                        count,
                        rows,
                    ));
                }
            }
        }

        for name in ZERO_RATE_COLUMNS {
            if let Some(values) = Self::named_numeric(df, name)? {
                let count = values.iter().flatten().filter(|&&v| v == 0.0).count();
                if percentage(count, rows) > MAX_ZERO_PERCENTAGE {
                    issues.push(ConsistencyIssue::new(
                        ConsistencyRule::ExcessiveZeros,
                        name,
                        count,
                        rows,
                    ));
                }
            }
        }

        for name in numeric_column_names(df) {
            let values = valid_values(&column_values(df, &name)?);
            let Some(p999) = quantile(&values, EXTREME_QUANTILE) else {
                continue;
            };
            let limit = p999 * EXTREME_MULTIPLIER;
            let count = values.iter().filter(|&&v| v > limit).count();
            if count > 0 {
                issues.push(ConsistencyIssue::new(
                    ConsistencyRule::ExtremeValues,
                    &name,
                    count,
                    rows,
                ));
            }
        }

        for issue in &issues {
            debug!("Consistency issue: {}", issue.description);
        }
        Ok(issues)
    }

    /// Values of `name` if it exists as a numeric column.
    fn named_numeric(df: &DataFrame, name: &str) -> Result<Option<Vec<Option<f64>>>> {
        match df.column(name) {
            Ok(col) if is_numeric_dtype(col.dtype()) => Ok(Some(column_values(df, name)?)),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_clean_trips_have_no_issues() {
        let df = df![
            "fare_amount" => [12.5, 8.0, 20.0, 15.5],
            "distance" => [3.2, 1.1, 7.5, 4.0],
        ]
        .unwrap();
        assert!(ConsistencyChecker::check(&df).unwrap().is_empty());
    }

    #[test]
    fn test_negative_values_counted() {
        let df = df![
            "tip_amount" => [Some(1.0), Some(-2.0), None, Some(-0.5)],
            "duration" => [10.0, 12.0, 9.0, 11.0],
        ]
        .unwrap();
        let issues = ConsistencyChecker::check(&df).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].rule, ConsistencyRule::NegativeValues);
        assert_eq!(issues[0].column, "tip_amount");
        assert_eq!(issues[0].count, 2);
        assert_eq!(issues[0].description, "tip_amount: 2 negative values");
    }

    #[test]
    fn test_zero_rate_uses_total_rows() {
        // 1 zero in 20 rows is exactly 5%, not above it
        let mut fares = vec![10.0; 19];
        fares.push(0.0);
        let df = df!["fare_amount" => fares.clone()].unwrap();
        assert!(ConsistencyChecker::check(&df).unwrap().is_empty());

        fares[0] = 0.0;
        let df = df!["fare_amount" => fares].unwrap();
        let issues = ConsistencyChecker::check(&df).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].rule, ConsistencyRule::ExcessiveZeros);
        assert!((issues[0].percentage - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_non_numeric_named_column_ignored() {
        let df = df!["fare_amount" => ["-1", "0", "0"]].unwrap();
        assert!(ConsistencyChecker::check(&df).unwrap().is_empty());
    }

    #[test]
    fn test_extreme_values_against_p999() {
        // With many rows P99.9 sits close to the bulk of the data
        let mut values = vec![1.0; 5000];
        values.push(1000.0);
        let df = df!["surge_multiplier" => values].unwrap();
        let issues = ConsistencyChecker::check(&df).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].rule, ConsistencyRule::ExtremeValues);
        assert_eq!(issues[0].count, 1);
    }

    #[test]
    fn test_issue_order_follows_rules() {
        let df = df![
            "distance" => [0.0, 0.0, -1.0, 2.0],
            "fare_amount" => [-3.0, 5.0, 6.0, 0.0],
        ]
        .unwrap();
        let rules: Vec<(ConsistencyRule, String)> = ConsistencyChecker::check(&df)
            .unwrap()
            .into_iter()
            .map(|i| (i.rule, i.column))
            .collect();
        assert_eq!(
            rules,
            vec![
                (ConsistencyRule::NegativeValues, "fare_amount".to_string()),
                (ConsistencyRule::NegativeValues, "distance".to_string()),
                (ConsistencyRule::ExcessiveZeros, "fare_amount".to_string()),
                (ConsistencyRule::ExcessiveZeros, "distance".to_string()),
            ]
        );
    }
}
