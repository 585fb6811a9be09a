//! Correlation and multicollinearity analysis.
//!
//! Computes the Pearson matrix over numeric columns, buckets every column
//! pair by |r|, flags very high correlations for scoring, and reports VIF
//! and domain plausibility findings alongside.

mod domain;
mod matrix;
mod vif;

pub use domain::{
    DomainFinding, DomainRule, Expectation, FindingKind, TRIP_DOMAIN_RULES, check_domain_rules,
};
pub use matrix::{CorrelationMatrix, pearson};
pub use vif::{HIGH_VIF_THRESHOLD, VifCapability, VifEntry, VifReport, vif_report};

use crate::error::Result;
use crate::utils::numeric_column_names;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Severity bucket of a correlation coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationCategory {
    VeryHigh,
    High,
    Moderate,
    Low,
    VeryLow,
}

impl CorrelationCategory {
    pub const ALL: [CorrelationCategory; 5] = [
        Self::VeryHigh,
        Self::High,
        Self::Moderate,
        Self::Low,
        Self::VeryLow,
    ];

    /// Bucket by |r|; an undefined coefficient is `VeryLow`.
    pub fn from_coefficient(r: f64) -> Self {
        let abs = r.abs();
        if abs > 0.8 {
            Self::VeryHigh
        } else if abs > 0.6 {
            Self::High
        } else if abs > 0.3 {
            Self::Moderate
        } else if abs > 0.1 {
            Self::Low
        } else {
            Self::VeryLow
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::VeryHigh => "very_high",
            Self::High => "high",
            Self::Moderate => "moderate",
            Self::Low => "low",
            Self::VeryLow => "very_low",
        }
    }
}

/// One unordered column pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationPair {
    pub column_a: String,
    pub column_b: String,
    pub coefficient: f64,
    pub category: CorrelationCategory,
}

/// Number of pairs per category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub very_high: usize,
    pub high: usize,
    pub moderate: usize,
    pub low: usize,
    pub very_low: usize,
}

impl CategoryCounts {
    pub fn get(&self, category: CorrelationCategory) -> usize {
        match category {
            CorrelationCategory::VeryHigh => self.very_high,
            CorrelationCategory::High => self.high,
            CorrelationCategory::Moderate => self.moderate,
            CorrelationCategory::Low => self.low,
            CorrelationCategory::VeryLow => self.very_low,
        }
    }

    fn record(&mut self, category: CorrelationCategory) {
        let slot = match category {
            CorrelationCategory::VeryHigh => &mut self.very_high,
            CorrelationCategory::High => &mut self.high,
            CorrelationCategory::Moderate => &mut self.moderate,
            CorrelationCategory::Low => &mut self.low,
            CorrelationCategory::VeryLow => &mut self.very_low,
        };
        *slot += 1;
    }

    pub fn total(&self) -> usize {
        CorrelationCategory::ALL.iter().map(|c| self.get(*c)).sum()
    }
}

/// Full correlation analysis of a dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationAnalysis {
    pub matrix: CorrelationMatrix,
    /// Every unordered pair, in matrix order.
    pub pairs: Vec<CorrelationPair>,
    pub category_counts: CategoryCounts,
    /// Pairs with |r| above 0.8; these drive the correlation score.
    pub high_correlations: Vec<CorrelationPair>,
    /// `None` when VIF reporting is turned off.
    pub vif: Option<VifReport>,
    pub domain_findings: Vec<DomainFinding>,
}

impl CorrelationAnalysis {
    /// Domain findings that contradict their rule.
    pub fn domain_anomalies(&self) -> impl Iterator<Item = &DomainFinding> {
        self.domain_findings.iter().filter(|f| f.kind.is_anomaly())
    }
}

/// Correlation analyzer with the VIF capability resolved up front.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationAnalyzer {
    vif_capability: VifCapability,
    compute_vif: bool,
}

impl Default for CorrelationAnalyzer {
    fn default() -> Self {
        Self::new(true)
    }
}

impl CorrelationAnalyzer {
    pub fn new(compute_vif: bool) -> Self {
        Self {
            vif_capability: VifCapability::detect(),
            compute_vif,
        }
    }

    pub fn vif_capability(&self) -> VifCapability {
        self.vif_capability
    }

    pub fn analyze(&self, df: &DataFrame) -> Result<CorrelationAnalysis> {
        let columns = numeric_column_names(df);
        let matrix = CorrelationMatrix::compute(df, &columns)?;

        let mut pairs = Vec::new();
        let mut category_counts = CategoryCounts::default();
        for i in 0..matrix.len() {
            for j in (i + 1)..matrix.len() {
                let coefficient = matrix.values[i][j];
                let category = CorrelationCategory::from_coefficient(coefficient);
                category_counts.record(category);
                pairs.push(CorrelationPair {
                    column_a: matrix.columns[i].clone(),
                    column_b: matrix.columns[j].clone(),
                    coefficient,
                    category,
                });
            }
        }

        let high_correlations: Vec<CorrelationPair> = pairs
            .iter()
            .filter(|p| p.category == CorrelationCategory::VeryHigh)
            .cloned()
            .collect();
        debug!(
            "Correlation: {} pairs, {} very high",
            pairs.len(),
            high_correlations.len()
        );

        let vif = if self.compute_vif {
            Some(vif_report(df, &columns, self.vif_capability)?)
        } else {
            None
        };

        let domain_findings = check_domain_rules(&matrix, TRIP_DOMAIN_RULES);

        Ok(CorrelationAnalysis {
            matrix,
            pairs,
            category_counts,
            high_correlations,
            vif,
            domain_findings,
        })
    }
}
