use super::analyzer::{DatasetSummary, ReliabilityAnalysis};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound of each component score.
pub const COMPONENT_MAX: f64 = 25.0;

/// Average outlier percentage below which a column counts as clean.
pub const ACCEPTABLE_OUTLIER_PERCENTAGE: f64 = 5.0;

/// Points lost per very high correlation pair.
pub const VERY_HIGH_CORRELATION_PENALTY: f64 = 5.0;

/// Points lost per consistency issue.
pub const CONSISTENCY_ISSUE_PENALTY: f64 = 3.0;

/// Recommendation derived from the final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationTier {
    Poor,
    Moderate,
    Good,
    Excellent,
}

impl RecommendationTier {
    pub fn from_score(score: f64) -> Self {
        if score >= 85.0 {
            Self::Excellent
        } else if score >= 70.0 {
            Self::Good
        } else if score >= 50.0 {
            Self::Moderate
        } else {
            Self::Poor
        }
    }

    pub fn recommendation(self) -> &'static str {
        match self {
            Self::Excellent => "use as-is",
            Self::Good => "minimal cleaning",
            Self::Moderate => "comprehensive cleaning recommended",
            Self::Poor => "heavy preprocessing required",
        }
    }
}

impl fmt::Display for RecommendationTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Moderate => "moderate",
            Self::Poor => "poor",
        };
        write!(f, "{} ({})", label, self.recommendation())
    }
}

/// Composite reliability score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReliabilityReport {
    pub summary: DatasetSummary,

    pub normality_score: f64,
    pub outlier_score: f64,
    pub correlation_score: f64,
    pub consistency_score: f64,
    /// Sum of the four components, 0-100.
    pub final_score: f64,
    pub tier: RecommendationTier,

    pub normal_columns: usize,
    pub normality_evaluated: usize,
    pub low_outlier_columns: usize,
    pub outlier_evaluated: usize,
    pub very_high_correlations: usize,
    pub consistency_issues: usize,
    pub high_vif_columns: Vec<String>,
    pub domain_anomalies: usize,
}

/// Turns a [`ReliabilityAnalysis`] into a [`ReliabilityReport`].
pub struct ReliabilityScorer;

impl ReliabilityScorer {
    /// `COMPONENT_MAX * passing / evaluated`, 0 when nothing was evaluated.
    fn ratio_score(passing: usize, evaluated: usize) -> f64 {
        if evaluated == 0 {
            0.0
        } else {
            COMPONENT_MAX * passing as f64 / evaluated as f64
        }
    }

    fn penalty_score(count: usize, penalty: f64) -> f64 {
        (COMPONENT_MAX - penalty * count as f64).max(0.0)
    }

    pub fn score(analysis: &ReliabilityAnalysis) -> ReliabilityReport {
        let normal_columns = analysis.normality.iter().filter(|r| r.is_normal).count();
        let normality_evaluated = analysis.normality.len();
        let normality_score = Self::ratio_score(normal_columns, normality_evaluated);

        let low_outlier_columns = analysis
            .outliers
            .iter()
            .filter(|r| r.average_percentage < ACCEPTABLE_OUTLIER_PERCENTAGE)
            .count();
        let outlier_evaluated = analysis.outliers.len();
        let outlier_score = Self::ratio_score(low_outlier_columns, outlier_evaluated);

        let (correlation_score, very_high_correlations, high_vif_columns, domain_anomalies) =
            match &analysis.correlation {
                Some(correlation) => {
                    let very_high = correlation.high_correlations.len();
                    let high_vif: Vec<String> = correlation
                        .vif
                        .as_ref()
                        .map(|vif| {
                            vif.high_vif_columns()
                                .into_iter()
                                .map(str::to_string)
                                .collect()
                        })
                        .unwrap_or_default();
                    (
                        Self::penalty_score(very_high, VERY_HIGH_CORRELATION_PENALTY),
                        very_high,
                        high_vif,
                        correlation.domain_anomalies().count(),
                    )
                }
                None => (0.0, 0, Vec::new(), 0),
            };

        let (consistency_score, consistency_issues) = match &analysis.consistency {
            Some(issues) => (
                Self::penalty_score(issues.len(), CONSISTENCY_ISSUE_PENALTY),
                issues.len(),
            ),
            None => (0.0, 0),
        };

        let final_score = normality_score + outlier_score + correlation_score + consistency_score;

        ReliabilityReport {
            summary: analysis.summary,
            normality_score,
            outlier_score,
            correlation_score,
            consistency_score,
            final_score,
            tier: RecommendationTier::from_score(final_score),
            normal_columns,
            normality_evaluated,
            low_outlier_columns,
            outlier_evaluated,
            very_high_correlations,
            consistency_issues,
            high_vif_columns,
            domain_anomalies,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consistency::{ConsistencyIssue, ConsistencyRule};
    use crate::quality::ReliabilityAnalyzer;
    use polars::prelude::*;

    fn empty_analysis() -> ReliabilityAnalysis {
        ReliabilityAnalyzer::default()
            .analyze(&DataFrame::empty())
            .unwrap()
    }

    fn issue(column: &str) -> ConsistencyIssue {
        ConsistencyIssue {
            rule: ConsistencyRule::NegativeValues,
            column: column.to_string(),
            count: 1,
            percentage: 1.0,
            description: format!("{}: 1 negative values", column),
        }
    }

    #[test]
    fn test_tier_cutoffs() {
        assert_eq!(RecommendationTier::from_score(100.0), RecommendationTier::Excellent);
        assert_eq!(RecommendationTier::from_score(85.0), RecommendationTier::Excellent);
        assert_eq!(RecommendationTier::from_score(84.99), RecommendationTier::Good);
        assert_eq!(RecommendationTier::from_score(70.0), RecommendationTier::Good);
        assert_eq!(RecommendationTier::from_score(50.0), RecommendationTier::Moderate);
        assert_eq!(RecommendationTier::from_score(49.9), RecommendationTier::Poor);
        assert_eq!(
            RecommendationTier::Poor.to_string(),
            "poor (heavy preprocessing required)"
        );
    }

    #[test]
    fn test_empty_dataset_scores_zero() {
        let report = ReliabilityScorer::score(&empty_analysis());
        assert_eq!(report.normality_score, 0.0);
        assert_eq!(report.outlier_score, 0.0);
        assert_eq!(report.correlation_score, 0.0);
        assert_eq!(report.consistency_score, 0.0);
        assert_eq!(report.final_score, 0.0);
        assert_eq!(report.tier, RecommendationTier::Poor);
    }

    #[test]
    fn test_consistency_penalty_floors_at_zero() {
        let mut analysis = empty_analysis();
        analysis.consistency = Some((0..4).map(|i| issue(&format!("c{}", i))).collect());
        assert_eq!(ReliabilityScorer::score(&analysis).consistency_score, 13.0);

        analysis.consistency = Some((0..9).map(|i| issue(&format!("c{}", i))).collect());
        assert_eq!(ReliabilityScorer::score(&analysis).consistency_score, 0.0);

        analysis.consistency = Some(Vec::new());
        assert_eq!(ReliabilityScorer::score(&analysis).consistency_score, 25.0);
    }

    #[test]
    fn test_components_sum_to_final() {
        let df = df![
            "distance" => [1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            "fare_amount" => [4.0, 6.5, 8.0, 11.0, 12.5, 15.0],
            "rating" => [4.5, 4.0, 4.8, 3.9, 4.6, 4.2],
        ]
        .unwrap();
        let analysis = ReliabilityAnalyzer::default().analyze(&df).unwrap();
        let report = ReliabilityScorer::score(&analysis);

        let sum = report.normality_score
            + report.outlier_score
            + report.correlation_score
            + report.consistency_score;
        assert!((report.final_score - sum).abs() < 1e-12);
        assert!((0.0..=100.0).contains(&report.final_score));
        assert_eq!(report.very_high_correlations, 1);
        assert_eq!(report.correlation_score, 20.0);
    }
}
