//! Reliability scoring.
//!
//! [`ReliabilityAnalyzer`] runs the four analyzers over a dataset and
//! [`ReliabilityScorer`] folds their results into a 0-100 score made of four
//! components worth 25 points each.

mod analyzer;
mod scorer;

pub use analyzer::{DatasetSummary, ReliabilityAnalysis, ReliabilityAnalyzer};
pub use scorer::{
    ACCEPTABLE_OUTLIER_PERCENTAGE, COMPONENT_MAX, CONSISTENCY_ISSUE_PENALTY, RecommendationTier,
    ReliabilityReport, ReliabilityScorer, VERY_HIGH_CORRELATION_PENALTY,
};
