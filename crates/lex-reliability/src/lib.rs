//! Statistical Reliability Engine for Trip Data
//!
//! Assesses how trustworthy a tabular ride-hailing dataset is for analysis,
//! then searches for the outlier-cleaning configuration that loses the least
//! data and reports how cleaning changed the picture.
//!
//! # Overview
//!
//! - **Normality**: Shapiro-Wilk, Kolmogorov-Smirnov, Jarque-Bera and
//!   Anderson-Darling per numeric column, combined by majority vote
//! - **Outliers**: IQR, Z-score and modified Z-score per numeric column
//! - **Correlation**: Pearson matrix, severity buckets, VIF and trip-domain
//!   plausibility rules
//! - **Consistency**: negative, zero-rate and extreme-value rules
//! - **Scoring**: four 25-point components and a recommendation tier
//! - **Cleaning search**: a (method, threshold) grid, optionally evaluated on
//!   the rayon thread pool
//! - **Comparison**: before/after column statistics of the chosen cleaning
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use lex_reliability::{ReliabilityConfig, ReliabilityPipeline, OutlierMethod};
//! use polars::prelude::*;
//!
//! let df = CsvReadOptions::default()
//!     .try_into_reader_with_file_path(Some("trips.csv".into()))?
//!     .finish()?;
//!
//! let config = ReliabilityConfig::builder()
//!     .cleaning_methods(vec![OutlierMethod::Iqr, OutlierMethod::ModifiedZScore])
//!     .parallel_grid(true)
//!     .build()?;
//!
//! let result = ReliabilityPipeline::builder()
//!     .config(config)
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .run(&df)?;
//!
//! println!("Full dataset: {:.1}/100", result.full_report.final_score);
//! if let Some(best) = result.best_outcome() {
//!     println!("Best cleaning: {} ({:.2}% loss)", best.config, best.data_loss_pct);
//! }
//! ```
//!
//! # Using the analyzers directly
//!
//! Every stage is usable on its own:
//!
//! ```rust,ignore
//! use lex_reliability::{ReliabilityAnalyzer, ReliabilityScorer};
//!
//! let analysis = ReliabilityAnalyzer::default().analyze(&df)?;
//! let report = ReliabilityScorer::score(&analysis);
//! println!("{} -> {}", report.final_score, report.tier);
//! ```
//!
//! # Features
//!
//! - `vif` (default): variance inflation factors in the correlation analysis.
//!   Without it the VIF section is reported as skipped.

pub mod cleaning;
pub mod config;
pub mod consistency;
pub mod correlation;
pub mod error;
pub mod normality;
pub mod outliers;
pub mod pipeline;
pub mod quality;
pub mod reporting;
pub mod utils;

// Re-exports for convenient access
pub use cleaning::{
    CleanedDataset, CleaningConfig, CleaningOrchestrator, CleaningOutcome, CleaningSearch,
    ColumnRemovalSummary, SearchState, loss_score, remove_outliers, select_best,
};
pub use config::{ConfigValidationError, ReliabilityConfig, ReliabilityConfigBuilder};
pub use consistency::{ConsistencyChecker, ConsistencyIssue, ConsistencyRule};
pub use correlation::{
    CategoryCounts, CorrelationAnalysis, CorrelationAnalyzer, CorrelationCategory,
    CorrelationMatrix, CorrelationPair, DomainFinding, VifCapability, VifReport,
};
pub use error::{ReliabilityError, Result as ReliabilityResult, ResultExt};
pub use normality::{NormalityResult, NormalityTester};
pub use outliers::{MethodOutlierStats, OutlierDetector, OutlierMethod, OutlierResult};
pub use pipeline::{
    AnalysisStage, CategoryShift, ClosureProgressReporter, PipelineResult, ProgressReporter,
    ProgressUpdate, ReliabilityPipeline, ReliabilityPipelineBuilder,
};
pub use quality::{
    DatasetSummary, RecommendationTier, ReliabilityAnalysis, ReliabilityAnalyzer,
    ReliabilityReport, ReliabilityScorer,
};
pub use reporting::{
    BeforeAfterComparator, CleaningComparison, ColumnComparison, ComprehensiveReport,
    DataLossLevel, ImprovementVerdict, ReportGenerator,
};
