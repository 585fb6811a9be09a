//! Pipeline orchestration with builder pattern.

use super::progress::{AnalysisStage, ClosureProgressReporter, ProgressReporter, ProgressUpdate};
use crate::cleaning::{CleaningOrchestrator, CleaningOutcome, CleaningSearch};
use crate::config::{ConfigValidationError, ReliabilityConfig};
use crate::correlation::{CategoryCounts, CorrelationCategory};
use crate::error::{Result, ResultExt};
use crate::quality::{
    ReliabilityAnalysis, ReliabilityAnalyzer, ReliabilityReport, ReliabilityScorer,
};
use crate::reporting::{BeforeAfterComparator, CleaningComparison};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{info, warn};

/// Change in the number of column pairs of one correlation category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryShift {
    pub category: CorrelationCategory,
    pub before: usize,
    pub after: usize,
    /// `after - before`
    pub change: i64,
}

impl CategoryShift {
    /// One shift per category, in [`CorrelationCategory::ALL`] order.
    pub fn between(before: &CategoryCounts, after: &CategoryCounts) -> Vec<Self> {
        CorrelationCategory::ALL
            .iter()
            .map(|&category| {
                let (b, a) = (before.get(category), after.get(category));
                Self {
                    category,
                    before: b,
                    after: a,
                    change: a as i64 - b as i64,
                }
            })
            .collect()
    }
}

/// Everything produced by one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub full_analysis: ReliabilityAnalysis,
    pub full_report: ReliabilityReport,
    pub search: CleaningSearch,
    /// `None` when the grid produced no outcome.
    pub comparison: Option<CleaningComparison>,
    /// Clean final score minus full final score.
    pub score_improvement: Option<f64>,
    pub correlation_shifts: Vec<CategoryShift>,
    pub duration_ms: u64,
}

impl PipelineResult {
    /// The outcome picked by the grid search.
    pub fn best_outcome(&self) -> Option<&CleaningOutcome> {
        self.search.best()
    }

    /// Reliability report of the best cleaned dataset.
    pub fn clean_report(&self) -> Option<&ReliabilityReport> {
        self.best_outcome().map(|o| &o.report)
    }
}

/// Full assessment: analyze, score, search cleaning configurations, compare.
pub struct ReliabilityPipeline {
    config: ReliabilityConfig,
    analyzer: ReliabilityAnalyzer,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(ReliabilityPipeline: Send, Sync);

impl ReliabilityPipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> ReliabilityPipelineBuilder {
        ReliabilityPipelineBuilder::default()
    }

    pub fn config(&self) -> &ReliabilityConfig {
        &self.config
    }

    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(ref reporter) = self.progress_reporter {
            reporter.report(update);
        }
    }

    /// Run the whole assessment on `df`.
    ///
    /// Degenerate data yields zero scores and empty sections. Errors come only
    /// from the dataframe engine.
    pub fn run(&self, df: &DataFrame) -> Result<PipelineResult> {
        match self.run_internal(df) {
            Ok(result) => {
                self.report_progress(ProgressUpdate::complete(format!(
                    "Reliability assessment complete in {} ms",
                    result.duration_ms
                )));
                Ok(result)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                Err(e)
            }
        }
    }

    fn run_internal(&self, df: &DataFrame) -> Result<PipelineResult> {
        let start = Instant::now();

        info!("Starting reliability assessment");
        info!("Input: {} rows x {} columns", df.height(), df.width());
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::Initializing,
            0.0,
            format!("Loaded {} rows x {} columns", df.height(), df.width()),
        ));

        // Step 1: analyze the full dataset
        info!("Step 1: Analyzing full dataset");
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::FullAnalysis,
            0.0,
            "Running normality, outlier, correlation and consistency checks",
        ));
        let full_analysis = self.analyzer.analyze(df).context("Full dataset analysis")?;

        // Step 2: score it
        info!("Step 2: Scoring full dataset");
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::Scoring,
            0.0,
            "Scoring reliability",
        ));
        let full_report = ReliabilityScorer::score(&full_analysis);
        info!(
            "Full dataset reliability: {:.1}/100, {}",
            full_report.final_score, full_report.tier
        );

        // Step 3: cleaning grid search
        info!("Step 3: Searching cleaning configurations");
        let mut orchestrator = CleaningOrchestrator::new(&self.config);
        let total = orchestrator.grid().len();
        self.report_progress(ProgressUpdate::with_items(
            AnalysisStage::CleaningSearch,
            "grid",
            0,
            total,
            format!("Evaluating {} cleaning configurations", total),
        ));
        let evaluated = AtomicUsize::new(0);
        let search = orchestrator
            .run_with(df, |outcome| {
                let done = evaluated.fetch_add(1, Ordering::SeqCst) + 1;
                self.report_progress(ProgressUpdate::with_items(
                    AnalysisStage::CleaningSearch,
                    outcome.config.to_string(),
                    done,
                    total,
                    format!(
                        "{}: {:.2}% data loss, reliability {:.1}",
                        outcome.config, outcome.data_loss_pct, outcome.report.final_score
                    ),
                ));
            })
            .context("Cleaning grid search")?;

        // Step 4: compare the best cleaned dataset with the original
        info!("Step 4: Comparing best cleaned dataset");
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::Comparison,
            0.0,
            "Comparing original and cleaned data",
        ));
        let (comparison, score_improvement, correlation_shifts) = match search.best() {
            Some(best) => {
                let comparison =
                    BeforeAfterComparator::compare(df, &best.cleaned, &best.column_summaries)
                        .context("Before/after comparison")?;
                let improvement = best.report.final_score - full_report.final_score;
                info!(
                    "Best configuration {}: reliability {:.1} -> {:.1} ({:+.1})",
                    best.config, full_report.final_score, best.report.final_score, improvement
                );
                let shifts = CategoryShift::between(
                    &category_counts(&full_analysis),
                    &category_counts(&best.analysis),
                );
                (Some(comparison), Some(improvement), shifts)
            }
            None => {
                warn!("Cleaning search produced no outcome; skipping comparison");
                (None, None, Vec::new())
            }
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        info!("Reliability assessment completed in {} ms", duration_ms);

        Ok(PipelineResult {
            full_analysis,
            full_report,
            search,
            comparison,
            score_improvement,
            correlation_shifts,
            duration_ms,
        })
    }
}

fn category_counts(analysis: &ReliabilityAnalysis) -> CategoryCounts {
    analysis
        .correlation
        .as_ref()
        .map(|c| c.category_counts)
        .unwrap_or_default()
}

/// Builder for [`ReliabilityPipeline`].
#[derive(Default)]
pub struct ReliabilityPipelineBuilder {
    config: Option<ReliabilityConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

impl ReliabilityPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: ReliabilityConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a closure-based progress callback.
    ///
    /// The closure may run on rayon worker threads when the grid search is
    /// parallel.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<ReliabilityPipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(ReliabilityPipeline {
            analyzer: ReliabilityAnalyzer::new(&config),
            config,
            progress_reporter: self.progress_reporter,
        })
    }
}
