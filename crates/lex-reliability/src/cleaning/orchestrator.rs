use super::selection::{loss_score, select_best};
use crate::config::ReliabilityConfig;
use crate::error::{Result, ResultExt};
use crate::outliers::{OutlierMethod, outlier_mask};
use crate::quality::{
    ReliabilityAnalysis, ReliabilityAnalyzer, ReliabilityReport, ReliabilityScorer,
};
use crate::utils::{column_values, numeric_column_names, percentage};
use polars::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// One point of the cleaning grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CleaningConfig {
    pub method: OutlierMethod,
    pub threshold: f64,
}

impl CleaningConfig {
    pub fn new(method: OutlierMethod, threshold: f64) -> Self {
        Self { method, threshold }
    }

    /// Cross product of `methods` and `thresholds`, methods outermost.
    pub fn grid(methods: &[OutlierMethod], thresholds: &[f64]) -> Vec<Self> {
        methods
            .iter()
            .flat_map(|&method| thresholds.iter().map(move |&t| Self::new(method, t)))
            .collect()
    }
}

impl fmt::Display for CleaningConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.method, self.threshold)
    }
}

/// Rows removed on account of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRemovalSummary {
    pub column: String,
    /// Values flagged in this column.
    pub outliers_detected: usize,
    /// Flagged rows not already removed for an earlier column.
    pub rows_removed: usize,
    /// `rows_removed` over the original row count, 0-100.
    pub percentage_removed: f64,
}

/// A dataset with outliers removed under one configuration.
#[derive(Debug, Clone)]
pub struct CleanedDataset {
    pub data: DataFrame,
    pub column_summaries: Vec<ColumnRemovalSummary>,
    pub original_rows: usize,
}

impl CleanedDataset {
    pub fn rows_removed(&self) -> usize {
        self.original_rows - self.data.height()
    }

    /// Removed rows over original rows, 0 for an empty input.
    pub fn data_loss_pct(&self) -> f64 {
        percentage(self.rows_removed(), self.original_rows)
    }
}

/// Remove the rows flagged by `config` in any numeric column.
///
/// Every column's mask is computed on the input, so the result does not
/// depend on column order. Columns the method cannot evaluate are left out
/// of the summary.
pub fn remove_outliers(df: &DataFrame, config: CleaningConfig) -> Result<CleanedDataset> {
    let rows = df.height();
    let mut removed = vec![false; rows];
    let mut column_summaries = Vec::new();

    for name in numeric_column_names(df) {
        let values = column_values(df, &name)?;
        let Some(mask) = outlier_mask(&values, config.method, config.threshold) else {
            continue;
        };

        let mut outliers_detected = 0;
        let mut rows_removed = 0;
        for (flag, gone) in mask.iter().zip(removed.iter_mut()) {
            if *flag {
                outliers_detected += 1;
                if !*gone {
                    *gone = true;
                    rows_removed += 1;
                }
            }
        }

        column_summaries.push(ColumnRemovalSummary {
            column: name,
            outliers_detected,
            rows_removed,
            percentage_removed: percentage(rows_removed, rows),
        });
    }

    let data = if removed.iter().any(|&gone| gone) {
        let keep: Vec<bool> = removed.iter().map(|gone| !gone).collect();
        let mask = BooleanChunked::from_slice("keep".into(), &keep);
        df.filter(&mask)?
    } else {
        df.clone()
    };

    Ok(CleanedDataset {
        data,
        column_summaries,
        original_rows: rows,
    })
}

/// Result of evaluating one configuration.
#[derive(Debug, Clone, Serialize)]
pub struct CleaningOutcome {
    pub config: CleaningConfig,
    #[serde(skip)]
    pub cleaned: DataFrame,
    pub column_summaries: Vec<ColumnRemovalSummary>,
    pub original_rows: usize,
    pub remaining_rows: usize,
    pub rows_removed: usize,
    pub data_loss_pct: f64,
    pub loss_score: u8,
    pub analysis: ReliabilityAnalysis,
    pub report: ReliabilityReport,
}

/// Where the grid search stands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SearchState {
    /// Configurations are being evaluated.
    Evaluating { total: usize },
    /// Every configuration was evaluated and the winner chosen.
    Done { best: Option<CleaningConfig> },
}

/// All evaluated outcomes, in grid order, and the chosen one.
#[derive(Debug, Clone, Serialize)]
pub struct CleaningSearch {
    pub outcomes: Vec<CleaningOutcome>,
    pub best_index: Option<usize>,
}

impl CleaningSearch {
    pub fn best(&self) -> Option<&CleaningOutcome> {
        self.best_index.and_then(|i| self.outcomes.get(i))
    }
}

/// Grid search over cleaning configurations.
pub struct CleaningOrchestrator {
    analyzer: ReliabilityAnalyzer,
    grid: Vec<CleaningConfig>,
    parallel: bool,
    state: SearchState,
}

impl CleaningOrchestrator {
    pub fn new(config: &ReliabilityConfig) -> Self {
        let grid = CleaningConfig::grid(&config.cleaning_methods, &config.cleaning_thresholds);
        Self {
            analyzer: ReliabilityAnalyzer::new(config),
            state: SearchState::Evaluating { total: grid.len() },
            grid,
            parallel: config.parallel_grid,
        }
    }

    pub fn grid(&self) -> &[CleaningConfig] {
        &self.grid
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    /// Clean with one configuration and score the result.
    pub fn evaluate(&self, df: &DataFrame, config: CleaningConfig) -> Result<CleaningOutcome> {
        let cleaned = remove_outliers(df, config).context(format!("Cleaning with {}", config))?;
        let analysis = self
            .analyzer
            .analyze(&cleaned.data)
            .context(format!("Analyzing data cleaned with {}", config))?;
        let report = ReliabilityScorer::score(&analysis);
        let data_loss_pct = cleaned.data_loss_pct();

        info!(
            "{}: removed {} of {} rows ({:.2}%), reliability {:.1}",
            config,
            cleaned.rows_removed(),
            cleaned.original_rows,
            data_loss_pct,
            report.final_score
        );

        Ok(CleaningOutcome {
            config,
            rows_removed: cleaned.rows_removed(),
            remaining_rows: cleaned.data.height(),
            original_rows: cleaned.original_rows,
            column_summaries: cleaned.column_summaries,
            cleaned: cleaned.data,
            data_loss_pct,
            loss_score: loss_score(data_loss_pct),
            analysis,
            report,
        })
    }

    /// Evaluate the whole grid, then pick the winner.
    pub fn run(&mut self, df: &DataFrame) -> Result<CleaningSearch> {
        self.run_with(df, |_| {})
    }

    /// Like [`run`](Self::run), calling `on_outcome` after each evaluation.
    ///
    /// In parallel mode `on_outcome` fires in completion order, which may
    /// differ from grid order; the returned outcomes are always in grid order.
    pub fn run_with<F>(&mut self, df: &DataFrame, on_outcome: F) -> Result<CleaningSearch>
    where
        F: Fn(&CleaningOutcome) + Send + Sync,
    {
        self.state = SearchState::Evaluating {
            total: self.grid.len(),
        };
        debug!(
            "Evaluating {} cleaning configurations{}",
            self.grid.len(),
            if self.parallel { " in parallel" } else { "" }
        );

        let evaluate = |config: &CleaningConfig| -> Result<CleaningOutcome> {
            let outcome = self.evaluate(df, *config)?;
            on_outcome(&outcome);
            Ok(outcome)
        };
        let outcomes: Vec<CleaningOutcome> = if self.parallel {
            self.grid.par_iter().map(evaluate).collect::<Result<_>>()?
        } else {
            self.grid.iter().map(evaluate).collect::<Result<_>>()?
        };

        let best_index = select_best(outcomes.iter().map(|o| o.data_loss_pct));
        let best = best_index.map(|i| outcomes[i].config);
        self.state = SearchState::Done { best };

        match best {
            Some(config) => info!("Recommended cleaning configuration: {}", config),
            None => info!("No cleaning configuration evaluated"),
        }

        Ok(CleaningSearch {
            outcomes,
            best_index,
        })
    }
}
