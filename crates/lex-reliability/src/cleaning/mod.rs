//! Outlier cleaning and configuration search.
//!
//! For each (method, threshold) pair the orchestrator removes flagged rows
//! from a copy of the dataset, re-runs the full reliability analysis on the
//! copy, and finally picks one configuration by data loss.

mod orchestrator;
mod selection;

pub use orchestrator::{
    CleanedDataset, CleaningConfig, CleaningOrchestrator, CleaningOutcome, CleaningSearch,
    ColumnRemovalSummary, SearchState, remove_outliers,
};
pub use selection::{loss_score, select_best};
