//! End-to-end reliability assessment.
//!
//! [`ReliabilityPipeline`] analyzes and scores the full dataset, searches the
//! cleaning grid, and compares the chosen cleaned dataset with the original.

mod builder;
mod progress;

pub use builder::{CategoryShift, PipelineResult, ReliabilityPipeline, ReliabilityPipelineBuilder};
pub use progress::{AnalysisStage, ClosureProgressReporter, ProgressReporter, ProgressUpdate};
