//! Before/after comparison and report generation.
//!
//! [`BeforeAfterComparator`] measures how cleaning shifted each numeric
//! column. [`ReportGenerator`] turns a [`PipelineResult`](crate::pipeline::PipelineResult)
//! into a [`ComprehensiveReport`] suitable for:
//! - JSON output to stdout (`--json` CLI flag)
//! - JSON file output (`--output` CLI flag)
//! - Programmatic access in library mode
//!
//! # Example
//!
//! ```rust,ignore
//! use lex_reliability::reporting::ReportGenerator;
//!
//! let report = ReportGenerator::build_comprehensive_report("data/trips.csv", &result);
//! println!("{}", serde_json::to_string_pretty(&report)?);
//! ```

mod comparison;
mod generator;

pub use comparison::{BeforeAfterComparator, CleaningComparison, ColumnComparison, DataLossLevel};
pub use generator::{
    ComprehensiveReport, ConfigurationSummary, ImprovementVerdict, ReportGenerator, ScoreSummary,
};
