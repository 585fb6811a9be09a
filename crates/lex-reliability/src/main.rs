//! CLI entry point for the reliability engine.

use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use lex_reliability::{
    ComprehensiveReport, OutlierMethod, ReliabilityConfig, ReliabilityPipeline, ReportGenerator,
};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// CLI-compatible outlier method enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOutlierMethod {
    /// Interquartile range fences
    Iqr,
    /// Standard score against mean and standard deviation
    Zscore,
    /// Robust score against median and MAD
    ModifiedZscore,
}

impl From<CliOutlierMethod> for OutlierMethod {
    fn from(cli: CliOutlierMethod) -> Self {
        match cli {
            CliOutlierMethod::Iqr => OutlierMethod::Iqr,
            CliOutlierMethod::Zscore => OutlierMethod::ZScore,
            CliOutlierMethod::ModifiedZscore => OutlierMethod::ModifiedZScore,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    author = "Lex Machina Team",
    version,
    about = "Statistical reliability assessment for trip datasets",
    long_about = "Scores how reliable a ride-hailing dataset is for analysis and searches \
                  for the outlier-cleaning configuration with the least data loss.\n\n\
                  EXAMPLES:\n  \
                  # Full assessment with the default grid\n  \
                  lex-reliability -i trips.csv\n\n  \
                  # Only IQR, two thresholds, evaluated in parallel\n  \
                  lex-reliability -i trips.csv --methods iqr --thresholds 1.5,3 --parallel\n\n  \
                  # JSON to stdout, for piping\n  \
                  lex-reliability -i trips.csv --json | jq .best_config"
)]
struct Args {
    /// Path to the CSV file to assess
    #[arg(short, long)]
    input: String,

    /// Outlier methods evaluated by the cleaning search
    #[arg(
        long,
        value_enum,
        value_delimiter = ',',
        default_values_t = [
            CliOutlierMethod::Iqr,
            CliOutlierMethod::Zscore,
            CliOutlierMethod::ModifiedZscore,
        ]
    )]
    methods: Vec<CliOutlierMethod>,

    /// Thresholds evaluated for every method
    #[arg(long, value_delimiter = ',', default_values_t = [1.5, 2.0, 2.5])]
    thresholds: Vec<f64>,

    /// Evaluate cleaning configurations in parallel
    #[arg(long)]
    parallel: bool,

    /// Skip variance inflation factors
    #[arg(long)]
    no_vif: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all progress logs; only outputs the final JSON report.
    #[arg(long)]
    json: bool,

    /// Write the JSON report to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.json);

    if !Path::new(&args.input).exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    info!("Loading dataset from: {}", args.input);
    let data = load_csv(&args.input)?;
    info!("Dataset loaded successfully: {:?}", data.shape());

    let config = ReliabilityConfig::builder()
        .cleaning_methods(args.methods.iter().map(|&m| m.into()).collect())
        .cleaning_thresholds(args.thresholds.clone())
        .parallel_grid(args.parallel)
        .compute_vif(!args.no_vif)
        .build()?;

    let pipeline = ReliabilityPipeline::builder()
        .config(config)
        .on_progress(|update| {
            debug!(
                "[{:>3.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        })
        .build()?;

    let result = pipeline.run(&data).map_err(|e| {
        error!("Reliability assessment failed: {}", e);
        anyhow!("Reliability assessment failed: {}", e)
    })?;

    let report = ReportGenerator::build_comprehensive_report(&args.input, &result);

    if let Some(ref path) = args.output {
        let written = ReportGenerator::write_report_to_file(&report, path)?;
        info!("Report written to: {}", written.display());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_human_readable_summary(&report);
    Ok(())
}

/// Load a CSV file, retrying without quote handling if the first attempt fails.
fn load_csv(path: &str) -> Result<DataFrame> {
    match CsvReadOptions::default()
        .with_infer_schema_length(Some(1000))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => {
            debug!("Standard loading failed: {}", e);
        }
    }

    CsvReadOptions::default()
        .with_infer_schema_length(Some(1000))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(None))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
        .map_err(|e| anyhow!("Could not parse {} as CSV: {}", path, e))
}

/// Print the assessment for a terminal reader.
///
/// Uses `println!` on purpose: this is the command's output, not a log.
fn print_human_readable_summary(report: &ComprehensiveReport) {
    println!("\n{}", "=".repeat(80));
    println!("RELIABILITY ASSESSMENT");
    println!("{}\n", "=".repeat(80));

    println!("DATASET");
    println!("{}", "-".repeat(40));
    println!("  File: {}", report.input_file);
    println!("  Rows: {}", report.dataset.observations);
    println!(
        "  Columns: {} ({} numeric)",
        report.dataset.columns, report.dataset.numeric_columns
    );
    println!("  Missing cells: {:.2}%", report.dataset.missing_percentage);
    println!();

    println!("FULL DATASET SCORE");
    println!("{}", "-".repeat(40));
    let full = &report.full_scores;
    println!("  Normality:   {:>5.1}/25", full.normality_score);
    println!("  Outliers:    {:>5.1}/25", full.outlier_score);
    println!("  Correlation: {:>5.1}/25", full.correlation_score);
    println!("  Consistency: {:>5.1}/25", full.consistency_score);
    println!("  Total:       {:>5.1}/100, {}", full.final_score, full.tier);
    println!();

    println!("FINDINGS");
    println!("{}", "-".repeat(40));
    print_list("Non-normal columns", &report.non_normal_columns);
    print_list("Columns with >=5% outliers", &report.high_outlier_columns);
    print_list("High VIF columns", &report.high_vif_columns);
    for anomaly in &report.domain_anomalies {
        println!(
            "  - {} vs {}: r = {:.3} ({})",
            anomaly.column_a, anomaly.column_b, anomaly.coefficient, anomaly.description
        );
    }
    for issue in &report.consistency_issues {
        println!("  - {}", issue.description);
    }
    println!();

    println!("CLEANING SEARCH");
    println!("{}", "-".repeat(40));
    println!(
        "  {:<22} {:>8} {:>9} {:>6} {:>7}",
        "Configuration", "Removed", "Loss %", "Loss", "Score"
    );
    for config in &report.configurations {
        println!(
            "{} {:<22} {:>8} {:>9.2} {:>6} {:>7.1}",
            if config.selected { "*" } else { " " },
            config.label,
            config.rows_removed,
            config.data_loss_pct,
            config.loss_score,
            config.final_score
        );
    }
    println!();

    if let (Some(best), Some(clean), Some(improvement)) = (
        report.best_config.as_ref(),
        report.clean_scores.as_ref(),
        report.score_improvement,
    ) {
        println!("BEST CONFIGURATION: {}", best);
        println!("{}", "-".repeat(40));
        if let (Some(loss), Some(level)) = (report.data_loss_pct, report.loss_level) {
            println!("  Data loss: {:.2}% ({})", loss, level);
        }
        println!("  Cleaned score: {:.1}/100, {}", clean.final_score, clean.tier);
        println!("  Improvement: {:+.1} points", improvement);
        if let Some(verdict) = report.verdict {
            println!("  Verdict: {}", verdict);
        }

        if let Some(ref comparison) = report.comparison {
            println!();
            println!(
                "  {:<20} {:>10} {:>10} {:>9} {:>9}",
                "Column", "Mean", "Cleaned", "Mean %", "Std %"
            );
            for column in &comparison.columns {
                println!(
                    "  {:<20} {:>10.3} {:>10.3} {:>+9.2} {:>+9.2}",
                    truncate_str(&column.column, 19),
                    column.mean_before,
                    column.mean_after,
                    column.mean_change_pct,
                    column.std_change_pct
                );
            }
        }

        let shifts: Vec<String> = report
            .correlation_shifts
            .iter()
            .filter(|s| s.change != 0)
            .map(|s| format!("{} {:+}", s.category.as_str(), s.change))
            .collect();
        if !shifts.is_empty() {
            println!();
            println!("  Correlation shifts: {}", shifts.join(", "));
        }
        println!();
    }

    println!("Completed in {} ms", report.duration_ms);
}

fn print_list(label: &str, items: &[String]) {
    if items.is_empty() {
        println!("  {}: none", label);
    } else {
        println!("  {}: {}", label, items.join(", "));
    }
}

fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
