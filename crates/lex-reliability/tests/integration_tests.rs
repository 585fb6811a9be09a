//! Integration tests for the reliability engine.
//!
//! These tests exercise the public API end to end: the analyzers, the scorer,
//! the cleaning search and the full pipeline.

use lex_reliability::outliers::outlier_mask;
use lex_reliability::utils::{column_values, numeric_column_names};
use lex_reliability::{
    AnalysisStage, CleaningConfig, CleaningOrchestrator, ConsistencyChecker, ConsistencyRule,
    CorrelationAnalyzer, CorrelationCategory, OutlierDetector, OutlierMethod, RecommendationTier,
    ReliabilityAnalyzer, ReliabilityConfig, ReliabilityPipeline, ReliabilityScorer,
    ReportGenerator, SearchState, remove_outliers,
};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use proptest::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_csv(filename: &str) -> DataFrame {
    let path = fixtures_path().join(filename);
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path))
        .expect("Failed to create CSV reader")
        .finish()
        .expect("Failed to read CSV file")
}

fn spiked_fares() -> DataFrame {
    df!["fare_amount" => [10.0, 12.0, 11.0, 13.0, 9.0, 10.0, 500.0]].unwrap()
}

fn flagged_rows(mask: &[bool]) -> Vec<usize> {
    mask.iter()
        .enumerate()
        .filter(|(_, f)| **f)
        .map(|(i, _)| i)
        .collect()
}

fn single_config(method: OutlierMethod, threshold: f64) -> ReliabilityConfig {
    ReliabilityConfig::builder()
        .cleaning_methods(vec![method])
        .cleaning_thresholds(vec![threshold])
        .build()
        .unwrap()
}

// ============================================================================
// Fare Spike Scenario
// ============================================================================

#[test]
fn test_fare_spike_flagged_by_robust_methods() {
    let values: Vec<Option<f64>> = [10.0, 12.0, 11.0, 13.0, 9.0, 10.0, 500.0]
        .into_iter()
        .map(Some)
        .collect();

    let iqr = outlier_mask(&values, OutlierMethod::Iqr, 1.5).unwrap();
    assert_eq!(flagged_rows(&iqr), vec![6]);

    let modified = outlier_mask(&values, OutlierMethod::ModifiedZScore, 3.5).unwrap();
    assert_eq!(flagged_rows(&modified), vec![6]);
}

#[test]
fn test_fare_spike_zscore_limited_by_sample_size() {
    // Seven values cap the population z-score at sqrt(6) ~ 2.449 and the
    // lone spike sits close to that cap, so only lower thresholds flag it.
    let values: Vec<Option<f64>> = [10.0, 12.0, 11.0, 13.0, 9.0, 10.0, 500.0]
        .into_iter()
        .map(Some)
        .collect();

    let conventional = outlier_mask(&values, OutlierMethod::ZScore, 3.0).unwrap();
    assert!(flagged_rows(&conventional).is_empty());

    for threshold in [1.5, 2.0] {
        let mask = outlier_mask(&values, OutlierMethod::ZScore, threshold).unwrap();
        assert_eq!(flagged_rows(&mask), vec![6], "threshold {}", threshold);
    }

    let loose = outlier_mask(&values, OutlierMethod::ZScore, 2.5).unwrap();
    assert!(flagged_rows(&loose).is_empty());
}

#[test]
fn test_fare_spike_cleaning_loses_one_row() {
    let cleaned = remove_outliers(&spiked_fares(), CleaningConfig::new(OutlierMethod::Iqr, 1.5))
        .unwrap();

    assert_eq!(cleaned.data.height(), 6);
    assert_eq!(cleaned.rows_removed(), 1);
    assert!((cleaned.data_loss_pct() - 100.0 / 7.0).abs() < 1e-9);
    assert_eq!(format!("{:.2}", cleaned.data_loss_pct()), "14.29");
}

#[test]
fn test_fare_spike_outlier_profile() {
    let results = OutlierDetector::analyze(&spiked_fares()).unwrap();
    assert_eq!(results.len(), 1);

    let fare = &results[0];
    assert_eq!(fare.iqr.count, 1);
    assert_eq!(fare.zscore.count, 0);
    assert_eq!(fare.modified_zscore.map(|s| s.count), Some(1));
    assert!((fare.average_percentage - (2.0 * 100.0 / 7.0) / 3.0).abs() < 1e-9);
}

// ============================================================================
// Scoring Scenarios
// ============================================================================

#[test]
fn test_very_high_correlation_costs_five_points() {
    let df = df![
        "x" => [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0],
        "y" => [2.0, 1.0, 4.0, 3.0, 7.0, 4.0, 6.0, 9.0],
    ]
    .unwrap();

    let correlation = CorrelationAnalyzer::new(false).analyze(&df).unwrap();
    assert_eq!(correlation.pairs.len(), 1);
    let pair = &correlation.pairs[0];
    assert!((pair.coefficient - 0.851).abs() < 1e-3);
    assert_eq!(pair.category, CorrelationCategory::VeryHigh);
    assert_eq!(correlation.high_correlations.len(), 1);

    let report = ReliabilityScorer::score(&ReliabilityAnalyzer::default().analyze(&df).unwrap());
    assert_eq!(report.very_high_correlations, 1);
    assert_eq!(report.correlation_score, 20.0);
}

#[test]
fn test_four_consistency_issues_score_thirteen() {
    let df = df![
        "fare_amount" => [12.0, 15.5, -4.0, 9.0, 22.0, 18.0],
        "distance" => [3.1, -0.5, 2.2, 1.8, 6.0, 4.4],
        "duration" => [14.0, 21.0, 9.0, -2.0, 30.0, 19.0],
        "tip_amount" => [1.0, 2.5, 0.5, 1.5, -1.0, 3.0],
    ]
    .unwrap();

    let issues = ConsistencyChecker::check(&df).unwrap();
    assert_eq!(issues.len(), 4);
    assert!(issues.iter().all(|i| i.rule == ConsistencyRule::NegativeValues));

    let report = ReliabilityScorer::score(&ReliabilityAnalyzer::default().analyze(&df).unwrap());
    assert_eq!(report.consistency_issues, 4);
    assert_eq!(report.consistency_score, 13.0);
}

#[test]
fn test_no_numeric_columns_scores_zero() {
    let df = df![
        "trip_id" => ["T1", "T2", "T3", "T4"],
        "vehicle_type" => ["UberX", "Black", "UberX", "Comfort"],
    ]
    .unwrap();

    let report = ReliabilityScorer::score(&ReliabilityAnalyzer::default().analyze(&df).unwrap());
    assert_eq!(report.normality_score, 0.0);
    assert_eq!(report.outlier_score, 0.0);
    assert_eq!(report.correlation_score, 0.0);
    assert_eq!(report.consistency_score, 0.0);
    assert_eq!(report.final_score, 0.0);
    assert_eq!(report.tier, RecommendationTier::Poor);

    let result = ReliabilityPipeline::builder().build().unwrap().run(&df).unwrap();
    assert_eq!(result.search.outcomes.len(), 9);
    assert!(result.search.outcomes.iter().all(|o| o.rows_removed == 0));
}

// ============================================================================
// Cleaning Search Tests
// ============================================================================

#[test]
fn test_single_configuration_matches_manual_cleaning() {
    let df = load_csv("trips_sample.csv");
    let config = single_config(OutlierMethod::Iqr, 1.5);

    let mut orchestrator = CleaningOrchestrator::new(&config);
    let search = orchestrator.run(&df).unwrap();
    assert_eq!(search.outcomes.len(), 1);
    let outcome = search.best().unwrap();

    // Flag on the original frame, remove the union, then analyze and score.
    let mut removed = vec![false; df.height()];
    for name in numeric_column_names(&df) {
        let values = column_values(&df, &name).unwrap();
        if let Some(mask) = outlier_mask(&values, OutlierMethod::Iqr, 1.5) {
            for (gone, flag) in removed.iter_mut().zip(mask) {
                *gone |= flag;
            }
        }
    }
    let keep: Vec<bool> = removed.iter().map(|gone| !gone).collect();
    let manual = df.filter(&BooleanChunked::from_slice("keep".into(), &keep)).unwrap();

    let analysis = ReliabilityAnalyzer::new(&config).analyze(&manual).unwrap();
    let report = ReliabilityScorer::score(&analysis);

    assert_eq!(outcome.remaining_rows, manual.height());
    assert!(outcome.cleaned.equals_missing(&manual));
    assert_eq!(outcome.report.final_score, report.final_score);
    assert_eq!(outcome.report.tier, report.tier);
}

#[test]
fn test_parallel_search_matches_sequential() {
    let df = load_csv("trips_sample.csv");

    let sequential = ReliabilityConfig::default();
    let parallel = ReliabilityConfig::builder().parallel_grid(true).build().unwrap();

    let a = CleaningOrchestrator::new(&sequential).run(&df).unwrap();
    let b = CleaningOrchestrator::new(&parallel).run(&df).unwrap();

    assert_eq!(a.best_index, b.best_index);
    let labels = |s: &lex_reliability::CleaningSearch| -> Vec<String> {
        s.outcomes.iter().map(|o| o.config.to_string()).collect()
    };
    assert_eq!(labels(&a), labels(&b));
    for (x, y) in a.outcomes.iter().zip(&b.outcomes) {
        assert_eq!(x.rows_removed, y.rows_removed);
        assert_eq!(x.report.final_score, y.report.final_score);
    }
}

#[test]
fn test_search_state_transitions() {
    let mut orchestrator = CleaningOrchestrator::new(&ReliabilityConfig::default());
    assert_eq!(orchestrator.state(), SearchState::Evaluating { total: 9 });

    let search = orchestrator.run(&spiked_fares()).unwrap();
    let best = search.best().map(|o| o.config);
    assert_eq!(orchestrator.state(), SearchState::Done { best });
}

// ============================================================================
// Full Pipeline Tests
// ============================================================================

#[test]
fn test_full_pipeline_trip_sample() {
    let df = load_csv("trips_sample.csv");

    let result = ReliabilityPipeline::builder().build().unwrap().run(&df);
    assert!(result.is_ok(), "Pipeline should complete successfully");
    let result = result.unwrap();

    assert_eq!(result.full_report.summary.observations, 40);
    assert_eq!(result.full_report.summary.numeric_columns, 6);
    assert!((0.0..=100.0).contains(&result.full_report.final_score));

    let issues = result.full_analysis.consistency.as_ref().unwrap();
    assert!(issues.iter().any(|i| {
        i.rule == ConsistencyRule::NegativeValues && i.column == "tip_amount" && i.count == 1
    }));

    let fare = result
        .full_analysis
        .outliers
        .iter()
        .find(|r| r.column == "fare_amount")
        .unwrap();
    assert!(fare.iqr.count >= 1);

    let best = result.best_outcome().unwrap();
    let comparison = result.comparison.as_ref().unwrap();
    assert_eq!(comparison.original_rows, 40);
    assert_eq!(comparison.cleaned_rows, best.remaining_rows);
    assert_eq!(result.correlation_shifts.len(), 5);

    let report = ReportGenerator::build_comprehensive_report("trips_sample.csv", &result);
    assert_eq!(report.best_config, Some(best.config.to_string()));
    assert!(report.consistency_issues.iter().any(|i| i.column == "tip_amount"));
}

#[test]
fn test_pipeline_progress_reporting() {
    let call_count = Arc::new(AtomicUsize::new(0));
    let grid_updates = Arc::new(AtomicUsize::new(0));
    let call_count_clone = call_count.clone();
    let grid_updates_clone = grid_updates.clone();

    let config = ReliabilityConfig::builder()
        .cleaning_methods(vec![OutlierMethod::Iqr, OutlierMethod::ModifiedZScore])
        .cleaning_thresholds(vec![1.5, 3.0])
        .parallel_grid(true)
        .build()
        .unwrap();

    let result = ReliabilityPipeline::builder()
        .config(config)
        .on_progress(move |update| {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
            if update.stage == AnalysisStage::CleaningSearch
                && update.items_processed.is_some_and(|n| n > 0)
            {
                grid_updates_clone.fetch_add(1, Ordering::SeqCst);
            }
        })
        .build()
        .unwrap()
        .run(&spiked_fares());

    assert!(result.is_ok());
    assert_eq!(grid_updates.load(Ordering::SeqCst), 4);
    // initializing, full analysis, scoring, grid start, 4 outcomes, comparison, complete
    assert_eq!(call_count.load(Ordering::SeqCst), 10);
}

#[test]
fn test_pipeline_single_row_dataset() {
    let df = df![
        "fare_amount" => [12.5],
        "distance" => [3.2],
    ]
    .unwrap();

    let result = ReliabilityPipeline::builder().build().unwrap().run(&df).unwrap();

    assert!(result.full_analysis.normality.is_empty());
    assert!(result.full_analysis.outliers.is_empty());
    assert_eq!(result.full_report.normality_score, 0.0);
    assert_eq!(result.full_report.outlier_score, 0.0);
    assert_eq!(result.best_outcome().unwrap().rows_removed, 0);
}

#[test]
fn test_pipeline_rejects_empty_grid() {
    let config = ReliabilityConfig {
        cleaning_methods: Vec::new(),
        ..ReliabilityConfig::default()
    };
    assert!(ReliabilityPipeline::builder().config(config).build().is_err());
}

// ============================================================================
// Property Tests
// ============================================================================

fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let (lo, hi) = (pos.floor() as usize, pos.ceil() as usize);
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

fn column_strategy() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec((-500i32..500).prop_map(f64::from), 5..40)
}

fn two_column_frame() -> impl Strategy<Value = DataFrame> {
    (5usize..30).prop_flat_map(|n| {
        (
            prop::collection::vec((0i32..1000).prop_map(f64::from), n),
            prop::collection::vec((-200i32..200).prop_map(f64::from), n),
        )
            .prop_map(|(fare, tip)| {
                df!["fare_amount" => fare, "tip_amount" => tip].unwrap()
            })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_iqr_count_matches_independent_fences(values in column_strategy()) {
        let mut sorted = values.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let (q1, q3) = (quantile(&sorted, 0.25), quantile(&sorted, 0.75));
        let iqr = q3 - q1;
        let expected = values
            .iter()
            .filter(|&&v| v < q1 - 1.5 * iqr || v > q3 + 1.5 * iqr)
            .count();

        let wrapped: Vec<Option<f64>> = values.iter().copied().map(Some).collect();
        let result = OutlierDetector::detect_values("x", &wrapped).unwrap();
        prop_assert_eq!(result.iqr.count, expected);
    }

    #[test]
    fn prop_cleaning_never_adds_rows(
        df in two_column_frame(),
        method_index in 0usize..3,
        threshold in 0.5f64..4.0,
    ) {
        let method = OutlierMethod::ALL[method_index];
        let cleaned = remove_outliers(&df, CleaningConfig::new(method, threshold)).unwrap();
        prop_assert!(cleaned.data.height() <= df.height());
        prop_assert_eq!(cleaned.original_rows, df.height());
        prop_assert_eq!(cleaned.data.width(), df.width());
    }

    #[test]
    fn prop_tighter_iqr_loses_at_least_as_much(
        df in two_column_frame(),
        low in 0.5f64..2.0,
        gap in 0.0f64..2.0,
    ) {
        let tight = remove_outliers(&df, CleaningConfig::new(OutlierMethod::Iqr, low)).unwrap();
        let loose =
            remove_outliers(&df, CleaningConfig::new(OutlierMethod::Iqr, low + gap)).unwrap();
        prop_assert!(tight.data_loss_pct() >= loose.data_loss_pct());
    }

    #[test]
    fn prop_scores_stay_in_bounds(df in two_column_frame()) {
        let analysis = ReliabilityAnalyzer::default().analyze(&df).unwrap();
        let report = ReliabilityScorer::score(&analysis);
        for component in [
            report.normality_score,
            report.outlier_score,
            report.correlation_score,
            report.consistency_score,
        ] {
            prop_assert!((0.0..=25.0).contains(&component));
        }
        prop_assert!((0.0..=100.0).contains(&report.final_score));
    }
}
