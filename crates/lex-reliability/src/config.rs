//! Configuration for the reliability pipeline.
//!
//! Statistical thresholds (test significance, scoring weights, tier cut-offs)
//! are fixed domain policy and live next to the code that applies them. The
//! configuration only covers the cleaning grid and which optional work to run.

use crate::outliers::OutlierMethod;
use serde::{Deserialize, Serialize};

/// Default cleaning thresholds evaluated for every method.
pub const DEFAULT_CLEANING_THRESHOLDS: [f64; 3] = [1.5, 2.0, 2.5];

/// Configuration for the reliability pipeline.
///
/// Use [`ReliabilityConfig::builder()`] to create a validated configuration.
///
/// # Example
///
/// ```rust,ignore
/// use lex_reliability::config::ReliabilityConfig;
/// use lex_reliability::OutlierMethod;
///
/// let config = ReliabilityConfig::builder()
///     .cleaning_methods(vec![OutlierMethod::Iqr])
///     .cleaning_thresholds(vec![1.5, 3.0])
///     .parallel_grid(true)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReliabilityConfig {
    /// Outlier methods tried by the cleaning grid search.
    /// Default: all three methods
    pub cleaning_methods: Vec<OutlierMethod>,

    /// Thresholds tried for every method.
    /// Default: 1.5, 2.0, 2.5
    pub cleaning_thresholds: Vec<f64>,

    /// Evaluate cleaning configurations on the rayon thread pool.
    /// Default: false
    pub parallel_grid: bool,

    /// Compute variance inflation factors when the capability is compiled in.
    /// Default: true
    pub compute_vif: bool,
}

impl Default for ReliabilityConfig {
    fn default() -> Self {
        Self {
            cleaning_methods: OutlierMethod::ALL.to_vec(),
            cleaning_thresholds: DEFAULT_CLEANING_THRESHOLDS.to_vec(),
            parallel_grid: false,
            compute_vif: true,
        }
    }
}

impl ReliabilityConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ReliabilityConfigBuilder {
        ReliabilityConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.cleaning_methods.is_empty() {
            return Err(ConfigValidationError::EmptyMethods);
        }

        if self.cleaning_thresholds.is_empty() {
            return Err(ConfigValidationError::EmptyThresholds);
        }

        if let Some(&bad) = self
            .cleaning_thresholds
            .iter()
            .find(|t| !t.is_finite() || **t <= 0.0)
        {
            return Err(ConfigValidationError::InvalidThreshold(bad));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("At least one cleaning method is required")]
    EmptyMethods,

    #[error("At least one cleaning threshold is required")]
    EmptyThresholds,

    #[error("Invalid cleaning threshold: {0} (must be a positive finite number)")]
    InvalidThreshold(f64),
}

/// Builder for [`ReliabilityConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct ReliabilityConfigBuilder {
    cleaning_methods: Option<Vec<OutlierMethod>>,
    cleaning_thresholds: Option<Vec<f64>>,
    parallel_grid: Option<bool>,
    compute_vif: Option<bool>,
}

impl ReliabilityConfigBuilder {
    /// Set the outlier methods evaluated by the cleaning grid.
    pub fn cleaning_methods(mut self, methods: Vec<OutlierMethod>) -> Self {
        self.cleaning_methods = Some(methods);
        self
    }

    /// Set the thresholds evaluated for every cleaning method.
    ///
    /// For IQR the threshold multiplies the interquartile range; for the
    /// Z-score methods it bounds the absolute score.
    pub fn cleaning_thresholds(mut self, thresholds: Vec<f64>) -> Self {
        self.cleaning_thresholds = Some(thresholds);
        self
    }

    /// Enable or disable parallel evaluation of the cleaning grid.
    pub fn parallel_grid(mut self, parallel: bool) -> Self {
        self.parallel_grid = Some(parallel);
        self
    }

    /// Enable or disable variance inflation factor reporting.
    pub fn compute_vif(mut self, compute: bool) -> Self {
        self.compute_vif = Some(compute);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `ReliabilityConfig` or an error if validation fails.
    pub fn build(self) -> Result<ReliabilityConfig, ConfigValidationError> {
        let defaults = ReliabilityConfig::default();
        let config = ReliabilityConfig {
            cleaning_methods: self.cleaning_methods.unwrap_or(defaults.cleaning_methods),
            cleaning_thresholds: self
                .cleaning_thresholds
                .unwrap_or(defaults.cleaning_thresholds),
            parallel_grid: self.parallel_grid.unwrap_or(defaults.parallel_grid),
            compute_vif: self.compute_vif.unwrap_or(defaults.compute_vif),
        };

        config.validate()?;
        Ok(config)
    }
}
