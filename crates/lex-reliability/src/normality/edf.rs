//! Empirical-distribution normality tests: Kolmogorov-Smirnov and
//! Anderson-Darling, both against a normal law fitted with the sample's own
//! mean and sample standard deviation.

use crate::utils::{mean, sorted, std_dev};
use statrs::distribution::{ContinuousCDF, Normal};
use std::f64::consts::PI;

/// Anderson-Darling critical value at the 5% level, before the
/// small-sample adjustment.
const AD_CRITICAL_5PCT: f64 = 0.787;

/// Kolmogorov-Smirnov statistic and p-value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KolmogorovSmirnov {
    pub statistic: f64,
    pub p_value: f64,
}

/// Anderson-Darling statistic with its 5% critical value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AndersonDarling {
    pub statistic: f64,
    pub critical_value: f64,
}

impl AndersonDarling {
    /// Whether the sample passes at the 5% level.
    pub fn passes(&self) -> bool {
        self.statistic < self.critical_value
    }
}

/// Fitted N(mean, sd), `None` when the spread is zero or undefined.
fn fitted_normal(values: &[f64]) -> Option<Normal> {
    let mu = mean(values)?;
    let sd = std_dev(values, 1)?;
    if sd > 0.0 && sd.is_finite() {
        Normal::new(mu, sd).ok()
    } else {
        None
    }
}

/// Two-sided KS test. Undefined (NaN) for a zero-variance sample.
pub fn kolmogorov_smirnov(values: &[f64]) -> KolmogorovSmirnov {
    let Some(normal) = fitted_normal(values) else {
        return KolmogorovSmirnov {
            statistic: f64::NAN,
            p_value: f64::NAN,
        };
    };

    let x = sorted(values);
    let n = x.len() as f64;
    let statistic = x
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let cdf = normal.cdf(v);
            let d_plus = (i as f64 + 1.0) / n - cdf;
            let d_minus = cdf - i as f64 / n;
            d_plus.max(d_minus)
        })
        .fold(0.0, f64::max);

    let sqrt_n = n.sqrt();
    let lambda = (sqrt_n + 0.12 + 0.11 / sqrt_n) * statistic;
    KolmogorovSmirnov {
        statistic,
        p_value: kolmogorov_sf(lambda),
    }
}

/// Survival function of the Kolmogorov distribution.
fn kolmogorov_sf(lambda: f64) -> f64 {
    if lambda <= 0.0 {
        return 1.0;
    }
    if lambda < 1.18 {
        // The alternating series converges slowly here; use the dual form.
        let factor = (2.0 * PI).sqrt() / lambda;
        let exponent = -PI * PI / (8.0 * lambda * lambda);
        let cdf: f64 = (1..=20)
            .map(|k| {
                let odd = (2 * k - 1) as f64;
                (odd * odd * exponent).exp()
            })
            .sum::<f64>()
            * factor;
        return (1.0 - cdf).clamp(0.0, 1.0);
    }

    let mut sum = 0.0;
    let mut sign = 1.0;
    for k in 1..=100 {
        let kf = k as f64;
        let term = (-2.0 * kf * kf * lambda * lambda).exp();
        sum += sign * term;
        if term < 1e-16 {
            break;
        }
        sign = -sign;
    }
    (2.0 * sum).clamp(0.0, 1.0)
}

/// Anderson-Darling A² for normality. The statistic is NaN for a
/// zero-variance sample, which never passes.
pub fn anderson_darling(values: &[f64]) -> AndersonDarling {
    let n = values.len() as f64;
    let critical_value = AD_CRITICAL_5PCT / (1.0 + 4.0 / n - 25.0 / (n * n));

    let Some(normal) = fitted_normal(values) else {
        return AndersonDarling {
            statistic: f64::NAN,
            critical_value,
        };
    };

    let x = sorted(values);
    let len = x.len();
    let weighted: f64 = (0..len)
        .map(|i| {
            let log_cdf = normal.cdf(x[i]).ln();
            let log_sf = normal.sf(x[len - 1 - i]).ln();
            (2.0 * (i as f64 + 1.0) - 1.0) / n * (log_cdf + log_sf)
        })
        .sum();

    AndersonDarling {
        statistic: -n - weighted,
        critical_value,
    }
}
