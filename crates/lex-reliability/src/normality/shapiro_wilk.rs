//! Shapiro-Wilk W test using Royston's approximation (AS R94).

use statrs::distribution::{ContinuousCDF, Normal};
use std::f64::consts::{FRAC_1_SQRT_2, PI};

/// Largest sample the approximation is calibrated for.
pub const SHAPIRO_MAX_SAMPLE: usize = 5000;

// Royston polynomial coefficients
const C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.07119, 4.434685, -2.706056];
const C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
const C3: [f64; 4] = [0.544, -0.39978, 0.025054, -6.714e-4];
const C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
const C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
const C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];
const G: [f64; 2] = [-2.273, 0.459];

/// Outcome of a Shapiro-Wilk test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapiroWilk {
    pub statistic: f64,
    pub p_value: f64,
}

/// Run the test on `values`. `None` outside the supported size range.
///
/// A zero-range sample is reported as W = 1, p = 1.
pub fn shapiro_wilk(values: &[f64]) -> Option<ShapiroWilk> {
    let n = values.len();
    if !(3..=SHAPIRO_MAX_SAMPLE).contains(&n) {
        return None;
    }

    let x = crate::utils::sorted(values);
    if x[n - 1] - x[0] <= f64::EPSILON * x[n - 1].abs().max(1.0) {
        return Some(ShapiroWilk {
            statistic: 1.0,
            p_value: 1.0,
        });
    }

    if n == 3 {
        return Some(exact_three(&x));
    }

    let normal = Normal::standard();
    let half = n / 2;
    let a = coefficients(&normal, n, half)?;

    let numerator: f64 = (0..half).map(|i| a[i] * (x[n - 1 - i] - x[i])).sum();
    let mean = x.iter().sum::<f64>() / n as f64;
    let ss: f64 = x.iter().map(|v| (v - mean).powi(2)).sum();
    let w = (numerator * numerator / ss).min(1.0);

    Some(ShapiroWilk {
        statistic: w,
        p_value: p_value(&normal, w, n).clamp(0.0, 1.0),
    })
}

fn exact_three(x: &[f64]) -> ShapiroWilk {
    let mean = x.iter().sum::<f64>() / 3.0;
    let ss: f64 = x.iter().map(|v| (v - mean).powi(2)).sum();
    let numerator = FRAC_1_SQRT_2 * (x[2] - x[0]);
    let w = (numerator * numerator / ss).clamp(0.75, 1.0);
    let p = 6.0 / PI * (w.sqrt().asin() - 0.75f64.sqrt().asin());
    ShapiroWilk {
        statistic: w,
        p_value: p.clamp(0.0, 1.0),
    }
}

/// Horner evaluation of `c[0] + c[1] x + c[2] x^2 + ...`.
fn poly(c: &[f64], x: f64) -> f64 {
    c.iter().rev().fold(0.0, |acc, &coef| acc * x + coef)
}

/// Antisymmetric weights for the lower half of the order statistics.
fn coefficients(normal: &Normal, n: usize, half: usize) -> Option<Vec<f64>> {
    let nf = n as f64;
    let m: Vec<f64> = (0..half)
        .map(|i| normal.inverse_cdf((i as f64 + 1.0 - 0.375) / (nf + 0.25)))
        .collect();
    let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / nf.sqrt();

    let a1 = poly(&C1, rsn) - m[0] / ssumm2;
    let mut a = vec![0.0; half];
    a[0] = a1;

    let (fac_sq, one_minus, first_free) = if n > 5 {
        let a2 = poly(&C2, rsn) - m[1] / ssumm2;
        a[1] = a2;
        (
            summ2 - 2.0 * m[0] * m[0] - 2.0 * m[1] * m[1],
            1.0 - 2.0 * a1 * a1 - 2.0 * a2 * a2,
            2,
        )
    } else {
        (summ2 - 2.0 * m[0] * m[0], 1.0 - 2.0 * a1 * a1, 1)
    };

    if fac_sq <= 0.0 || one_minus <= 0.0 {
        return None;
    }
    let fac = (fac_sq / one_minus).sqrt();
    for i in first_free..half {
        a[i] = -m[i] / fac;
    }
    Some(a)
}

fn p_value(normal: &Normal, w: f64, n: usize) -> f64 {
    let nf = n as f64;
    let w1 = 1.0 - w;
    if w1 <= 0.0 {
        return 1.0;
    }
    let y = w1.ln();

    let (z_input, mu, sigma) = if n <= 11 {
        let gamma = poly(&G, nf);
        if y >= gamma {
            return 0.0;
        }
        (-(gamma - y).ln(), poly(&C3, nf), poly(&C4, nf).exp())
    } else {
        let ln_n = nf.ln();
        (y, poly(&C5, ln_n), poly(&C6, ln_n).exp())
    };

    normal.sf((z_input - mu) / sigma)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symmetric_sample_looks_normal() {
        let data = [-1.5, -1.0, -0.5, 0.0, 0.5, 1.0, 1.5];
        let result = shapiro_wilk(&data).unwrap();
        assert!(result.statistic > 0.9);
        assert!(result.p_value > 0.05);
    }

    #[test]
    fn test_single_spike_rejects_normality() {
        let data = [10.0, 12.0, 11.0, 13.0, 9.0, 10.0, 500.0];
        let result = shapiro_wilk(&data).unwrap();
        assert!(result.statistic < 0.7);
        assert!(result.p_value < 0.05);
    }

    #[test]
    fn test_exact_three_point_formula() {
        // Equally spaced: W = 1, p = 1
        let result = shapiro_wilk(&[1.0, 2.0, 3.0]).unwrap();
        assert!((result.statistic - 1.0).abs() < 1e-12);
        assert!((result.p_value - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_size_limits() {
        assert!(shapiro_wilk(&[1.0, 2.0]).is_none());
        let large: Vec<f64> = (0..SHAPIRO_MAX_SAMPLE + 1).map(|i| i as f64).collect();
        assert!(shapiro_wilk(&large).is_none());
    }

    #[test]
    fn test_zero_range_is_perfect_fit() {
        let result = shapiro_wilk(&[4.0, 4.0, 4.0, 4.0]).unwrap();
        assert_eq!(result.statistic, 1.0);
        assert_eq!(result.p_value, 1.0);
    }

    #[test]
    fn test_poly_horner() {
        assert_eq!(poly(&[1.0, 2.0, 3.0], 2.0), 1.0 + 4.0 + 12.0);
    }
}
