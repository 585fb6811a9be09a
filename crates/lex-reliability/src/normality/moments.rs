//! Moment-based normality test (Jarque-Bera).

use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Jarque-Bera statistic and its χ²(2) p-value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JarqueBera {
    pub statistic: f64,
    pub p_value: f64,
}

/// Population skewness and kurtosis (not excess), `None` for zero variance.
fn shape_moments(values: &[f64]) -> Option<(f64, f64)> {
    let n = values.len() as f64;
    let mean = crate::utils::mean(values)?;
    let (m2, m3, m4) = values.iter().fold((0.0, 0.0, 0.0), |(m2, m3, m4), v| {
        let d = v - mean;
        let d2 = d * d;
        (m2 + d2, m3 + d2 * d, m4 + d2 * d2)
    });
    let (m2, m3, m4) = (m2 / n, m3 / n, m4 / n);
    if m2 <= 0.0 {
        return None;
    }
    Some((m3 / m2.powf(1.5), m4 / (m2 * m2)))
}

/// Run the test. Both fields are NaN when the sample has no spread.
pub fn jarque_bera(values: &[f64]) -> JarqueBera {
    let undefined = JarqueBera {
        statistic: f64::NAN,
        p_value: f64::NAN,
    };
    let Some((skewness, kurtosis)) = shape_moments(values) else {
        return undefined;
    };
    let Ok(chi2) = ChiSquared::new(2.0) else {
        return undefined;
    };

    let n = values.len() as f64;
    let excess = kurtosis - 3.0;
    let statistic = n / 6.0 * (skewness * skewness + excess * excess / 4.0);
    JarqueBera {
        statistic,
        p_value: chi2.sf(statistic),
    }
}
