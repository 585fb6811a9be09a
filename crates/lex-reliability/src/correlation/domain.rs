//! Domain plausibility rules for trip data.
//!
//! Rules are plain data: each names two column-name fragments and the
//! relationship expected between any columns matching them. Findings are
//! reported only and never enter the reliability score.

use super::matrix::CorrelationMatrix;
use serde::{Deserialize, Serialize};

/// |r| below which an expected positive relationship is too weak.
pub const WEAK_CORRELATION: f64 = 0.1;

/// |r| above which an expected relationship is confirmed.
pub const CONFIRMED_CORRELATION: f64 = 0.3;

/// Relationship a rule expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expectation {
    Positive,
    WeakPositive,
}

impl Expectation {
    /// Whether the rule states a positive relationship.
    pub fn is_positive(self) -> bool {
        matches!(self, Self::Positive | Self::WeakPositive)
    }
}

/// Expected relationship between two column-name fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DomainRule {
    pub fragment_a: &'static str,
    pub fragment_b: &'static str,
    pub expectation: Expectation,
    pub description: &'static str,
}

/// Built-in rules for ride-hailing trips.
pub const TRIP_DOMAIN_RULES: &[DomainRule] = &[
    DomainRule {
        fragment_a: "distance",
        fragment_b: "duration",
        expectation: Expectation::Positive,
        description: "longer trips should take longer",
    },
    DomainRule {
        fragment_a: "distance",
        fragment_b: "fare",
        expectation: Expectation::Positive,
        description: "longer trips should cost more",
    },
    DomainRule {
        fragment_a: "duration",
        fragment_b: "fare",
        expectation: Expectation::Positive,
        description: "longer rides should cost more",
    },
    DomainRule {
        fragment_a: "distance",
        fragment_b: "tip",
        expectation: Expectation::WeakPositive,
        description: "tips may grow slightly with distance",
    },
    DomainRule {
        fragment_a: "fare",
        fragment_b: "tip",
        expectation: Expectation::Positive,
        description: "tips should grow with the fare",
    },
    DomainRule {
        fragment_a: "rating",
        fragment_b: "tip",
        expectation: Expectation::Positive,
        description: "better rated rides should tip more",
    },
];

/// Outcome of one rule on one column pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// Positive relationship expected, negative observed.
    Negative,
    /// Positive relationship expected, |r| below [`WEAK_CORRELATION`].
    TooWeak,
    /// Relationship observed as expected with |r| above [`CONFIRMED_CORRELATION`].
    Confirmed,
}

impl FindingKind {
    pub fn is_anomaly(self) -> bool {
        matches!(self, Self::Negative | Self::TooWeak)
    }
}

/// A rule applied to a concrete pair of columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainFinding {
    pub column_a: String,
    pub column_b: String,
    pub coefficient: f64,
    pub kind: FindingKind,
    pub expectation: Expectation,
    pub description: String,
}

fn classify(expectation: Expectation, r: f64) -> Option<FindingKind> {
    let expects_positive = expectation.is_positive();
    if expects_positive && r < 0.0 {
        Some(FindingKind::Negative)
    } else if expects_positive && r.abs() < WEAK_CORRELATION {
        Some(FindingKind::TooWeak)
    } else if r.abs() > CONFIRMED_CORRELATION {
        Some(FindingKind::Confirmed)
    } else {
        None
    }
}

fn matching_columns<'a>(columns: &'a [String], fragment: &str) -> Vec<&'a String> {
    let fragment = fragment.to_lowercase();
    columns
        .iter()
        .filter(|c| c.to_lowercase().contains(&fragment))
        .collect()
}

/// Apply `rules` to every matching column pair of `matrix`.
///
/// Matching is a case-insensitive substring test; a column never pairs with
/// itself. Undefined coefficients produce no finding.
pub fn check_domain_rules(matrix: &CorrelationMatrix, rules: &[DomainRule]) -> Vec<DomainFinding> {
    let mut findings = Vec::new();
    for rule in rules {
        let left = matching_columns(&matrix.columns, rule.fragment_a);
        let right = matching_columns(&matrix.columns, rule.fragment_b);
        for a in &left {
            for b in &right {
                if a == b {
                    continue;
                }
                let Some(r) = matrix.get(a, b) else {
                    continue;
                };
                if let Some(kind) = classify(rule.expectation, r) {
                    findings.push(DomainFinding {
                        column_a: a.to_string(),
                        column_b: b.to_string(),
                        coefficient: r,
                        kind,
                        expectation: rule.expectation,
                        description: rule.description.to_string(),
                    });
                }
            }
        }
    }
    findings
}
