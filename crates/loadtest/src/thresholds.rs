//! Response-time targets checked after a run.

use std::fmt;

use serde::Serialize;

use crate::stats::RunStats;

/// Upper bound for the 95th percentile response time of a named request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Threshold {
    pub name: String,
    pub p95_ms: usize,
}

impl Threshold {
    #[must_use]
    pub fn new(name: impl Into<String>, p95_ms: usize) -> Self {
        Self {
            name: name.into(),
            p95_ms,
        }
    }
}

/// A request whose p95 exceeded its threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThresholdBreach {
    pub name: String,
    pub limit_ms: usize,
    pub actual_ms: usize,
}

impl fmt::Display for ThresholdBreach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: p95 {}ms exceeds {}ms",
            self.name, self.actual_ms, self.limit_ms
        )
    }
}

/// Expected p95 response times for the named requests of the built-in
/// profiles.
#[must_use]
pub fn default_thresholds() -> Vec<Threshold> {
    [
        ("Browse Products", 500),
        ("View Product Details", 300),
        ("Browse Categories", 200),
        ("Create Order", 1000),
        ("Browse Orders", 500),
        ("View Order Details", 300),
        ("Register User", 1500),
        ("User Login", 800),
        ("Get User Profile", 300),
    ]
    .into_iter()
    .map(|(name, p95_ms)| Threshold::new(name, p95_ms))
    .collect()
}

/// Compare each threshold with every entry of that name.
///
/// Entries without samples and names that never ran are skipped.
#[must_use]
pub fn evaluate_thresholds(stats: &RunStats, thresholds: &[Threshold]) -> Vec<ThresholdBreach> {
    thresholds
        .iter()
        .flat_map(|threshold| {
            stats
                .entries
                .iter()
                .filter(move |entry| entry.name == threshold.name && entry.requests > 0)
                .filter(move |entry| entry.p95_ms > threshold.p95_ms)
                .map(move |entry| ThresholdBreach {
                    name: threshold.name.clone(),
                    limit_ms: threshold.p95_ms,
                    actual_ms: entry.p95_ms,
                })
        })
        .collect()
}
