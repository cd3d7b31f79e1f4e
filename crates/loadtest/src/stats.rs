//! Per-request statistics of a finished run.
//!
//! Goose keeps response times as a histogram: exact milliseconds for fast
//! requests, wider buckets for slow ones. Memory stays flat however long the
//! run, and percentiles are read straight off the buckets.

use std::collections::BTreeMap;
use std::fmt;

use goose::metrics::{GooseRequestMetricAggregate, GooseRequestMetricTimingData};
use goose::prelude::*;
use serde::Serialize;

/// HTTP methods the shop profiles use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    /// The matching method, if the profiles ever send it.
    #[must_use]
    pub const fn from_goose(method: &GooseMethod) -> Option<Self> {
        match method {
            GooseMethod::Get => Some(Self::Get),
            GooseMethod::Post => Some(Self::Post),
            _ => None,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => f.write_str("GET"),
            Self::Post => f.write_str("POST"),
        }
    }
}

/// Statistics of one named request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryStats {
    pub method: HttpMethod,
    pub name: String,
    pub requests: usize,
    pub failures: usize,
    pub min_ms: usize,
    pub max_ms: usize,
    pub avg_ms: f64,
    pub p50_ms: usize,
    pub p95_ms: usize,
    pub p99_ms: usize,
}

impl EntryStats {
    fn from_aggregate(method: HttpMethod, aggregate: &GooseRequestMetricAggregate) -> Self {
        let times = &aggregate.raw_data;
        Self {
            method,
            name: aggregate.path.clone(),
            requests: aggregate.success_count + aggregate.fail_count,
            failures: aggregate.fail_count,
            min_ms: times.minimum_time,
            max_ms: times.maximum_time,
            avg_ms: average(times),
            p50_ms: percentile(&times.times, 0.50),
            p95_ms: percentile(&times.times, 0.95),
            p99_ms: percentile(&times.times, 0.99),
        }
    }
}

/// A failure message and how often it was seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureStats {
    pub method: HttpMethod,
    pub name: String,
    pub message: String,
    pub occurrences: usize,
}

/// Statistics of every named request of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunStats {
    /// Sorted by name, then method.
    pub entries: Vec<EntryStats>,
    /// Most frequent first.
    pub failures: Vec<FailureStats>,
}

impl RunStats {
    /// Collect the request and error tables of a goose run.
    #[must_use]
    pub fn from_metrics(metrics: &GooseMetrics) -> Self {
        let mut entries: Vec<EntryStats> = metrics
            .requests
            .values()
            .filter_map(|aggregate| {
                HttpMethod::from_goose(&aggregate.method)
                    .map(|method| EntryStats::from_aggregate(method, aggregate))
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name).then(a.method.cmp(&b.method)));

        // Goose logs the original status of requests a check later accepted;
        // only requests that ended up failed are reported.
        let failed: BTreeMap<(HttpMethod, &str), usize> = entries
            .iter()
            .map(|entry| ((entry.method, entry.name.as_str()), entry.failures))
            .collect();
        let mut failures: Vec<FailureStats> = metrics
            .errors
            .values()
            .filter_map(|error| {
                let method = HttpMethod::from_goose(&error.method)?;
                let failed = failed.get(&(method, error.name.as_str())).copied()?;
                (failed > 0).then(|| FailureStats {
                    method,
                    name: error.name.clone(),
                    message: error.error.clone(),
                    occurrences: error.occurrences.min(failed),
                })
            })
            .collect();
        failures.sort_by(|a, b| {
            b.occurrences
                .cmp(&a.occurrences)
                .then_with(|| a.name.cmp(&b.name))
        });

        Self { entries, failures }
    }

    /// The entry for `name`, whatever its method.
    #[must_use]
    pub fn entry(&self, name: &str) -> Option<&EntryStats> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// The entry for `method` and `name`.
    #[must_use]
    pub fn entry_for(&self, method: HttpMethod, name: &str) -> Option<&EntryStats> {
        self.entries
            .iter()
            .find(|entry| entry.method == method && entry.name == name)
    }

    #[must_use]
    pub fn total_requests(&self) -> usize {
        self.entries.iter().map(|entry| entry.requests).sum()
    }

    #[must_use]
    pub fn total_failures(&self) -> usize {
        self.entries.iter().map(|entry| entry.failures).sum()
    }
}

#[allow(clippy::cast_precision_loss)] // Millisecond totals stay far below 2^52
fn average(times: &GooseRequestMetricTimingData) -> f64 {
    if times.counter == 0 {
        0.0
    } else {
        times.total_time as f64 / times.counter as f64
    }
}

/// Nearest-rank percentile over a `time -> count` histogram.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn percentile(histogram: &BTreeMap<usize, usize>, quantile: f64) -> usize {
    let total: usize = histogram.values().sum();
    if total == 0 {
        return 0;
    }
    let rank = ((quantile * total as f64).ceil() as usize).clamp(1, total);
    let mut seen = 0;
    for (time, count) in histogram {
        seen += count;
        if seen >= rank {
            return *time;
        }
    }
    histogram.keys().next_back().copied().unwrap_or_default()
}
