//! Request samples and the shared recorder every virtual user writes into.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use strum::{AsRefStr, Display, EnumIter};

use crate::checks::Checks;
use crate::scenario::IterationOutcome;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Endpoint {
    Booking,
    Availability,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSample {
    pub endpoint: Endpoint,
    /// `None` when the request never produced a response.
    pub status: Option<u16>,
    pub duration: Duration,
}

impl RequestSample {
    /// Transport failures and 4xx/5xx responses count as failed requests.
    pub fn failed(&self) -> bool {
        match self.status {
            Some(status) => status >= 400,
            None => true,
        }
    }
}

/// Duration statistics in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DurationStats {
    pub count: usize,
    pub min_ms: f64,
    pub avg_ms: f64,
    pub med_ms: f64,
    pub p90_ms: f64,
    pub p95_ms: f64,
    pub max_ms: f64,
}

impl DurationStats {
    pub fn from_durations(durations: &[Duration]) -> Self {
        if durations.is_empty() {
            return Self::default();
        }

        let mut ms: Vec<f64> = durations.iter().map(|d| d.as_secs_f64() * 1000.0).collect();
        ms.sort_by(|a, b| a.total_cmp(b));

        let count = ms.len();
        let mid = count / 2;
        let med_ms = if count % 2 == 0 {
            (ms[mid - 1] + ms[mid]) / 2.0
        } else {
            ms[mid]
        };

        Self {
            count,
            min_ms: ms[0],
            avg_ms: ms.iter().sum::<f64>() / count as f64,
            med_ms,
            p90_ms: nearest_rank(&ms, 90.0),
            p95_ms: nearest_rank(&ms, 95.0),
            max_ms: ms[count - 1],
        }
    }
}

fn nearest_rank(sorted: &[f64], percentile: f64) -> f64 {
    let rank = ((percentile / 100.0) * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

/// Everything recorded during a run, taken once the virtual users are done.
#[derive(Debug, Clone, Default)]
pub struct RecordedRun {
    pub samples: Vec<RequestSample>,
    pub checks: Checks,
    pub iterations: u64,
    pub interrupted_iterations: u64,
}

#[derive(Debug, Default)]
pub struct Recorder {
    inner: Mutex<RecordedRun>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_iteration(&self, outcome: IterationOutcome) {
        let mut run = self.inner.lock();
        for check in &outcome.checks {
            run.checks.record(check);
        }
        run.samples.extend(outcome.samples);
        run.iterations += 1;
    }

    pub fn record_interrupted(&self) {
        self.inner.lock().interrupted_iterations += 1;
    }

    pub fn snapshot(&self) -> RecordedRun {
        self.inner.lock().clone()
    }
}
