//! End-of-run summary, JSON export and pass/fail thresholds.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;
use strum::IntoEnumIterator;
use uuid::Uuid;

use crate::checks::CheckTally;
use crate::config::SmokeConfig;
use crate::error::SmokeError;
use crate::metrics::{DurationStats, Endpoint, RecordedRun};

/// Process exit code when at least one threshold is breached.
pub const THRESHOLD_EXIT_CODE: u8 = 99;

#[derive(Debug, Clone, Serialize)]
pub struct CheckSummary {
    pub name: String,
    pub passes: u64,
    pub fails: u64,
    pub rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EndpointSummary {
    pub endpoint: Endpoint,
    pub requests: usize,
    pub failed: usize,
    /// Responses per status code; transport failures are keyed `"error"`.
    pub statuses: Vec<(String, u64)>,
    pub duration: DurationStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed_secs: f64,
    pub vus: u32,
    pub cancelled: bool,
    pub checks: Vec<CheckSummary>,
    pub checks_total: CheckTally,
    pub http_reqs: usize,
    pub http_req_failed: usize,
    pub http_req_duration: DurationStats,
    pub endpoints: Vec<EndpointSummary>,
    pub iterations: u64,
    pub interrupted_iterations: u64,
}

impl Summary {
    pub fn new(
        run: RecordedRun,
        vus: u32,
        started_at: DateTime<Utc>,
        elapsed: Duration,
        cancelled: bool,
    ) -> Self {
        let checks = run
            .checks
            .iter()
            .map(|(name, tally)| CheckSummary {
                name: name.to_string(),
                passes: tally.passes,
                fails: tally.fails,
                rate: tally.pass_rate(),
            })
            .collect();

        let all: Vec<Duration> = run.samples.iter().map(|s| s.duration).collect();

        let endpoints = Endpoint::iter()
            .filter_map(|endpoint| {
                let samples: Vec<_> = run.samples.iter().filter(|s| s.endpoint == endpoint).collect();
                if samples.is_empty() {
                    return None;
                }

                let mut statuses: Vec<(String, u64)> = Vec::new();
                for sample in &samples {
                    let key = sample
                        .status
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "error".to_string());
                    match statuses.iter_mut().find(|(k, _)| *k == key) {
                        Some((_, count)) => *count += 1,
                        None => statuses.push((key, 1)),
                    }
                }
                statuses.sort();

                let durations: Vec<Duration> = samples.iter().map(|s| s.duration).collect();
                Some(EndpointSummary {
                    endpoint,
                    requests: samples.len(),
                    failed: samples.iter().filter(|s| s.failed()).count(),
                    statuses,
                    duration: DurationStats::from_durations(&durations),
                })
            })
            .collect();

        Self {
            run_id: Uuid::new_v4(),
            started_at,
            finished_at: Utc::now(),
            elapsed_secs: elapsed.as_secs_f64(),
            vus,
            cancelled,
            checks,
            checks_total: run.checks.total(),
            http_reqs: run.samples.len(),
            http_req_failed: run.samples.iter().filter(|s| s.failed()).count(),
            http_req_duration: DurationStats::from_durations(&all),
            endpoints,
            iterations: run.iterations,
            interrupted_iterations: run.interrupted_iterations,
        }
    }

    fn per_second(&self, count: f64) -> f64 {
        if self.elapsed_secs > 0.0 {
            count / self.elapsed_secs
        } else {
            0.0
        }
    }
}

fn fmt_stats(stats: &DurationStats) -> String {
    format!(
        "avg={:.2}ms min={:.2}ms med={:.2}ms max={:.2}ms p(90)={:.2}ms p(95)={:.2}ms",
        stats.avg_ms, stats.min_ms, stats.med_ms, stats.max_ms, stats.p90_ms, stats.p95_ms
    )
}

fn fmt_rate(rate: f64) -> String {
    format!("{:.2}%", rate * 100.0)
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        for check in &self.checks {
            if check.fails == 0 {
                writeln!(f, "     ✓ {}", check.name)?;
            } else {
                writeln!(f, "     ✗ {}", check.name)?;
                writeln!(
                    f,
                    "      ↳  {:.0}% - ✓ {} / ✗ {}",
                    check.rate * 100.0,
                    check.passes,
                    check.fails
                )?;
            }
        }
        writeln!(f)?;

        let total = self.checks_total;
        writeln!(
            f,
            "     {:.<32}: {} ✓ {} ✗ {}",
            "checks",
            fmt_rate(total.pass_rate()),
            total.passes,
            total.fails
        )?;
        writeln!(
            f,
            "     {:.<32}: {}",
            "http_req_duration",
            fmt_stats(&self.http_req_duration)
        )?;
        for endpoint in &self.endpoints {
            writeln!(
                f,
                "       {:.<30}: {}",
                format!("{{ endpoint:{} }}", endpoint.endpoint),
                fmt_stats(&endpoint.duration)
            )?;
        }

        let failed_rate = match self.http_reqs {
            0 => 0.0,
            n => self.http_req_failed as f64 / n as f64,
        };
        writeln!(
            f,
            "     {:.<32}: {} ✓ {} ✗ {}",
            "http_req_failed",
            fmt_rate(failed_rate),
            self.http_req_failed,
            self.http_reqs - self.http_req_failed
        )?;
        writeln!(
            f,
            "     {:.<32}: {} {:.2}/s",
            "http_reqs",
            self.http_reqs,
            self.per_second(self.http_reqs as f64)
        )?;
        writeln!(
            f,
            "     {:.<32}: {} {:.2}/s",
            "iterations",
            self.iterations,
            self.per_second(self.iterations as f64)
        )?;
        if self.interrupted_iterations > 0 {
            writeln!(
                f,
                "     {:.<32}: {}",
                "iterations_interrupted", self.interrupted_iterations
            )?;
        }
        writeln!(f, "     {:.<32}: {}", "vus", self.vus)?;
        write!(
            f,
            "     {:.<32}: {:.1}s{}",
            "run_duration",
            self.elapsed_secs,
            if self.cancelled { " (cancelled)" } else { "" }
        )
    }
}

/// Config as recorded in the export. Credentials are left out.
#[derive(Debug, Serialize)]
struct ConfigSnapshot<'a> {
    booking_base_url: &'a str,
    availability_base_url: &'a str,
    room_id: &'a str,
    start_date: NaiveDate,
    end_date: NaiveDate,
    vus: u32,
    duration_secs: u64,
    pause_ms: u64,
    graceful_stop_secs: u64,
    request_timeout_secs: u64,
    checks_rate_min: Option<f64>,
}

impl<'a> From<&'a SmokeConfig> for ConfigSnapshot<'a> {
    fn from(cfg: &'a SmokeConfig) -> Self {
        Self {
            booking_base_url: &cfg.booking_base_url,
            availability_base_url: &cfg.availability_base_url,
            room_id: &cfg.room_id,
            start_date: cfg.start_date,
            end_date: cfg.end_date,
            vus: cfg.vus,
            duration_secs: cfg.duration_secs,
            pause_ms: cfg.pause_ms,
            graceful_stop_secs: cfg.graceful_stop_secs,
            request_timeout_secs: cfg.request_timeout_secs,
            checks_rate_min: cfg.checks_rate_min,
        }
    }
}

#[derive(Debug, Serialize)]
struct SummaryExport<'a> {
    config: ConfigSnapshot<'a>,
    #[serde(flatten)]
    summary: &'a Summary,
}

/// Write the summary and the config it ran with as pretty JSON.
pub fn write_json(summary: &Summary, cfg: &SmokeConfig, path: &Path) -> Result<(), SmokeError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let export = SummaryExport {
        config: ConfigSnapshot::from(cfg),
        summary,
    };
    fs::write(path, serde_json::to_string_pretty(&export)?)?;
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct Thresholds {
    pub checks_rate_min: Option<f64>,
}

impl From<&SmokeConfig> for Thresholds {
    fn from(cfg: &SmokeConfig) -> Self {
        Self {
            checks_rate_min: cfg.checks_rate_min,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdBreach {
    pub metric: &'static str,
    pub condition: String,
    pub actual: f64,
}

impl fmt::Display for ThresholdBreach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} (actual {:.4})", self.metric, self.condition, self.actual)
    }
}

impl Thresholds {
    pub fn evaluate(&self, summary: &Summary) -> Vec<ThresholdBreach> {
        let mut breaches = Vec::new();

        if let Some(min) = self.checks_rate_min {
            let actual = summary.checks_total.pass_rate();
            if actual < min {
                breaches.push(ThresholdBreach {
                    metric: "checks",
                    condition: format!("rate>={}", min),
                    actual,
                });
            }
        }

        breaches
    }
}

/// Process exit status for a finished run: success unless a threshold broke.
/// Failed checks alone never fail the run.
pub fn exit_status(breaches: &[ThresholdBreach]) -> u8 {
    if breaches.is_empty() {
        0
    } else {
        THRESHOLD_EXIT_CODE
    }
}
