//! Virtual-user scheduler: N concurrent loops for a fixed duration.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::SmokeConfig;
use crate::metrics::Recorder;
use crate::report::Summary;
use crate::scenario::Scenario;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub vus: u32,
    pub duration: Duration,
    pub pause: Duration,
    /// Extra time in-flight iterations get once the run is over.
    pub graceful_stop: Duration,
}

impl From<&SmokeConfig> for RunOptions {
    fn from(cfg: &SmokeConfig) -> Self {
        Self {
            vus: cfg.vus,
            duration: cfg.duration(),
            pause: cfg.pause(),
            graceful_stop: cfg.graceful_stop(),
        }
    }
}

/// Run `scenario` with `options.vus` virtual users until the duration elapses
/// or `cancel` fires. Always returns within `duration + graceful_stop`.
pub async fn run<S>(scenario: Arc<S>, options: RunOptions, cancel: CancellationToken) -> Summary
where
    S: Scenario + 'static,
{
    let recorder = Arc::new(Recorder::new());
    let started_at = Utc::now();
    let start = Instant::now();
    let deadline = start + options.duration;
    let stop = cancel.child_token();

    info!(
        vus = options.vus,
        duration_secs = options.duration.as_secs_f64(),
        pause_ms = options.pause.as_millis() as u64,
        "starting virtual users"
    );

    let mut vus = JoinSet::new();
    for vu in 1..=options.vus {
        vus.spawn(virtual_user(
            vu,
            Arc::clone(&scenario),
            Arc::clone(&recorder),
            options.pause,
            stop.clone(),
        ));
    }

    tokio::select! {
        _ = tokio::time::sleep_until(deadline) => {
            debug!("run duration elapsed");
            stop.cancel();
        }
        _ = stop.cancelled() => {
            warn!(elapsed_ms = start.elapsed().as_millis() as u64, "run cancelled before duration elapsed");
        }
    }

    let grace = tokio::time::sleep(options.graceful_stop);
    tokio::pin!(grace);

    loop {
        tokio::select! {
            joined = vus.join_next() => match joined {
                None => break,
                Some(Ok(())) => {}
                Some(Err(e)) if e.is_panic() => error!(error = %e, "virtual user panicked"),
                Some(Err(_)) => {}
            },
            _ = &mut grace => {
                warn!(in_flight = vus.len(), "graceful stop expired, interrupting iterations");
                vus.abort_all();
                while let Some(joined) = vus.join_next().await {
                    if matches!(joined, Err(ref e) if e.is_cancelled()) {
                        recorder.record_interrupted();
                    }
                }
                break;
            }
        }
    }

    let elapsed = start.elapsed();
    let summary = Summary::new(
        recorder.snapshot(),
        options.vus,
        started_at,
        elapsed,
        cancel.is_cancelled(),
    );

    info!(
        iterations = summary.iterations,
        interrupted = summary.interrupted_iterations,
        http_reqs = summary.http_reqs,
        elapsed_ms = elapsed.as_millis() as u64,
        "run finished"
    );

    summary
}

async fn virtual_user<S>(
    vu: u32,
    scenario: Arc<S>,
    recorder: Arc<Recorder>,
    pause: Duration,
    stop: CancellationToken,
) where
    S: Scenario + 'static,
{
    let mut iteration: u64 = 0;

    while !stop.is_cancelled() {
        let outcome = scenario.iteration(vu, iteration).await;
        recorder.record_iteration(outcome);
        iteration += 1;

        tokio::select! {
            _ = tokio::time::sleep(pause) => {}
            _ = stop.cancelled() => break,
        }
    }

    debug!(vu, iterations = iteration, "virtual user stopped");
}
