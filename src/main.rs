use anyhow::{Context, Result};
use room_smoke::{config, report, runner, scenario, telemetry};
use config::SmokeConfig;
use report::Thresholds;
use scenario::BookingAvailability;
use std::process::ExitCode;
use std::sync::Arc;
use telemetry::init_tracing;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cfg = SmokeConfig::load().context("failed to load smoke configuration")?;

    let scenario = BookingAvailability::new(&cfg).context("failed to build scenario")?;
    info!(
        booking = %scenario.booking_url(),
        availability = %scenario.availability_url(),
        vus = cfg.vus,
        duration_secs = cfg.duration_secs,
        "starting room smoke run"
    );

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            telemetry::shutdown_signal().await;
            cancel.cancel();
        });
    }

    let summary = runner::run(Arc::new(scenario), runner::RunOptions::from(&cfg), cancel).await;
    println!("{summary}");

    if let Some(path) = &cfg.summary_export {
        report::write_json(&summary, &cfg, path)
            .with_context(|| format!("failed to export summary to {}", path.display()))?;
        info!(path = %path.display(), "summary exported");
    }

    let breaches = Thresholds::from(&cfg).evaluate(&summary);
    for breach in &breaches {
        error!(threshold = %breach, "threshold breached");
    }
    Ok(ExitCode::from(report::exit_status(&breaches)))
}
