use std::sync::Arc;
use std::time::{Duration, Instant};

use room_smoke::config::SmokeConfig;
use room_smoke::report::Thresholds;
use room_smoke::runner::{run, RunOptions};
use room_smoke::scenario::{BookingAvailability, AVAILABILITY_CHECK, BOOKING_CHECK};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::mock_services::MockServices;

fn short_run(vus: u32) -> RunOptions {
    RunOptions {
        vus,
        duration: Duration::from_secs(2),
        pause: Duration::from_millis(200),
        graceful_stop: Duration::from_secs(1),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_short_run_against_healthy_services() {
    let services = MockServices::healthy().await;
    let scenario = Arc::new(BookingAvailability::new(&services.config()).unwrap());

    let summary = run(scenario, short_run(3), CancellationToken::new()).await;

    assert!(summary.iterations >= 3);
    assert_eq!(summary.http_reqs as u64, summary.iterations * 2);
    assert_eq!(summary.http_req_failed, 0);
    assert_eq!(summary.checks_total.fails, 0);
    assert_eq!(summary.checks.len(), 2);
    assert_eq!(summary.checks[0].name, BOOKING_CHECK);
    assert_eq!(summary.checks[1].name, AVAILABILITY_CHECK);

    let thresholds = Thresholds { checks_rate_min: Some(1.0) };
    assert!(thresholds.evaluate(&summary).is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_run_terminates_when_services_are_unreachable() {
    let mut cfg = SmokeConfig::default();
    cfg.booking_base_url = "http://127.0.0.1:9".to_string();
    cfg.availability_base_url = "http://127.0.0.1:9".to_string();
    cfg.request_timeout_secs = 1;

    let scenario = Arc::new(BookingAvailability::new(&cfg).unwrap());
    let started = Instant::now();
    let summary = run(scenario, short_run(2), CancellationToken::new()).await;

    assert!(started.elapsed() < Duration::from_secs(4));
    assert_eq!(summary.checks_total.passes, 0);
    assert!(summary.checks_total.fails > 0);
    assert_eq!(summary.http_req_failed, summary.http_reqs);

    let thresholds = Thresholds { checks_rate_min: Some(0.5) };
    assert_eq!(thresholds.evaluate(&summary).len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_run_terminates_when_services_hang() {
    let slow = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(201).set_delay(Duration::from_secs(30)))
        .mount(&slow)
        .await;

    let services = MockServices::healthy().await;
    let mut cfg = services.config();
    cfg.booking_base_url = slow.uri();

    let scenario = Arc::new(BookingAvailability::new(&cfg).unwrap());
    let started = Instant::now();
    let summary = run(scenario, short_run(2), CancellationToken::new()).await;

    // duration + graceful stop, with headroom for scheduling
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(summary.iterations, 0);
    assert_eq!(summary.interrupted_iterations, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore] // full default run: 10 VUs for 30 seconds
async fn test_default_run_against_healthy_services() {
    let services = MockServices::healthy().await;
    let cfg = services.config();
    let scenario = Arc::new(BookingAvailability::new(&cfg).unwrap());

    let summary = run(scenario, RunOptions::from(&cfg), CancellationToken::new()).await;

    println!("{summary}");
    assert_eq!(summary.vus, 10);
    // one iteration per VU per second, give or take the edges
    assert!((250..=310).contains(&summary.iterations), "iterations = {}", summary.iterations);
    assert_eq!(summary.checks_total.fails, 0);
    assert!(summary.elapsed_secs < 32.0);
}
