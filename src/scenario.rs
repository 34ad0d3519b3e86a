//! The per-iteration workload: book a room, then query its availability.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{header::AUTHORIZATION, Client, RequestBuilder, StatusCode, Url};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::checks::CheckResult;
use crate::config::SmokeConfig;
use crate::error::SmokeError;
use crate::metrics::{Endpoint, RequestSample};

pub const BOOKING_CHECK: &str = "booking 201";
pub const AVAILABILITY_CHECK: &str = "availability 200";

/// What a single iteration produced.
#[derive(Debug, Clone, Default)]
pub struct IterationOutcome {
    pub samples: Vec<RequestSample>,
    pub checks: Vec<CheckResult>,
}

/// One iteration of work for a virtual user. Implementations must not fail:
/// anything that goes wrong is reported through failed checks.
#[async_trait]
pub trait Scenario: Send + Sync {
    async fn iteration(&self, vu: u32, iteration: u64) -> IterationOutcome;
}

pub struct BookingAvailability {
    client: Client,
    booking_url: Url,
    availability_url: Url,
    authorization: String,
}

impl BookingAvailability {
    pub fn new(cfg: &SmokeConfig) -> Result<Self, SmokeError> {
        let client = Client::builder()
            .timeout(cfg.request_timeout())
            .user_agent(concat!("room-smoke/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            booking_url: booking_url(
                &cfg.booking_base_url,
                &cfg.room_id,
                cfg.start_date,
                cfg.end_date,
            )?,
            availability_url: availability_url(
                &cfg.availability_base_url,
                &cfg.room_id,
                cfg.start_date,
                cfg.end_date,
            )?,
            authorization: cfg.credentials().header_value(),
        })
    }

    pub fn booking_url(&self) -> &Url {
        &self.booking_url
    }

    pub fn availability_url(&self) -> &Url {
        &self.availability_url
    }

    async fn send(&self, endpoint: Endpoint, request: RequestBuilder) -> RequestSample {
        let started = Instant::now();

        let status = match request.header(AUTHORIZATION, &self.authorization).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                // Drain the body so the timing covers the full response.
                if let Err(e) = response.bytes().await {
                    debug!(%endpoint, error = %e, "failed to read response body");
                }
                Some(status)
            }
            Err(e) => {
                warn!(%endpoint, error = %e, "request failed");
                None
            }
        };

        let duration = started.elapsed();
        debug!(%endpoint, ?status, elapsed_ms = duration.as_millis() as u64, "request completed");

        RequestSample {
            endpoint,
            status,
            duration,
        }
    }
}

#[async_trait]
impl Scenario for BookingAvailability {
    async fn iteration(&self, vu: u32, iteration: u64) -> IterationOutcome {
        let booking = self
            .send(Endpoint::Booking, self.client.post(self.booking_url.clone()))
            .await;
        let booking_check = status_check(BOOKING_CHECK, &booking, StatusCode::CREATED);

        // Issued regardless of the booking outcome.
        let availability = self
            .send(Endpoint::Availability, self.client.get(self.availability_url.clone()))
            .await;
        let availability_check = status_check(AVAILABILITY_CHECK, &availability, StatusCode::OK);

        for (check, sample) in [(&booking_check, &booking), (&availability_check, &availability)] {
            if !check.passed {
                warn!(vu, iteration, check = %check.name, status = ?sample.status, "check failed");
            }
        }

        IterationOutcome {
            samples: vec![booking, availability],
            checks: vec![booking_check, availability_check],
        }
    }
}

fn status_check(name: &str, sample: &RequestSample, expected: StatusCode) -> CheckResult {
    CheckResult::new(name, sample.status == Some(expected.as_u16()))
}

/// `POST {base}/api/bookings?roomId=..&startDate=..&endDate=..`
pub fn booking_url(
    base: &str,
    room_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Url, SmokeError> {
    endpoint_url(
        base,
        &["api", "bookings"],
        &[
            ("roomId", room_id.to_string()),
            ("startDate", start.to_string()),
            ("endDate", end.to_string()),
        ],
    )
}

/// `GET {base}/api/availability/{room}?startDate=..&endDate=..`
pub fn availability_url(
    base: &str,
    room_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Url, SmokeError> {
    endpoint_url(
        base,
        &["api", "availability", room_id],
        &[("startDate", start.to_string()), ("endDate", end.to_string())],
    )
}

fn endpoint_url(
    base: &str,
    segments: &[&str],
    query: &[(&str, String)],
) -> Result<Url, SmokeError> {
    let mut url = Url::parse(base).map_err(|e| SmokeError::invalid_url(base, e))?;

    url.path_segments_mut()
        .map_err(|_| SmokeError::invalid_url(base, "URL cannot be a base"))?
        .pop_if_empty()
        .extend(segments);

    url.query_pairs_mut()
        .clear()
        .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));

    Ok(url)
}
