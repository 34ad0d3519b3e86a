use chrono::NaiveDate;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::auth::BasicCredentials;
use crate::error::SmokeError;

pub const DEFAULT_CONFIG_PATH: &str = "config/smoke.toml";

const DEFAULT_START_DATE: NaiveDate = match NaiveDate::from_ymd_opt(2025, 1, 20) {
    Some(date) => date,
    None => panic!("invalid default start date"),
};

const DEFAULT_END_DATE: NaiveDate = match NaiveDate::from_ymd_opt(2025, 1, 22) {
    Some(date) => date,
    None => panic!("invalid default end date"),
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmokeConfig {
    pub booking_base_url: String,
    pub availability_base_url: String,
    pub room_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub username: String,
    pub password: String,
    pub vus: u32,
    pub duration_secs: u64,
    pub pause_ms: u64,
    pub graceful_stop_secs: u64,
    pub request_timeout_secs: u64,
    pub checks_rate_min: Option<f64>,
    pub summary_export: Option<PathBuf>,
}

impl Default for SmokeConfig {
    fn default() -> Self {
        Self {
            booking_base_url: "http://localhost:8085".to_string(),
            availability_base_url: "http://localhost:8086".to_string(),
            room_id: "deluxe-101".to_string(),
            start_date: DEFAULT_START_DATE,
            end_date: DEFAULT_END_DATE,
            username: "user".to_string(),
            password: "password".to_string(),
            vus: 10,
            duration_secs: 30,
            pause_ms: 1_000,
            graceful_stop_secs: 30,
            request_timeout_secs: 60,
            checks_rate_min: None,
            summary_export: None,
        }
    }
}

impl SmokeConfig {
    /// Layered sources, lowest precedence first: built-in defaults, the TOML
    /// file named by `SMOKE_CONFIG`, `SMOKE__*` variables, then the bare
    /// `BASE_URL_BOOKING` / `BASE_URL_AVAIL` variables.
    pub fn figment() -> Figment {
        let path = std::env::var("SMOKE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let mut figment = Figment::from(Serialized::defaults(SmokeConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("SMOKE__"));

        // An empty variable means "unset" and keeps the lower layers.
        for (var, key) in [
            ("BASE_URL_BOOKING", "booking_base_url"),
            ("BASE_URL_AVAIL", "availability_base_url"),
        ] {
            if let Some(url) = std::env::var(var).ok().filter(|v| !v.trim().is_empty()) {
                figment = figment.merge(Serialized::default(key, url));
            }
        }

        figment
    }

    pub fn load() -> Result<Self, SmokeError> {
        Self::from_figment(Self::figment())
    }

    pub fn from_figment(figment: Figment) -> Result<Self, SmokeError> {
        let cfg: SmokeConfig = figment.extract()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), SmokeError> {
        check_base_url("booking_base_url", &self.booking_base_url)?;
        check_base_url("availability_base_url", &self.availability_base_url)?;

        if self.room_id.trim().is_empty() {
            return Err(SmokeError::Config("room_id cannot be blank".to_string()));
        }

        // Both services answer 400 for an empty or inverted range.
        if self.start_date >= self.end_date {
            return Err(SmokeError::Config(format!(
                "start_date {} must be before end_date {}",
                self.start_date, self.end_date
            )));
        }

        if self.username.is_empty() {
            return Err(SmokeError::Config("username cannot be empty".to_string()));
        }

        if self.vus == 0 {
            return Err(SmokeError::Config("vus must be at least 1".to_string()));
        }

        if self.duration_secs == 0 {
            return Err(SmokeError::Config("duration_secs must be at least 1".to_string()));
        }

        if self.request_timeout_secs == 0 {
            return Err(SmokeError::Config(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }

        if let Some(rate) = self.checks_rate_min {
            if !(0.0..=1.0).contains(&rate) {
                return Err(SmokeError::Config(
                    "checks_rate_min must be between 0.0 and 1.0".to_string(),
                ));
            }
        }

        Ok(())
    }

    pub fn credentials(&self) -> BasicCredentials {
        BasicCredentials::new(self.username.clone(), self.password.clone())
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }

    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }

    pub fn graceful_stop(&self) -> Duration {
        Duration::from_secs(self.graceful_stop_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn check_base_url(field: &str, value: &str) -> Result<(), SmokeError> {
    let url = reqwest::Url::parse(value)
        .map_err(|e| SmokeError::Config(format!("{} '{}' is not a valid URL: {}", field, value, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(SmokeError::Config(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    Ok(())
}
