//! Smoke and load runner for the booking and availability services.
//!
//! Every virtual user repeatedly books a room through the booking API, asks
//! the availability API about the same room and date range, and records
//! whether each answered with the expected status code.

pub mod auth;
pub mod checks;
pub mod config;
pub mod error;
pub mod metrics;
pub mod report;
pub mod runner;
pub mod scenario;
pub mod telemetry;

pub use error::SmokeError;
