use room_smoke::config::SmokeConfig;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const AUTHORIZATION: &str = "Basic dXNlcjpwYXNzd29yZA==";

pub struct MockServices {
    pub booking: MockServer,
    pub availability: MockServer,
}

impl MockServices {
    /// Both services answer the fixed smoke requests with the expected status.
    pub async fn healthy() -> Self {
        Self::with_statuses(201, 200).await
    }

    pub async fn with_statuses(booking_status: u16, availability_status: u16) -> Self {
        let booking = MockServer::start().await;
        let availability = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/bookings"))
            .and(query_param("roomId", "deluxe-101"))
            .and(query_param("startDate", "2025-01-20"))
            .and(query_param("endDate", "2025-01-22"))
            .and(header("Authorization", AUTHORIZATION))
            .respond_with(ResponseTemplate::new(booking_status).set_body_json(json!({
                "id": 1,
                "roomId": "deluxe-101",
                "startDate": "2025-01-20",
                "endDate": "2025-01-22",
                "status": "CREATED"
            })))
            .mount(&booking)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/availability/deluxe-101"))
            .and(query_param("startDate", "2025-01-20"))
            .and(query_param("endDate", "2025-01-22"))
            .and(header("Authorization", AUTHORIZATION))
            .respond_with(ResponseTemplate::new(availability_status).set_body_json(json!([])))
            .mount(&availability)
            .await;

        Self {
            booking,
            availability,
        }
    }

    pub fn config(&self) -> SmokeConfig {
        SmokeConfig {
            booking_base_url: self.booking.uri(),
            availability_base_url: self.availability.uri(),
            ..SmokeConfig::default()
        }
    }
}
