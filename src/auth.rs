//! HTTP Basic credentials sent with every smoke request.

use base64::prelude::*;
use std::fmt;

use crate::error::SmokeError;

#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl BasicCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Value for the `Authorization` header: `Basic <base64(username:password)>`.
    pub fn header_value(&self) -> String {
        let raw = format!("{}:{}", self.username, self.password);
        format!("Basic {}", BASE64_STANDARD.encode(raw.as_bytes()))
    }

    /// Parse an `Authorization: Basic ...` value back into credentials.
    pub fn parse_header(value: &str) -> Result<Self, SmokeError> {
        let encoded = value.strip_prefix("Basic ").ok_or_else(|| {
            SmokeError::MalformedAuthorization("header must start with 'Basic '".to_string())
        })?;

        let decoded = BASE64_STANDARD
            .decode(encoded.trim().as_bytes())
            .map_err(|e| SmokeError::MalformedAuthorization(format!("invalid base64: {}", e)))?;

        let decoded = String::from_utf8(decoded).map_err(|e| {
            SmokeError::MalformedAuthorization(format!("invalid UTF-8 in credentials: {}", e))
        })?;

        let (username, password) = decoded.split_once(':').ok_or_else(|| {
            SmokeError::MalformedAuthorization(
                "credentials must be in format 'username:password'".to_string(),
            )
        })?;

        Ok(Self::new(username, password))
    }
}

impl fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
