//! External routing seam and the Distance Matrix client behind it.
//!
//! The client is blocking: the engine runs synchronously and the HTTP layer moves
//! searches onto tokio's blocking pool before they reach this code.

use std::sync::OnceLock;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use super::TravelMode;
use crate::config::RoutingConfig;

/// One origin/destination lookup, addressed by place name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRequest {
    pub origin: String,
    pub destination: String,
    pub mode: TravelMode,
}

/// Raw routed leg before any rush-hour adjustment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteLeg {
    pub distance_m: f64,
    pub duration_s: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    #[error("routing transport failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("routing service answered with status {0}")]
    Status(String),
    #[error("malformed routing response: {message}")]
    Malformed { message: String },
}

/// Anything that can turn a place pair into a routed distance and duration.
pub trait RoutingService: Send + Sync {
    fn route(&self, request: &RouteRequest) -> Result<RouteLeg, RoutingError>;
}

/// Distance Matrix JSON client.
pub struct DistanceMatrixClient {
    api_key: String,
    base_url: String,
    timeout: Duration,
    place_suffix: Option<String>,
    client: OnceLock<reqwest::blocking::Client>,
}

impl DistanceMatrixClient {
    /// `None` when no API key is configured.
    pub fn from_config(config: &RoutingConfig) -> Option<Self> {
        let api_key = config.api_key.clone()?;
        Some(Self {
            api_key,
            base_url: config.base_url.clone(),
            timeout: config.timeout,
            place_suffix: config.place_suffix.clone(),
            client: OnceLock::new(),
        })
    }

    /// Appends the country suffix unless the name already carries it.
    pub fn place_query(&self, name: &str) -> String {
        match &self.place_suffix {
            Some(suffix) if !name.contains(suffix.as_str()) => format!("{name}, {suffix}"),
            _ => name.to_string(),
        }
    }

    // Built on first use so construction never happens inside an async context.
    fn client(&self) -> Result<&reqwest::blocking::Client, RoutingError> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }
        let built = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()?;
        Ok(self.client.get_or_init(|| built))
    }
}

impl RoutingService for DistanceMatrixClient {
    fn route(&self, request: &RouteRequest) -> Result<RouteLeg, RoutingError> {
        let origin = self.place_query(&request.origin);
        let destination = self.place_query(&request.destination);
        debug!(%origin, %destination, mode = request.mode.as_str(), "requesting routed commute");

        let body: Value = self
            .client()?
            .get(&self.base_url)
            .query(&[
                ("origins", origin.as_str()),
                ("destinations", destination.as_str()),
                ("mode", request.mode.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()?
            .error_for_status()?
            .json()?;

        parse_response(&body)
    }
}

/// Extracts the first element of a Distance Matrix response.
pub(crate) fn parse_response(body: &Value) -> Result<RouteLeg, RoutingError> {
    if let Some(status) = body.get("status").and_then(Value::as_str) {
        if status != "OK" {
            return Err(RoutingError::Status(status.to_string()));
        }
    }

    let element = body
        .pointer("/rows/0/elements/0")
        .ok_or_else(|| RoutingError::Malformed {
            message: "response has no rows[0].elements[0]".to_string(),
        })?;

    match element.get("status").and_then(Value::as_str) {
        Some("OK") => {}
        Some(other) => return Err(RoutingError::Status(other.to_string())),
        None => {
            return Err(RoutingError::Malformed {
                message: "element is missing a status".to_string(),
            })
        }
    }

    let distance_m = element
        .pointer("/distance/value")
        .and_then(Value::as_f64)
        .ok_or_else(|| RoutingError::Malformed {
            message: "distance.value is not a number".to_string(),
        })?;
    let duration_s = element
        .pointer("/duration/value")
        .and_then(Value::as_f64)
        .ok_or_else(|| RoutingError::Malformed {
            message: "duration.value is not a number".to_string(),
        })?;

    if !(distance_m.is_finite() && duration_s.is_finite()) || distance_m < 0.0 || duration_s < 0.0
    {
        return Err(RoutingError::Malformed {
            message: "negative or non-finite leg".to_string(),
        });
    }

    Ok(RouteLeg {
        distance_m,
        duration_s,
    })
}
