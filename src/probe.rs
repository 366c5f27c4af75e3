// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Request probe: one classification exchange per call.
//!
//! The probe never fails: transport errors, timeouts and unparseable
//! bodies are downgraded to a failed [`Observation`] and logged.

use crate::config::Config;
use crate::error::{ConfigError, ProbeError};
use crate::observation::{Classification, Observation, StatusValue, NO_MESSAGE, UNKNOWN_VERDICT};
use serde::{Deserialize, Deserializer, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use url::Url;

/// Issues a single request and normalizes the answer.
///
/// The sequence number is supplied by the caller; implementations only
/// copy it into the observation.
pub trait Probe {
    fn probe(&self, payload: &str, sequence_number: u32) -> impl Future<Output = Observation> + Send;
}

/// Request body sent to the classifier.
#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    payload: &'a str,
}

/// Response body returned by the classifier. Every field is optional.
#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    #[serde(default)]
    status: Option<StatusValue>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default, deserialize_with = "present")]
    analysis: Option<Analysis>,
}

/// A missing field defaults to `None`; an explicit `null` is rejected.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
struct Analysis {
    #[serde(default)]
    verdict: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
}

/// Normalize a response body, filling in the documented defaults.
///
/// A body that is not a JSON object, an `analysis` that is not an object
/// (`null` included), or a verdict, confidence or message of the wrong
/// type is a [`ProbeError::MalformedResponse`]. Missing fields are not.
/// `status` is opaque and accepted whatever its JSON type.
pub fn parse_response(body: &[u8], transport_status: u16) -> Result<Classification, ProbeError> {
    let response: AnalyzeResponse =
        serde_json::from_slice(body).map_err(|e| ProbeError::MalformedResponse(e.to_string()))?;

    let (verdict, confidence) = match response.analysis {
        Some(analysis) => (analysis.verdict, analysis.confidence),
        None => (None, None),
    };

    Ok(Classification {
        verdict: verdict.unwrap_or_else(|| UNKNOWN_VERDICT.to_string()),
        confidence: confidence.unwrap_or(0.0).clamp(0.0, 1.0),
        status: response
            .status
            .unwrap_or(StatusValue::Code(i64::from(transport_status))),
        message: response.message.unwrap_or_else(|| NO_MESSAGE.to_string()),
    })
}

/// Probe backed by a real HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
    endpoint: Url,
    timeout_secs: u64,
}

impl HttpProbe {
    /// Create a probe for `endpoint` with a per-request timeout.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let endpoint = Url::parse(endpoint).map_err(|e| ConfigError::InvalidEndpoint {
            url: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            timeout_secs: timeout.as_secs(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Self::new(&config.endpoint, config.timeout())
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Send the payload and read the full body.
    async fn exchange(&self, payload: &str) -> Result<(u16, Vec<u8>), ProbeError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&AnalyzeRequest { payload })
            .send()
            .await
            .map_err(|e| ProbeError::from_reqwest(e, self.timeout_secs))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| ProbeError::from_reqwest(e, self.timeout_secs))?;

        Ok((status, body.to_vec()))
    }
}

impl Probe for HttpProbe {
    async fn probe(&self, payload: &str, sequence_number: u32) -> Observation {
        let start = Instant::now();
        let exchanged = self.exchange(payload).await;
        let latency = start.elapsed();

        match exchanged.and_then(|(status, body)| parse_response(&body, status)) {
            Ok(classification) => {
                info!(
                    sequence = sequence_number,
                    latency_secs = latency.as_secs_f64(),
                    confidence = classification.confidence,
                    status = %classification.status,
                    backend_message = %classification.message,
                    "Request #{}: {} ({:.2}s)",
                    sequence_number,
                    classification.verdict,
                    latency.as_secs_f64()
                );
                Observation::classified(sequence_number, latency, classification)
            }
            Err(err) => {
                warn!(
                    sequence = sequence_number,
                    latency_secs = latency.as_secs_f64(),
                    error = %err,
                    "Request #{} FAILED",
                    sequence_number
                );
                Observation::failed(sequence_number, latency, &err)
            }
        }
    }
}
