// SPDX-License-Identifier: PMPL-1.0-or-later
//! Error types for the detection harness

use thiserror::Error;

/// Errors raised while probing the classifier.
///
/// These never leave the scenario runner: each one is folded into a
/// failed [`Observation`](crate::observation::Observation).
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl ProbeError {
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout_secs)
        } else if err.is_decode() {
            Self::MalformedResponse(err.to_string())
        } else {
            Self::Transport(err)
        }
    }
}

/// Configuration errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid endpoint {url}: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Invalid scenario {scenario}: {reason}")]
    InvalidScenario { scenario: String, reason: &'static str },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}
