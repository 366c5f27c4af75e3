// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Per-request observation records.

use crate::error::ProbeError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Classification label used when the backend omits `analysis.verdict`.
pub const UNKNOWN_VERDICT: &str = "Unknown";

/// Message used when the backend omits `message`.
pub const NO_MESSAGE: &str = "No message";

/// Backend-reported status. Opaque: integer codes and strings are kept
/// as such, any other JSON value is carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusValue {
    Code(i64),
    Text(String),
    Other(serde_json::Value),
}

impl fmt::Display for StatusValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => write!(f, "{}", code),
            Self::Text(text) => f.write_str(text),
            Self::Other(value) => write!(f, "{}", value),
        }
    }
}

/// Normalized classifier response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// `analysis.verdict`, or [`UNKNOWN_VERDICT`]
    pub verdict: String,
    /// `analysis.confidence` in [0.0, 1.0], or 0
    pub confidence: f64,
    /// Top-level `status`, or the transport status code
    pub status: StatusValue,
    /// Top-level `message`, or [`NO_MESSAGE`]
    pub message: String,
}

/// Why a probe produced no classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Transport,
    Timeout,
    MalformedResponse,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport => write!(f, "transport failure"),
            Self::Timeout => write!(f, "timeout"),
            Self::MalformedResponse => write!(f, "malformed response"),
        }
    }
}

impl From<&ProbeError> for FailureKind {
    fn from(err: &ProbeError) -> Self {
        match err {
            ProbeError::Timeout(_) => Self::Timeout,
            ProbeError::Transport(_) => Self::Transport,
            ProbeError::MalformedResponse(_) => Self::MalformedResponse,
        }
    }
}

/// Result carried by an observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Outcome {
    Classified(Classification),
    Failed { kind: FailureKind, error: String },
}

/// One probe result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// 1-based position within the scenario
    pub sequence_number: u32,
    /// Round-trip time (or time until the failure surfaced)
    pub latency_seconds: f64,
    /// When the observation was created, i.e. the end of the exchange
    pub captured_at: DateTime<Utc>,
    pub outcome: Outcome,
}

impl Observation {
    /// Record a successful exchange.
    pub fn classified(sequence_number: u32, latency: Duration, classification: Classification) -> Self {
        Self {
            sequence_number,
            latency_seconds: latency.as_secs_f64(),
            captured_at: Utc::now(),
            outcome: Outcome::Classified(classification),
        }
    }

    /// Record a failed exchange.
    pub fn failed(sequence_number: u32, latency: Duration, err: &ProbeError) -> Self {
        Self {
            sequence_number,
            latency_seconds: latency.as_secs_f64(),
            captured_at: Utc::now(),
            outcome: Outcome::Failed {
                kind: err.into(),
                error: err.to_string(),
            },
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, Outcome::Failed { .. })
    }

    /// Verdict label, `None` for failures.
    pub fn classification(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Classified(c) => Some(c.verdict.as_str()),
            Outcome::Failed { .. } => None,
        }
    }

    /// Confidence, 0 for failures.
    pub fn confidence(&self) -> f64 {
        match &self.outcome {
            Outcome::Classified(c) => c.confidence,
            Outcome::Failed { .. } => 0.0,
        }
    }

    /// Whether this observation carries the given label.
    pub fn is_classified_as(&self, label: &str) -> bool {
        self.classification() == Some(label)
    }

    /// When the request was issued.
    pub fn started_at(&self) -> DateTime<Utc> {
        let micros = (self.latency_seconds.max(0.0) * 1_000_000.0).round() as i64;
        self.captured_at - chrono::Duration::microseconds(micros)
    }
}
