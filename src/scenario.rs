// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Scenario definitions: request budget, pacing and the expected outcome.

use crate::config::ScenarioConfig;
use crate::error::ConfigError;
use serde::{Serialize, Serializer};
use std::time::Duration;

/// How requests are spaced within a scenario.
///
/// Requests are dispatched one at a time, so the achieved rate is bounded
/// by round-trip latency in both modes. `Unpaced` fires the next request
/// as soon as the previous response arrives; `Fixed` adds the delay on top
/// of the round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    Unpaced,
    Fixed(Duration),
}

impl Pacing {
    /// Delay to wait between two consecutive requests.
    pub fn delay(&self) -> Duration {
        match self {
            Self::Unpaced => Duration::ZERO,
            Self::Fixed(delay) => *delay,
        }
    }

    /// Requests per second implied by the pacing alone, `None` when unbounded.
    pub fn nominal_rate(&self) -> Option<f64> {
        match self {
            Self::Fixed(delay) if !delay.is_zero() => Some(1.0 / delay.as_secs_f64()),
            _ => None,
        }
    }
}

impl Serialize for Pacing {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.delay().as_secs_f64())
    }
}

/// One test run's configuration. Never mutated once a run starts.
#[derive(Debug, Clone, Serialize)]
pub struct Scenario {
    pub name: String,
    pub request_budget: u32,
    pub payload: String,
    #[serde(rename = "inter_request_delay_seconds")]
    pub pacing: Pacing,
    pub target_classification: String,
    /// Whether the target classification should appear
    pub expect_target: bool,
}

impl Scenario {
    /// Burst: 10 back-to-back requests, detection expected.
    pub fn burst() -> Self {
        ScenarioConfig::burst().to_scenario("burst", true)
    }

    /// Control: 5 requests 0.5 s apart, detection must not occur.
    pub fn control() -> Self {
        ScenarioConfig::control().to_scenario("control", false)
    }

    pub fn nominal_rate(&self) -> Option<f64> {
        self.pacing.nominal_rate()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let reason = if self.request_budget == 0 {
            "request budget must be positive"
        } else if self.payload.is_empty() {
            "payload must not be empty"
        } else if self.target_classification.trim().is_empty() {
            "target classification must not be empty"
        } else {
            return Ok(());
        };
        Err(ConfigError::InvalidScenario {
            scenario: self.name.clone(),
            reason,
        })
    }
}
