// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the brute-force detection harness.
//!
//! Defaults reproduce the reference run: a 10-request unpaced burst, a
//! 3 second cooldown, then a 5-request control paced at 0.5 s.

use crate::error::ConfigError;
use crate::scenario::{Pacing, Scenario};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Label the classifier uses for a detected brute-force pattern.
pub const TARGET_CLASSIFICATION: &str = "Brute Force";

/// Configuration for one harness run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Classification endpoint (default: http://localhost:8000/analyze)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Per-request timeout in seconds (default: 30)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Pause between the burst and control scenarios in milliseconds (default: 3000)
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,

    /// Burst scenario settings
    #[serde(default = "ScenarioConfig::burst")]
    pub burst: ScenarioConfig,

    /// Control scenario settings
    #[serde(default = "ScenarioConfig::control")]
    pub control: ScenarioConfig,

    /// Local mock classifier settings
    #[serde(default)]
    pub mock: MockConfig,
}

/// Per-scenario knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Number of requests to send
    pub request_budget: u32,

    /// Payload sent with every request
    pub payload: String,

    /// Delay between requests in milliseconds; 0 fires back-to-back
    pub delay_ms: u64,
}

/// Settings for the local mock classification backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockConfig {
    /// Bind address (default: 127.0.0.1:8000)
    #[serde(default = "default_mock_bind_addr")]
    pub bind_addr: String,

    /// Requests allowed inside one window before flagging (default: 5)
    #[serde(default = "default_mock_threshold")]
    pub threshold: usize,

    /// Sliding window length in milliseconds (default: 1000)
    #[serde(default = "default_mock_window_ms")]
    pub window_ms: u64,
}

// Default value functions
fn default_endpoint() -> String {
    "http://localhost:8000/analyze".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_cooldown_ms() -> u64 {
    3000
}

fn default_mock_bind_addr() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_mock_threshold() -> usize {
    5 // more than 5 req/s from one origin is a burst
}

fn default_mock_window_ms() -> u64 {
    1000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
            cooldown_ms: default_cooldown_ms(),
            burst: ScenarioConfig::burst(),
            control: ScenarioConfig::control(),
            mock: MockConfig::default(),
        }
    }
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_mock_bind_addr(),
            threshold: default_mock_threshold(),
            window_ms: default_mock_window_ms(),
        }
    }
}

impl ScenarioConfig {
    /// Reference burst: 10 login attempts, no pause.
    pub fn burst() -> Self {
        Self {
            request_budget: 10,
            payload: "admin".to_string(),
            delay_ms: 0,
        }
    }

    /// Reference control: 5 requests half a second apart.
    pub fn control() -> Self {
        Self {
            request_budget: 5,
            payload: "testuser".to_string(),
            delay_ms: 500,
        }
    }

    fn pacing(&self) -> Pacing {
        if self.delay_ms == 0 {
            Pacing::Unpaced
        } else {
            Pacing::Fixed(Duration::from_millis(self.delay_ms))
        }
    }

    /// Build a scenario watching for [`TARGET_CLASSIFICATION`].
    pub fn to_scenario(&self, name: &str, expect_target: bool) -> Scenario {
        Scenario {
            name: name.to_string(),
            request_budget: self.request_budget,
            payload: self.payload.clone(),
            pacing: self.pacing(),
            target_classification: TARGET_CLASSIFICATION.to_string(),
            expect_target,
        }
    }
}

impl Config {
    /// Load configuration from environment variables on top of the defaults.
    ///
    /// - `PROBE_ENDPOINT`: classification endpoint URL
    /// - `PROBE_TIMEOUT_SECS`: per-request timeout
    /// - `PROBE_COOLDOWN_MS`: pause between scenarios
    /// - `MOCK_BIND_ADDR`: bind address of the mock backend
    /// - `MOCK_THRESHOLD`: mock burst threshold per window
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any variable source on top of the defaults.
    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(endpoint) = var("PROBE_ENDPOINT") {
            config.endpoint = endpoint;
        }
        if let Some(v) = parse_var(&var, "PROBE_TIMEOUT_SECS")? {
            config.timeout_secs = v;
        }
        if let Some(v) = parse_var(&var, "PROBE_COOLDOWN_MS")? {
            config.cooldown_ms = v;
        }
        if let Some(addr) = var("MOCK_BIND_ADDR") {
            config.mock.bind_addr = addr;
        }
        if let Some(v) = parse_var(&var, "MOCK_THRESHOLD")? {
            config.mock.threshold = v;
        }
        Ok(config)
    }

    /// Check the endpoint and both scenarios.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.endpoint).map_err(|e| ConfigError::InvalidEndpoint {
            url: self.endpoint.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEndpoint {
                url: self.endpoint.clone(),
                reason: format!("unsupported scheme {}", url.scheme()),
            });
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "timeout_secs",
                value: "0".to_string(),
            });
        }
        self.burst_scenario().validate()?;
        self.control_scenario().validate()?;
        Ok(())
    }

    /// Get the per-request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get the inter-scenario cooldown
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    /// Build the burst scenario: detection is expected.
    pub fn burst_scenario(&self) -> Scenario {
        self.burst.to_scenario("burst", true)
    }

    /// Build the control scenario: detection must not occur.
    pub fn control_scenario(&self) -> Scenario {
        self.control.to_scenario("control", false)
    }
}

impl MockConfig {
    /// Get the sliding window duration
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

fn parse_var<T, F>(var: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        None => Ok(None),
    }
}
