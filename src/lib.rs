// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Brute-force detection harness
//!
//! Verifies that a remote classification endpoint tells a burst of
//! requests from one origin apart from a normal request rate:
//!
//! - Burst scenario: 10 back-to-back requests, "Brute Force" expected
//! - Control scenario: 5 requests 0.5 s apart, "Brute Force" not expected
//! - 3 second cooldown between the two, so they do not share rate state
//!
//! Requests are sent one at a time. The achieved burst rate is therefore
//! bounded by round-trip latency, and the verdict reports it next to the
//! nominal pacing rate.

pub mod config;
pub mod error;
pub mod mock;
pub mod observation;
pub mod probe;
pub mod runner;
pub mod scenario;
pub mod suite;
pub mod verdict;

pub use config::Config;
pub use error::{ConfigError, ProbeError};
pub use observation::Observation;
pub use probe::{HttpProbe, Probe};
pub use runner::{ScenarioRun, ScenarioRunner};
pub use scenario::{Pacing, Scenario};
pub use suite::{run_suite, Selection, SuiteReport};
pub use verdict::Verdict;
