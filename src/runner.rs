// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Scenario runner.
//!
//! Sends the scenario's request budget one request at a time, in sequence
//! order, waiting the configured delay between requests. Failed probes
//! are kept in the sequence and never retried.

use crate::observation::Observation;
use crate::probe::Probe;
use crate::scenario::Scenario;
use crate::verdict::{self, Verdict};
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Completed run of one scenario.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioRun {
    pub scenario: Scenario,
    /// Ordered observations, one per request in the budget
    pub observations: Vec<Observation>,
    /// Sequence number of the first target classification
    pub first_target_at: Option<u32>,
    /// Wall time measured by the runner, including pacing delays
    #[serde(serialize_with = "serialize_secs")]
    pub wall_time: Duration,
}

impl ScenarioRun {
    /// Reduce the observations into a verdict.
    pub fn verdict(&self) -> Verdict {
        verdict::aggregate(&self.scenario, &self.observations)
    }
}

/// Drives a [`Probe`] through a scenario.
pub struct ScenarioRunner<'a, P> {
    probe: &'a P,
}

impl<'a, P: Probe> ScenarioRunner<'a, P> {
    pub fn new(probe: &'a P) -> Self {
        Self { probe }
    }

    /// Run the scenario to completion.
    pub async fn run(&self, scenario: &Scenario) -> ScenarioRun {
        info!(
            scenario = %scenario.name,
            requests = scenario.request_budget,
            delay_secs = scenario.pacing.delay().as_secs_f64(),
            target = %scenario.target_classification,
            expect_target = scenario.expect_target,
            "Starting scenario"
        );

        let delay = scenario.pacing.delay();
        let mut observations = Vec::with_capacity(scenario.request_budget as usize);
        let mut first_target_at = None;
        let started = Instant::now();

        for sequence_number in 1..=scenario.request_budget {
            let observation = self.probe.probe(&scenario.payload, sequence_number).await;

            if observation.is_classified_as(&scenario.target_classification) {
                if first_target_at.is_none() {
                    info!(
                        scenario = %scenario.name,
                        sequence = sequence_number,
                        "{} detected at request #{}",
                        scenario.target_classification,
                        sequence_number
                    );
                    first_target_at = Some(sequence_number);
                } else {
                    debug!(sequence = sequence_number, "Target classification repeated");
                }
            }
            observations.push(observation);

            if sequence_number < scenario.request_budget && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        let wall_time = started.elapsed();
        info!(
            scenario = %scenario.name,
            sent = observations.len(),
            wall_time_secs = wall_time.as_secs_f64(),
            "Scenario complete"
        );

        ScenarioRun {
            scenario: scenario.clone(),
            observations,
            first_target_at,
            wall_time,
        }
    }
}

fn serialize_secs<S: serde::Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}
