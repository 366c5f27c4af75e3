// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Scripted probes.

use brute_force_harness::observation::{Classification, Observation, StatusValue};
use brute_force_harness::{Probe, ProbeError};
use std::sync::Mutex;
use std::time::Duration;

/// One scripted answer.
#[derive(Debug, Clone, Copy)]
pub enum Step {
    Verdict(&'static str),
    TransportFailure,
    Timeout,
    Malformed,
}

/// Replays a fixed list of steps, indexed by sequence number.
pub struct ScriptedProbe {
    steps: Vec<Step>,
    latency: Duration,
    calls: Mutex<Vec<u32>>,
}

impl ScriptedProbe {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps,
            latency: Duration::from_millis(20),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// `benign` requests followed by `flagged` brute-force verdicts.
    pub fn detects_after(benign: usize, flagged: usize) -> Self {
        let mut steps = vec![Step::Verdict("Benign"); benign];
        steps.extend(vec![Step::Verdict("Brute Force"); flagged]);
        Self::new(steps)
    }

    /// Replace step `sequence_number` (1-based).
    pub fn with_step(mut self, sequence_number: u32, step: Step) -> Self {
        self.steps[(sequence_number - 1) as usize] = step;
        self
    }

    /// Sequence numbers the runner passed in, in call order.
    pub fn calls(&self) -> Vec<u32> {
        self.calls.lock().unwrap().clone()
    }
}

impl Probe for ScriptedProbe {
    async fn probe(&self, _payload: &str, sequence_number: u32) -> Observation {
        self.calls.lock().unwrap().push(sequence_number);
        let step = self.steps[(sequence_number - 1) as usize];
        match step {
            Step::Verdict(verdict) => Observation::classified(
                sequence_number,
                self.latency,
                Classification {
                    verdict: verdict.to_string(),
                    confidence: 0.9,
                    status: StatusValue::Text("success".to_string()),
                    message: "scripted".to_string(),
                },
            ),
            Step::TransportFailure => {
                // Produce a genuine reqwest connection error.
                let err = reqwest::Client::new()
                    .get("http://127.0.0.1:1/")
                    .send()
                    .await
                    .expect_err("port 1 should refuse connections");
                Observation::failed(sequence_number, self.latency, &ProbeError::Transport(err))
            }
            Step::Timeout => Observation::failed(sequence_number, self.latency, &ProbeError::Timeout(30)),
            Step::Malformed => Observation::failed(
                sequence_number,
                self.latency,
                &ProbeError::MalformedResponse("expected value at line 1 column 1".to_string()),
            ),
        }
    }
}
