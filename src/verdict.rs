// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Verdict aggregation.
//!
//! Reduces a completed observation sequence into counts, achieved rate,
//! latency figures and a classification frequency table, then checks the
//! scenario's expectation against the table. Aggregation reads only the
//! observations, so running it twice over the same sequence gives the
//! same verdict.

use crate::observation::Observation;
use crate::scenario::Scenario;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Request rate the classifier needs to see before it flags a burst.
pub const DETECTION_RATE_THRESHOLD: f64 = 5.0;

/// Frequency table: classification label -> count.
pub type FrequencyTable = BTreeMap<String, usize>;

/// Summary of one scenario run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub scenario: String,
    pub target_classification: String,
    pub expect_target: bool,
    /// Requests sent, failures included
    pub total_sent: usize,
    pub successful: usize,
    pub failed: usize,
    /// From the start of the first request to the end of the last one
    pub elapsed_seconds: f64,
    /// Successful requests per second of elapsed time
    pub requests_per_second: f64,
    /// Rate implied by the pacing alone; `None` when unpaced
    pub nominal_rate: Option<f64>,
    pub frequency: FrequencyTable,
    pub first_target_at: Option<u32>,
    pub median_latency_ms: f64,
    pub p99_latency_ms: f64,
    pub max_latency_ms: f64,
    pub passed: bool,
    /// Likely explanations when the run failed
    pub failure_causes: Vec<String>,
    pub warnings: Vec<String>,
}

/// Count classification labels, skipping failed observations.
pub fn frequency_table(observations: &[Observation]) -> FrequencyTable {
    let mut table = FrequencyTable::new();
    for label in observations.iter().filter_map(Observation::classification) {
        *table.entry(label.to_string()).or_insert(0) += 1;
    }
    table
}

/// Pass condition: the target must appear iff it is expected.
pub fn evaluate(frequency: &FrequencyTable, target: &str, expect_target: bool) -> bool {
    frequency.contains_key(target) == expect_target
}

/// Seconds between the start of the first observation and the end of the last.
pub fn elapsed_seconds(observations: &[Observation]) -> f64 {
    match (observations.first(), observations.last()) {
        (Some(first), Some(last)) => {
            let span = last.captured_at - first.started_at();
            span.num_microseconds()
                .map(|us| us as f64 / 1_000_000.0)
                .unwrap_or(0.0)
                .max(0.0)
        }
        _ => 0.0,
    }
}

/// Reduce a completed observation sequence for `scenario`.
pub fn aggregate(scenario: &Scenario, observations: &[Observation]) -> Verdict {
    let frequency = frequency_table(observations);
    let total_sent = observations.len();
    let successful = frequency.values().sum::<usize>();
    let failed = total_sent - successful;

    let elapsed = elapsed_seconds(observations);
    let requests_per_second = if elapsed > 0.0 {
        successful as f64 / elapsed
    } else {
        0.0
    };

    let first_target_at = observations
        .iter()
        .find(|o| o.is_classified_as(&scenario.target_classification))
        .map(|o| o.sequence_number);

    let mut latencies: Vec<f64> = observations
        .iter()
        .filter(|o| !o.is_failed())
        .map(|o| o.latency_seconds * 1000.0)
        .collect();
    latencies.sort_by(f64::total_cmp);

    let passed = evaluate(&frequency, &scenario.target_classification, scenario.expect_target);
    let median_latency_ms = percentile(&latencies, 0.5);

    let failure_causes = if passed {
        Vec::new()
    } else if scenario.expect_target {
        vec![
            format!(
                "Requests not sent fast enough (achieved {:.2} req/s, need more than {} req/s)",
                requests_per_second, DETECTION_RATE_THRESHOLD
            ),
            "Backend not deployed with the updated detection".to_string(),
            format!(
                "Network latency spreading requests out (median round trip {:.0} ms)",
                median_latency_ms
            ),
        ]
    } else {
        vec![format!(
            "Normal-rate traffic flagged as {} {} time(s): detection is over-eager",
            scenario.target_classification,
            frequency.get(&scenario.target_classification).copied().unwrap_or(0)
        )]
    };

    let mut warnings = Vec::new();
    if total_sent > 0 && successful == 0 {
        warnings.push(format!(
            "All {} requests failed; the frequency table is empty and the verdict is not meaningful",
            total_sent
        ));
    } else if failed > 0 {
        warnings.push(format!("{} of {} requests failed and were not classified", failed, total_sent));
    }

    Verdict {
        scenario: scenario.name.clone(),
        target_classification: scenario.target_classification.clone(),
        expect_target: scenario.expect_target,
        total_sent,
        successful,
        failed,
        elapsed_seconds: elapsed,
        requests_per_second,
        nominal_rate: scenario.nominal_rate(),
        frequency,
        first_target_at,
        median_latency_ms,
        p99_latency_ms: percentile(&latencies, 0.99),
        max_latency_ms: latencies.last().copied().unwrap_or(0.0),
        passed,
        failure_causes,
        warnings,
    }
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = (sorted.len() as f64 * p) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Scenario: {} ===", self.scenario)?;
        writeln!(
            f,
            "Expectation:       {} {}",
            self.target_classification,
            if self.expect_target { "detected" } else { "not detected" }
        )?;
        writeln!(
            f,
            "Total Requests:    {} ({} classified, {} failed)",
            self.total_sent, self.successful, self.failed
        )?;
        writeln!(f, "Total Time:        {:.2}s", self.elapsed_seconds)?;
        match self.nominal_rate {
            Some(nominal) => writeln!(
                f,
                "Request Rate:      {:.2} req/sec (nominal {:.2})",
                self.requests_per_second, nominal
            )?,
            None => writeln!(
                f,
                "Request Rate:      {:.2} req/sec (nominal: unpaced)",
                self.requests_per_second
            )?,
        }
        writeln!(f)?;
        writeln!(f, "--- Classification Breakdown ---")?;
        if self.frequency.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for (label, count) in &self.frequency {
            writeln!(f, "  • {}: {}", label, count)?;
        }
        if let Some(seq) = self.first_target_at {
            writeln!(f, "First {} at request #{}", self.target_classification, seq)?;
        }
        writeln!(f)?;
        writeln!(f, "--- Latency ---")?;
        writeln!(f, "Median:            {:.0} ms", self.median_latency_ms)?;
        writeln!(f, "P99:               {:.0} ms", self.p99_latency_ms)?;
        writeln!(f, "Max:               {:.0} ms", self.max_latency_ms)?;
        writeln!(f)?;
        for warning in &self.warnings {
            writeln!(f, "⚠️  {}", warning)?;
        }
        if self.passed {
            writeln!(f, "✅ PASSED")?;
        } else {
            writeln!(f, "❌ FAILED. Possible reasons:")?;
            for cause in &self.failure_causes {
                writeln!(f, "   - {}", cause)?;
            }
        }
        Ok(())
    }
}
