// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Suite driver: burst scenario, cooldown, then the control scenario.
//!
//! Both scenarios hit the same per-origin rate state on the backend, so
//! the control run only starts once the burst run and the cooldown have
//! fully completed.

use crate::config::Config;
use crate::probe::Probe;
use crate::runner::{ScenarioRun, ScenarioRunner};
use crate::scenario::Scenario;
use crate::verdict::Verdict;
use clap::ValueEnum;
use serde::Serialize;
use tracing::info;

/// Which scenarios to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Selection {
    #[default]
    All,
    Burst,
    Control,
}

impl Selection {
    fn includes_burst(self) -> bool {
        matches!(self, Self::All | Self::Burst)
    }

    fn includes_control(self) -> bool {
        matches!(self, Self::All | Self::Control)
    }
}

/// Trace and verdict for one scenario.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub run: ScenarioRun,
    pub verdict: Verdict,
}

impl From<ScenarioRun> for ScenarioReport {
    fn from(run: ScenarioRun) -> Self {
        let verdict = run.verdict();
        Self { run, verdict }
    }
}

/// Results of a whole suite.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SuiteReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub burst: Option<ScenarioReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control: Option<ScenarioReport>,
}

impl SuiteReport {
    pub fn verdicts(&self) -> impl Iterator<Item = &Verdict> {
        self.burst
            .iter()
            .chain(self.control.iter())
            .map(|report| &report.verdict)
    }

    /// True when every scenario that ran passed.
    pub fn all_passed(&self) -> bool {
        self.verdicts().all(|v| v.passed)
    }
}

/// Run one scenario and aggregate it.
pub async fn run_scenario<P: Probe>(scenario: &Scenario, probe: &P) -> ScenarioReport {
    ScenarioRunner::new(probe).run(scenario).await.into()
}

/// Run the selected scenarios in order, with the cooldown between them.
pub async fn run_suite<P: Probe>(config: &Config, selection: Selection, probe: &P) -> SuiteReport {
    let mut report = SuiteReport::default();

    if selection.includes_burst() {
        report.burst = Some(run_scenario(&config.burst_scenario(), probe).await);
    }

    if selection.includes_control() {
        if report.burst.is_some() && !config.cooldown().is_zero() {
            info!(
                cooldown_secs = config.cooldown().as_secs_f64(),
                "Waiting {:.0} seconds before control test",
                config.cooldown().as_secs_f64()
            );
            tokio::time::sleep(config.cooldown()).await;
        }
        report.control = Some(run_scenario(&config.control_scenario(), probe).await);
    }

    report
}
