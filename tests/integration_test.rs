// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! End-to-end tests: the HTTP probe against local servers.

mod harness;

use axum::{http::StatusCode, routing::post, Json, Router};
use brute_force_harness::config::MockConfig;
use brute_force_harness::observation::{FailureKind, Outcome, StatusValue};
use brute_force_harness::{Config, HttpProbe, Probe, Scenario, ScenarioRunner, Selection};
use harness::servers::{analyze_url, closed_port, spawn_mock, spawn_router};
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_test::assert_ok;

fn probe_for(url: &str) -> HttpProbe {
    assert_ok!(HttpProbe::new(url, Duration::from_secs(5)))
}

#[tokio::test]
async fn test_burst_against_mock_is_detected() {
    let addr = spawn_mock(MockConfig::default()).await;
    let probe = probe_for(&analyze_url(addr));

    let run = ScenarioRunner::new(&probe).run(&Scenario::burst()).await;
    let verdict = run.verdict();
    println!("{}", verdict);

    assert_eq!(run.observations.len(), 10);
    assert!(run.observations.iter().all(|o| !o.is_failed()));
    assert_eq!(run.first_target_at, Some(6));
    assert_eq!(verdict.frequency.get("Brute Force"), Some(&5));
    assert_eq!(verdict.frequency.get("Benign"), Some(&5));
    assert!(verdict.passed);
}

#[tokio::test]
async fn test_control_against_mock_is_not_flagged() {
    let addr = spawn_mock(MockConfig::default()).await;
    let probe = probe_for(&analyze_url(addr));

    let run = ScenarioRunner::new(&probe).run(&Scenario::control()).await;
    let verdict = run.verdict();

    assert!(verdict.passed, "{}", verdict);
    assert!(!verdict.frequency.contains_key("Brute Force"));
    // 4 pauses of 0.5s
    assert!(run.wall_time >= Duration::from_secs(2));
}

#[tokio::test]
async fn test_suite_against_mock() {
    let addr = spawn_mock(MockConfig::default()).await;
    let config = Config {
        endpoint: analyze_url(addr),
        cooldown_ms: 1100,
        ..Default::default()
    };
    assert_ok!(config.validate());
    let probe = assert_ok!(HttpProbe::from_config(&config));

    let report = brute_force_harness::run_suite(&config, Selection::All, &probe).await;
    assert!(report.all_passed());
}

#[tokio::test]
async fn test_probe_reads_backend_fields() {
    let router = Router::new().route(
        "/analyze",
        post(|| async {
            Json(serde_json::json!({
                "status": 202,
                "message": "queued",
                "analysis": {"verdict": "XSS", "confidence": 0.42}
            }))
        }),
    );
    let addr = spawn_router(router).await;
    let probe = probe_for(&analyze_url(addr));

    let observation = probe.probe("admin", 1).await;
    match observation.outcome {
        Outcome::Classified(c) => {
            assert_eq!(c.verdict, "XSS");
            assert_eq!(c.status, StatusValue::Code(202));
            assert_eq!(c.message, "queued");
            assert!((c.confidence - 0.42).abs() < f64::EPSILON);
        }
        other => panic!("expected a classification, got {:?}", other),
    }
    assert!(observation.latency_seconds >= 0.0);
}

#[tokio::test]
async fn test_error_status_without_body_fields_uses_transport_status() {
    let router = Router::new().route(
        "/analyze",
        post(|| async { (StatusCode::TOO_MANY_REQUESTS, Json(serde_json::json!({}))) }),
    );
    let addr = spawn_router(router).await;
    let probe = probe_for(&analyze_url(addr));

    let observation = probe.probe("admin", 4).await;
    assert_eq!(observation.sequence_number, 4);
    assert_eq!(observation.classification(), Some("Unknown"));
    match observation.outcome {
        Outcome::Classified(c) => assert_eq!(c.status, StatusValue::Code(429)),
        other => panic!("expected a classification, got {:?}", other),
    }
}

#[tokio::test]
async fn test_non_json_body_is_malformed() {
    let router = Router::new().route("/analyze", post(|| async { "<html>502 Bad Gateway</html>" }));
    let addr = spawn_router(router).await;
    let probe = probe_for(&analyze_url(addr));

    let observation = probe.probe("admin", 1).await;
    assert!(matches!(
        observation.outcome,
        Outcome::Failed { kind: FailureKind::MalformedResponse, .. }
    ));
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let router = Router::new().route(
        "/analyze",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Json(serde_json::json!({}))
        }),
    );
    let addr = spawn_router(router).await;
    let probe = assert_ok!(HttpProbe::new(&analyze_url(addr), Duration::from_secs(1)));

    let observation = probe.probe("admin", 1).await;
    assert!(matches!(
        observation.outcome,
        Outcome::Failed { kind: FailureKind::Timeout, .. }
    ));
    assert!(observation.latency_seconds < 3.0);
}

#[tokio::test]
async fn test_unreachable_backend_consumes_full_budget() {
    let addr = closed_port().await;
    let probe = probe_for(&analyze_url(addr));

    let scenario = Scenario {
        request_budget: 3,
        ..Scenario::burst()
    };
    let run = ScenarioRunner::new(&probe).run(&scenario).await;

    assert_eq!(run.observations.len(), 3);
    assert!(run.observations.iter().all(|o| matches!(
        o.outcome,
        Outcome::Failed { kind: FailureKind::Transport, .. }
    )));
    let verdict = run.verdict();
    assert!(verdict.frequency.is_empty());
    assert!(!verdict.passed);
    assert!(verdict.warnings[0].contains("All 3 requests failed"));
}

/// Collects formatted log output in memory.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_progress_line_keeps_backend_message_apart() {
    let router = Router::new().route(
        "/analyze",
        post(|| async {
            Json(serde_json::json!({
                "status": "success",
                "message": "Request analyzed",
                "analysis": {"verdict": "Benign", "confidence": 0.1}
            }))
        }),
    );
    let addr = spawn_router(router).await;
    let probe = probe_for(&analyze_url(addr));

    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    probe.probe("admin", 1).await;

    let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
    let line = output
        .lines()
        .filter_map(|l| serde_json::from_str::<serde_json::Value>(l).ok())
        .find(|v| v["fields"]["sequence"] == 1)
        .expect("progress line for request #1");
    let message = line["fields"]["message"].as_str().unwrap();
    assert!(message.starts_with("Request #1: Benign ("), "{}", message);
    assert_eq!(line["fields"]["backend_message"], "Request analyzed");
}

#[tokio::test]
async fn test_json_report_is_alone_on_stdout() {
    let addr = spawn_mock(MockConfig::default()).await;
    let endpoint = analyze_url(addr);

    let output = tokio::task::spawn_blocking(move || {
        std::process::Command::new(env!("CARGO_BIN_EXE_brute-force-harness"))
            .args(["run", "--endpoint", &endpoint, "--scenario", "burst", "--format", "json"])
            .env("RUST_LOG", "info")
            .env_remove("PROBE_ENDPOINT")
            .env_remove("PROBE_TIMEOUT_SECS")
            .env_remove("PROBE_COOLDOWN_MS")
            .output()
    })
    .await
    .unwrap()
    .unwrap();

    assert!(output.status.success());
    let report: serde_json::Value = assert_ok!(serde_json::from_slice(&output.stdout));
    assert_eq!(report["burst"]["verdict"]["passed"], true);
    assert!(report.get("control").is_none());
    // Progress lines still reach stderr
    assert!(String::from_utf8_lossy(&output.stderr).contains("Request #10"));
}
