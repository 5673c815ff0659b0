use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use finsight_client::{spawn_processing, FetchError, SimulatedStatus, StatusSource};
use finsight_core::{validate, ProcessingConfig, ProcessingState, Status, StatusUpdate};
use tokio::time::Instant;

fn fast_config() -> ProcessingConfig {
    ProcessingConfig {
        upload_step_delay: Duration::from_millis(200),
        upload_step_percent: 10,
        poll_interval: Duration::from_millis(2500),
        max_duration: Duration::from_secs(10),
        ..ProcessingConfig::default()
    }
}

/// Completes on the `finish_on`th check; records when each check started and ended.
struct Scripted {
    calls: Arc<Mutex<Vec<(Instant, Instant)>>>,
    finish_on: usize,
    check_takes: Duration,
}

impl StatusSource for Scripted {
    fn check(
        &mut self,
        _statement_id: &str,
        _elapsed: Duration,
    ) -> impl Future<Output = Result<StatusUpdate, FetchError>> + Send {
        let calls = self.calls.clone();
        let finish_on = self.finish_on;
        let takes = self.check_takes;
        async move {
            let start = Instant::now();
            tokio::time::sleep(takes).await;
            let mut calls = calls.lock().unwrap();
            calls.push((start, Instant::now()));
            if calls.len() >= finish_on {
                Ok(StatusUpdate::Completed)
            } else {
                Ok(StatusUpdate::InProgress {
                    progress: (calls.len() * 20) as f64,
                    estimated_time_seconds: Some(60),
                    message: None,
                })
            }
        }
    }
}

struct Broken;

impl StatusSource for Broken {
    fn check(
        &mut self,
        _statement_id: &str,
        _elapsed: Duration,
    ) -> impl Future<Output = Result<StatusUpdate, FetchError>> + Send {
        async {
            Err(FetchError::Http {
                status: 500,
                reason: "Internal Server Error".to_string(),
            })
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_simulated_cycle_completes() {
    let candidate = validate("bank_statement.pdf", 1024 * 1024).unwrap();
    let config = fast_config();
    let source = SimulatedStatus::new(config.max_duration);
    let handle = spawn_processing(candidate, config, source);

    let end = handle.wait().await.expect("cycle not cancelled");
    assert_eq!(end.status, Status::Completed);
    assert_eq!(end.progress, 100.0);
    assert_eq!(end.overall_progress, 100.0);
    assert!(end.statement_id.as_deref().unwrap().starts_with("stmt_"));
    assert_eq!(end.visible_eta(), None);
}

#[tokio::test(start_paused = true)]
async fn test_overall_progress_never_decreases() {
    let candidate = validate("march.csv", 4096).unwrap();
    let config = fast_config();
    let source = SimulatedStatus::new(config.max_duration);
    let handle = spawn_processing(candidate, config, source);

    let mut rx = handle.subscribe();
    let mut seen: Vec<ProcessingState> = Vec::new();
    while rx.changed().await.is_ok() {
        seen.push(rx.borrow_and_update().clone());
    }
    handle.wait().await;

    assert!(seen.len() > 3, "saw {} snapshots", seen.len());
    for w in seen.windows(2) {
        assert!(
            w[1].overall_progress >= w[0].overall_progress,
            "{} -> {}",
            w[0].overall_progress,
            w[1].overall_progress
        );
    }
    assert!(seen.iter().any(|s| s.status == Status::Uploading));
    assert!(seen.iter().any(|s| s.status == Status::Processing));
    assert_eq!(seen.last().unwrap().status, Status::Completed);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_upload_stops_cycle() {
    let candidate = validate("march.pdf", 4096).unwrap();
    let config = fast_config();
    let source = SimulatedStatus::new(config.max_duration);
    let handle = spawn_processing(candidate, config, source);

    tokio::time::sleep(Duration::from_millis(500)).await;
    let mid = handle.latest();
    assert_eq!(mid.status, Status::Uploading);
    assert!(mid.progress < 100.0);

    handle.cancel();
    assert_eq!(handle.wait().await, None);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_polling_discards_late_result() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let source = Scripted {
        calls: calls.clone(),
        finish_on: 100,
        check_takes: Duration::from_secs(1),
    };
    let candidate = validate("march.pdf", 4096).unwrap();
    let handle = spawn_processing(candidate, fast_config(), source);

    // upload is 11 steps of 200ms; land inside the first status check
    tokio::time::sleep(Duration::from_millis(2200) + Duration::from_millis(500)).await;
    handle.cancel();
    let before = handle.latest();
    assert_eq!(handle.wait().await, None);
    assert_eq!(before.status, Status::Processing);
}

#[tokio::test(start_paused = true)]
async fn test_checks_never_overlap() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let source = Scripted {
        calls: calls.clone(),
        finish_on: 4,
        check_takes: Duration::from_secs(4),
    };
    let config = fast_config();
    let poll = config.poll_interval;
    let candidate = validate("march.pdf", 4096).unwrap();

    let end = spawn_processing(candidate, config, source).wait().await.unwrap();
    assert_eq!(end.status, Status::Completed);

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 4);
    for w in calls.windows(2) {
        let (_, prev_end) = w[0];
        let (next_start, _) = w[1];
        assert!(next_start >= prev_end + poll);
    }
}

#[tokio::test(start_paused = true)]
async fn test_service_error_fails_cycle() {
    let candidate = validate("march.pdf", 4096).unwrap();
    let end = spawn_processing(candidate, fast_config(), Broken)
        .wait()
        .await
        .unwrap();
    assert_eq!(end.status, Status::Failed);
    assert_eq!(end.progress, 0.0);
    assert!(end.message.contains("analysis service"));
    assert!(end.message.contains("500 Internal Server Error"));
}

#[tokio::test(start_paused = true)]
async fn test_unresolved_processing_fails_at_deadline() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let source = Scripted {
        calls: calls.clone(),
        finish_on: usize::MAX,
        check_takes: Duration::ZERO,
    };
    let config = fast_config();
    let deadline = config.poll_deadline();
    let candidate = validate("march.pdf", 4096).unwrap();

    let begun = Instant::now();
    let end = spawn_processing(candidate, config, source).wait().await.unwrap();
    assert_eq!(end.status, Status::Failed);
    assert!(end.message.contains("no result after 30s"), "message: {}", end.message);
    assert!(begun.elapsed() >= deadline);

    let calls = calls.lock().unwrap();
    let last_check = calls.last().unwrap().0;
    assert!(last_check - calls[0].0 >= deadline);
}
