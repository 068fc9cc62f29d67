/*
 *  Copyright 2025-2026 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! Fan-out, concurrency bound and abort behaviour of the batch orchestrator.

use batchsign::{BatchError, BatchSigner, BatchSignerConfig, HashMode, SigningJob};
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::common::{Behavior, Event, Harness, MockPrimitive, RecordingSink, UnavailableCredentials};

fn job(files: &[&str]) -> SigningJob {
    SigningJob::builder("integration", HashMode::Sha256)
        .description("integration test batch")
        .files(files.iter().copied())
        .build()
}

fn names(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("package-{i:02}.vsix")).collect()
}

#[tokio::test(start_paused = true)]
async fn test_never_more_than_four_files_in_flight() {
    let harness = Harness::new(|log| {
        MockPrimitive::new(Behavior::Succeed, log).with_work(Duration::from_secs(1))
    });
    let files = names(10);
    let refs: Vec<&str> = files.iter().map(String::as_str).collect();

    let report = harness.signer.sign_batch(job(&refs)).await.unwrap();

    assert_eq!(report.files.len(), 10);
    assert_eq!(harness.primitive.max_in_flight(), 4);
    assert_eq!(harness.primitive.total_attempts(), 10);
}

#[tokio::test(start_paused = true)]
async fn test_configuration_is_built_once_per_batch() {
    let harness = Harness::new(|log| MockPrimitive::new(Behavior::FailTimes(1), log));
    let files = names(6);
    let refs: Vec<&str> = files.iter().map(String::as_str).collect();

    harness.signer.sign_batch(job(&refs)).await.unwrap();

    assert_eq!(harness.credentials.token_requests.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_submitted_event_precedes_first_attempt() {
    let harness = Harness::new(|log| {
        MockPrimitive::new(Behavior::Succeed, log).with_work(Duration::from_millis(500))
    });
    let files = names(7);
    let refs: Vec<&str> = files.iter().map(String::as_str).collect();

    harness.signer.sign_batch(job(&refs)).await.unwrap();

    let events = harness.events();
    for file in &files {
        let path = PathBuf::from(file);
        let submitted = events
            .iter()
            .position(|e| *e == Event::Submitted(path.clone()))
            .expect("submitted event missing");
        let attempted = events
            .iter()
            .position(|e| *e == Event::Attempt(path.clone()))
            .expect("attempt missing");
        assert!(submitted < attempted, "{file} attempted before submission");
    }
}

#[tokio::test(start_paused = true)]
async fn test_report_follows_job_order() {
    let harness = Harness::new(|log| {
        MockPrimitive::new(Behavior::Succeed, log)
            .with_behavior("first.vsix", Behavior::FailTimes(1))
    });

    let report = harness
        .signer
        .sign_batch(job(&["first.vsix", "second.vsix", "third.vsix"]))
        .await
        .unwrap();

    let order: Vec<&Path> = report.files.iter().map(|o| o.path.as_path()).collect();
    assert_eq!(
        order,
        vec![
            Path::new("first.vsix"),
            Path::new("second.vsix"),
            Path::new("third.vsix")
        ]
    );
    assert_eq!(report.job_name, "integration");
    assert_eq!(report.outcome(Path::new("first.vsix")).unwrap().attempts, 2);
}

#[tokio::test(start_paused = true)]
async fn test_slow_file_times_out_and_aborts_batch() {
    let harness = Harness::new(|log| {
        MockPrimitive::new(Behavior::Succeed, log).with_behavior("stuck.vsix", Behavior::Hang)
    });

    let error = harness
        .signer
        .sign_batch(job(&["ok.vsix", "stuck.vsix"]))
        .await
        .unwrap_err();

    match error {
        BatchError::Timeout { path, waited } => {
            assert_eq!(path, PathBuf::from("stuck.vsix"));
            assert_eq!(waited, Duration::from_secs(60));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(harness.primitive.is_signed("ok.vsix"));
    assert!(!harness.primitive.is_signed("stuck.vsix"));
}

#[tokio::test(start_paused = true)]
async fn test_abort_cancels_files_still_in_flight() {
    let harness = Harness::new(|log| {
        MockPrimitive::new(Behavior::Succeed, log)
            .with_behavior("broken.vsix", Behavior::AlwaysFail)
            .with_behavior("stuck.vsix", Behavior::Hang)
    });

    let error = harness
        .signer
        .sign_batch(job(&["broken.vsix", "stuck.vsix"]))
        .await
        .unwrap_err();
    assert_eq!(error.path(), Some(Path::new("broken.vsix")));

    // Long after the hanging call would have finished, it never completes.
    tokio::time::sleep(Duration::from_secs(7200)).await;
    assert!(!harness.primitive.is_signed("stuck.vsix"));
}

#[tokio::test(start_paused = true)]
async fn test_credential_failure_touches_no_file() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let primitive = Arc::new(MockPrimitive::new(Behavior::Succeed, log.clone()));
    let sink = Arc::new(RecordingSink::new(log));
    let signer = BatchSigner::new(
        Arc::new(UnavailableCredentials),
        primitive.clone(),
        sink.clone(),
        BatchSignerConfig::default(),
    );

    let error = signer.sign_batch(job(&["a.vsix", "b.vsix"])).await.unwrap_err();

    assert!(matches!(error, BatchError::Credential(_)));
    assert_eq!(primitive.total_attempts(), 0);
    assert!(sink.submitted().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_spawned_batch_runs_in_background() {
    let harness = Harness::new(|log| MockPrimitive::new(Behavior::Succeed, log));

    let handle = harness.signer.spawn_batch(job(&["a.vsix", "b.vsix"]));
    let report = handle.await.expect("batch task panicked").unwrap();

    assert_eq!(report.files.len(), 2);
    assert!(harness.primitive.is_signed("a.vsix"));
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_paths_are_signed_once() {
    let harness = Harness::new(|log| MockPrimitive::new(Behavior::Succeed, log));

    let report = harness
        .signer
        .sign_batch(job(&["a.vsix", "a.vsix", "b.vsix"]))
        .await
        .unwrap();

    assert_eq!(report.files.len(), 2);
    assert_eq!(harness.primitive.attempt_count("a.vsix"), 1);
    assert_eq!(harness.sink.submitted().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_empty_job_completes() {
    let harness = Harness::new(|log| MockPrimitive::new(Behavior::Succeed, log));

    let report = harness.signer.sign_batch(job(&[])).await.unwrap();

    assert!(report.files.is_empty());
    assert_eq!(harness.primitive.total_attempts(), 0);
}
