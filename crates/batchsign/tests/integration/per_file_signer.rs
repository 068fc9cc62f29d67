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

//! Retry behaviour of the per-file signer.

use batchsign::{
    BatchError, BatchSignerConfig, FileSigner, HashMode, SigningConfiguration, Telemetry,
    TransientSigningError,
};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_test::traced_test;

use crate::common::{Behavior, CountingCredentials, MockPrimitive, RecordingSink, TIMESTAMP_URL};

/// Paused-clock timers resolve at millisecond granularity.
const TIMER_SLACK: Duration = Duration::from_millis(2);

struct Fixture {
    signer: FileSigner,
    primitive: Arc<MockPrimitive>,
    sink: Arc<RecordingSink>,
    configuration: SigningConfiguration,
}

async fn fixture(behavior: Behavior, timestamp_url: Option<&str>) -> Fixture {
    let log = Arc::new(Mutex::new(Vec::new()));
    let primitive = Arc::new(MockPrimitive::new(behavior, log.clone()));
    let sink = Arc::new(RecordingSink::new(log));
    let telemetry = Telemetry::new(sink.clone(), "batchsign");
    let signer = FileSigner::new(primitive.clone(), telemetry, BatchSignerConfig::default());
    let configuration =
        SigningConfiguration::build(&CountingCredentials::new(timestamp_url), HashMode::Sha256)
            .await
            .unwrap();

    Fixture {
        signer,
        primitive,
        sink,
        configuration,
    }
}

fn assert_close(actual: Duration, expected_secs: f64) {
    let expected = Duration::from_secs_f64(expected_secs);
    let difference = if actual > expected {
        actual - expected
    } else {
        expected - actual
    };
    assert!(
        difference <= TIMER_SLACK,
        "expected {:?}, got {:?}",
        expected,
        actual
    );
}

#[tokio::test(start_paused = true)]
async fn test_stops_after_first_success() {
    let f = fixture(Behavior::Succeed, Some(TIMESTAMP_URL)).await;

    let outcome = f
        .signer
        .sign_file(Path::new("ext.vsix"), &f.configuration)
        .await
        .unwrap();

    assert_eq!(outcome.attempts, 1);
    assert!(outcome.timestamped);
    assert_eq!(f.primitive.attempt_count("ext.vsix"), 1);

    let calls = f.sink.calls();
    assert_eq!(calls.len(), 1);
    assert!(!calls[0].failed);
    assert_eq!(calls[0].tool_name, "batchsign");
    assert_eq!(calls[0].description, "ext.vsix, SHA256, http://timestamp.example.net/");
}

#[tokio::test(start_paused = true)]
async fn test_fail_fail_succeed_uses_power_law_delays() {
    let f = fixture(Behavior::FailTimes(2), Some(TIMESTAMP_URL)).await;

    let outcome = f
        .signer
        .sign_file(Path::new("flaky.vsix"), &f.configuration)
        .await
        .unwrap();

    assert_eq!(outcome.attempts, 3);
    assert_eq!(f.primitive.attempt_count("flaky.vsix"), 3);

    let gaps = f.primitive.gaps("flaky.vsix");
    assert_eq!(gaps.len(), 2);
    let second = 5f64.powf(1.5);
    let third = second.powf(1.5);
    assert_close(gaps[0], second);
    assert_close(gaps[1], third);

    let failed: Vec<bool> = f.sink.calls().iter().map(|c| c.failed).collect();
    assert_eq!(failed, vec![true, true, false]);
}

#[tokio::test(start_paused = true)]
async fn test_always_failing_file_uses_exactly_three_attempts() {
    let f = fixture(Behavior::AlwaysFail, Some(TIMESTAMP_URL)).await;

    let error = f
        .signer
        .sign_file(Path::new("broken.vsix"), &f.configuration)
        .await
        .unwrap_err();

    match error {
        BatchError::RetriesExhausted {
            ref path,
            attempts,
            last_error: TransientSigningError::Sign(_),
        } => {
            assert_eq!(path, Path::new("broken.vsix"));
            assert_eq!(attempts, 3);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert_eq!(f.primitive.attempt_count("broken.vsix"), 3);
    let calls = f.sink.calls();
    assert_eq!(calls.len(), 3);
    assert!(calls.iter().all(|c| c.failed));
}

#[tokio::test(start_paused = true)]
async fn test_rejected_timestamp_fails_the_attempt() {
    let f = fixture(Behavior::TimestampRejected, Some(TIMESTAMP_URL)).await;

    let error = f
        .signer
        .sign_file(Path::new("ext.vsix"), &f.configuration)
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        BatchError::RetriesExhausted {
            last_error: TransientSigningError::TimestampRejected { .. },
            ..
        }
    ));
    // The signature step itself succeeded and stays embedded.
    assert!(f.primitive.is_signed("ext.vsix"));
    assert_eq!(f.sink.calls().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_timestamp_is_skipped_without_url() {
    let f = fixture(Behavior::TimestampRejected, None).await;

    let outcome = f
        .signer
        .sign_file(Path::new("ext.vsix"), &f.configuration)
        .await
        .unwrap();

    assert_eq!(outcome.attempts, 1);
    assert!(!outcome.timestamped);
    assert_eq!(f.sink.calls()[0].description, "ext.vsix, SHA256, no timestamp");
}

#[traced_test]
#[tokio::test(start_paused = true)]
async fn test_each_retry_and_final_outcome_is_logged() {
    let f = fixture(Behavior::AlwaysFail, None).await;

    let _ = f
        .signer
        .sign_file(Path::new("logged.vsix"), &f.configuration)
        .await;

    assert!(logs_contain("Signing attempt failed"));
    assert!(logs_contain("Retrying signing after backoff"));
    assert!(logs_contain("Signing failed permanently"));
    assert!(logs_contain("logged.vsix"));
}
