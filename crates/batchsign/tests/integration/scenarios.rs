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

//! End-to-end batch scenarios.

use batchsign::{BatchError, HashMode, SigningJob};
use std::path::{Path, PathBuf};

use crate::common::{Behavior, Harness, MockPrimitive};

#[tokio::test(start_paused = true)]
async fn test_three_files_all_signed_first_time() {
    let harness = Harness::new(|log| MockPrimitive::new(Behavior::Succeed, log));
    let job = SigningJob::builder("release", HashMode::Sha256)
        .files(["a.vsix", "b.vsix", "c.vsix"])
        .build();

    let report = harness.signer.sign_batch(job).await.unwrap();

    assert_eq!(report.files.len(), 3);
    assert_eq!(report.total_attempts(), 3);
    assert!(report.files.iter().all(|o| !o.was_retried() && o.timestamped));

    let mut submitted = harness.sink.submitted();
    submitted.sort();
    assert_eq!(
        submitted,
        vec![
            PathBuf::from("a.vsix"),
            PathBuf::from("b.vsix"),
            PathBuf::from("c.vsix")
        ]
    );

    let calls = harness.sink.calls();
    assert_eq!(calls.len(), 3);
    assert!(calls.iter().all(|c| !c.failed));
}

#[tokio::test(start_paused = true)]
async fn test_one_failing_file_fails_the_batch() {
    let harness = Harness::new(|log| {
        MockPrimitive::new(Behavior::Succeed, log).with_behavior("bad.vsix", Behavior::AlwaysFail)
    });
    let job = SigningJob::builder("release", HashMode::Sha256)
        .files(["bad.vsix", "good.vsix"])
        .build();

    let error = harness.signer.sign_batch(job).await.unwrap_err();

    assert!(matches!(error, BatchError::RetriesExhausted { attempts: 3, .. }));
    assert_eq!(error.path(), Some(Path::new("bad.vsix")));
    assert!(error.to_string().contains("bad.vsix"));
    assert!(harness.primitive.is_signed("good.vsix"));
    assert_eq!(harness.primitive.attempt_count("bad.vsix"), 3);
}

#[tokio::test(start_paused = true)]
async fn test_completed_files_stay_signed_after_abort() {
    let harness = Harness::new(|log| {
        MockPrimitive::new(Behavior::Succeed, log).with_behavior("e.vsix", Behavior::AlwaysFail)
    });
    let job = SigningJob::builder("release", HashMode::Sha1)
        .files(["a.vsix", "b.vsix", "c.vsix", "d.vsix", "e.vsix"])
        .build();

    let error = harness.signer.sign_batch(job).await.unwrap_err();

    assert_eq!(error.path(), Some(Path::new("e.vsix")));
    for file in ["a.vsix", "b.vsix", "c.vsix", "d.vsix"] {
        assert!(harness.primitive.is_signed(file), "{file} lost its signature");
    }
    assert!(!harness.primitive.is_signed("e.vsix"));
}

#[tokio::test(start_paused = true)]
async fn test_dual_mode_batch_signs_with_sha256() {
    let harness = Harness::new(|log| MockPrimitive::new(Behavior::Succeed, log));
    let job = SigningJob::builder("dual", HashMode::Dual)
        .file("a.vsix")
        .build();

    harness.signer.sign_batch(job).await.unwrap();

    assert!(harness.sink.calls()[0].description.contains("SHA256"));
}
