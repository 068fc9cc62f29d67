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

//! Per-file signing with retry.
//!
//! The [`FileSigner`] drives one file through the [`RetrySchedule`]:
//! 1. Waits the scheduled delay (none before the first attempt)
//! 2. Opens, signs and, when a timestamp URL is configured, timestamps the file
//! 3. Emits a dependency record for the attempt, whatever its outcome
//! 4. Returns on the first success, or fails once three attempts have failed

use std::path::Path;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::{BatchSignerConfig, MAX_ATTEMPTS};
use crate::configuration::SigningConfiguration;
use crate::error::{BatchError, TransientSigningError};
use crate::primitive::{PackageSignaturePrimitive, TimestampOutcome};
use crate::report::FileOutcome;
use crate::retry::RetrySchedule;
use crate::telemetry::{DependencyTimer, Telemetry};

/// Signs single files, retrying transient failures.
#[derive(Clone)]
pub struct FileSigner {
    primitive: Arc<dyn PackageSignaturePrimitive>,
    telemetry: Telemetry,
    config: BatchSignerConfig,
}

impl FileSigner {
    pub fn new(
        primitive: Arc<dyn PackageSignaturePrimitive>,
        telemetry: Telemetry,
        config: BatchSignerConfig,
    ) -> Self {
        Self {
            primitive,
            telemetry,
            config,
        }
    }

    /// Signs `path`, retrying up to three attempts in total.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::RetriesExhausted`] carrying the last attempt's
    /// error when every attempt failed.
    pub async fn sign_file(
        &self,
        path: &Path,
        configuration: &SigningConfiguration,
    ) -> Result<FileOutcome, BatchError> {
        let mut schedule = RetrySchedule::new();
        let started = Instant::now();
        let description = describe(path, configuration);

        while let Some(plan) = schedule.next_attempt() {
            if plan.delay_units > 0.0 {
                let delay = self.config.units(plan.delay_units);
                info!(
                    path = %path.display(),
                    attempt = plan.attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying signing after backoff"
                );
                tokio::time::sleep(delay).await;
            }

            let timer = DependencyTimer::start();
            let result = self.attempt(path, configuration).await;
            let call = self
                .telemetry
                .dependency_call(timer, description.as_str(), result.is_err());

            match result {
                Ok(timestamped) => {
                    info!(
                        path = %path.display(),
                        attempt = plan.attempt,
                        duration_ms = call.duration.as_millis() as u64,
                        timestamped,
                        "File signed"
                    );
                    return Ok(FileOutcome {
                        path: path.to_path_buf(),
                        attempts: plan.attempt,
                        elapsed_seconds: started.elapsed().as_secs_f64(),
                        timestamped,
                    });
                }
                Err(last_error) if schedule.is_exhausted() => {
                    error!(
                        path = %path.display(),
                        attempts = plan.attempt,
                        error = %last_error,
                        "Signing failed permanently"
                    );
                    return Err(BatchError::RetriesExhausted {
                        path: path.to_path_buf(),
                        attempts: plan.attempt,
                        last_error,
                    });
                }
                Err(attempt_error) => {
                    warn!(
                        path = %path.display(),
                        attempt = plan.attempt,
                        max_attempts = MAX_ATTEMPTS,
                        error = %attempt_error,
                        "Signing attempt failed"
                    );
                    schedule.record_failure();
                }
            }
        }

        Err(BatchError::WorkerFailed(format!(
            "no signing attempt was made for {}",
            path.display()
        )))
    }

    /// One open/sign/timestamp pass. Returns whether a timestamp was embedded.
    async fn attempt(
        &self,
        path: &Path,
        configuration: &SigningConfiguration,
    ) -> Result<bool, TransientSigningError> {
        let mut package = self
            .primitive
            .open_for_signing(path)
            .await
            .map_err(TransientSigningError::Open)?;

        let mut signature = package
            .sign_with_preset(configuration)
            .await
            .map_err(TransientSigningError::Sign)?;
        debug!(path = %path.display(), "Signature embedded");

        let Some(url) = configuration.timestamp_url() else {
            return Ok(false);
        };

        let outcome = signature
            .timestamp(url, configuration.file_digest_algorithm())
            .await
            .map_err(TransientSigningError::Timestamp)?;

        match outcome {
            TimestampOutcome::Success => Ok(true),
            TimestampOutcome::Failed => {
                Err(TransientSigningError::TimestampRejected { url: url.clone() })
            }
        }
    }
}

impl std::fmt::Debug for FileSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSigner")
            .field("telemetry", &self.telemetry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Dependency tag: file name, digest and timestamp authority.
fn describe(path: &Path, configuration: &SigningConfiguration) -> String {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let timestamp = configuration
        .timestamp_url()
        .map(|url| url.to_string())
        .unwrap_or_else(|| "no timestamp".to_string());

    format!(
        "{}, {}, {}",
        file_name,
        configuration.file_digest_algorithm(),
        timestamp
    )
}
