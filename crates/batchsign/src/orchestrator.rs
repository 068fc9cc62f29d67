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

//! Batch orchestrator.
//!
//! The [`BatchSigner`] is responsible for:
//! - Building the signing configuration once per batch
//! - Fanning files out over a fixed pool of four concurrency slots
//! - Bounding how long each file's signer may run
//! - Failing the batch on the first fatal error and cancelling the rest
//!
//! Each file runs in its own tokio task that first acquires a semaphore
//! permit, so at most four signers are in flight at any instant. When a file
//! fails or times out, the semaphore is closed and the remaining tasks are
//! aborted; dropping their futures cancels the underlying primitive calls.
//! Files that already finished keep their signatures.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::{BatchSignerConfig, MAX_CONCURRENT_FILES};
use crate::configuration::SigningConfiguration;
use crate::credentials::CredentialProvider;
use crate::error::BatchError;
use crate::job::SigningJob;
use crate::primitive::PackageSignaturePrimitive;
use crate::report::{BatchReport, FileOutcome};
use crate::signer::FileSigner;
use crate::telemetry::{Telemetry, TelemetrySink};

/// Signs batches of package files.
pub struct BatchSigner {
    credentials: Arc<dyn CredentialProvider>,
    signer: FileSigner,
    telemetry: Telemetry,
    config: BatchSignerConfig,
}

impl BatchSigner {
    /// Creates a new BatchSigner.
    ///
    /// # Arguments
    /// * `credentials` - Source of the access token and certificate metadata
    /// * `primitive` - Package signature and timestamp primitive
    /// * `sink` - Receives submitted events and per-attempt dependency records
    /// * `config` - Tool name and time unit
    pub fn new(
        credentials: Arc<dyn CredentialProvider>,
        primitive: Arc<dyn PackageSignaturePrimitive>,
        sink: Arc<dyn TelemetrySink>,
        config: BatchSignerConfig,
    ) -> Self {
        let telemetry = Telemetry::new(sink, config.tool_name());
        let signer = FileSigner::new(primitive, telemetry.clone(), config.clone());

        Self {
            credentials,
            signer,
            telemetry,
            config,
        }
    }

    /// Runs [`sign_batch`](Self::sign_batch) on its own tokio task.
    ///
    /// The caller keeps control of its own execution context and can await
    /// the returned handle whenever it needs the result.
    pub fn spawn_batch(
        self: &Arc<Self>,
        job: SigningJob,
    ) -> JoinHandle<Result<BatchReport, BatchError>> {
        let batch_signer = Arc::clone(self);
        tokio::spawn(async move { batch_signer.sign_batch(job).await })
    }

    /// Signs every file in `job`.
    ///
    /// # Errors
    ///
    /// - [`BatchError::Credential`] if the configuration cannot be built; no
    ///   file is touched
    /// - [`BatchError::RetriesExhausted`] naming the first file whose three
    ///   attempts all failed
    /// - [`BatchError::Timeout`] naming the first file whose signer did not
    ///   resolve within 60 time units
    pub async fn sign_batch(&self, job: SigningJob) -> Result<BatchReport, BatchError> {
        let batch_id = Uuid::new_v4();
        info!(
            batch_id = %batch_id,
            job = %job.name(),
            description = job.description().unwrap_or("<none>"),
            description_url = job.description_url().map(|u| u.as_str()).unwrap_or("<none>"),
            filter = job.file_filter().unwrap_or("<none>"),
            files = job.files().len(),
            "Starting signing batch"
        );

        let configuration = Arc::new(
            SigningConfiguration::build(self.credentials.as_ref(), job.hash_mode())
                .await
                .inspect_err(|e| {
                    error!(batch_id = %batch_id, error = %e, "Cannot build signing configuration");
                })?,
        );

        let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_FILES));
        let mut tasks = JoinSet::new();

        for (index, path) in job.files().iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let configuration = Arc::clone(&configuration);
            let signer = self.signer.clone();
            let telemetry = self.telemetry.clone();
            let wait = self.config.file_wait();
            let path = path.clone();

            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return Err(BatchError::WorkerFailed(format!(
                        "batch aborted before {} started",
                        path.display()
                    )));
                };

                telemetry.file_submitted(&path);

                match tokio::time::timeout(wait, signer.sign_file(&path, &configuration)).await {
                    Ok(result) => result.map(|outcome| (index, outcome)),
                    Err(_) => Err(BatchError::Timeout {
                        path,
                        waited: wait,
                    }),
                }
            });
        }

        let mut outcomes: Vec<(usize, FileOutcome)> = Vec::with_capacity(job.files().len());

        while let Some(joined) = tasks.join_next().await {
            let failure = match joined {
                Ok(Ok(outcome)) => {
                    outcomes.push(outcome);
                    continue;
                }
                Ok(Err(error)) => error,
                Err(join_error) => BatchError::WorkerFailed(join_error.to_string()),
            };

            semaphore.close();
            let outstanding = tasks.len();
            tasks.shutdown().await;

            error!(
                batch_id = %batch_id,
                path = %failure.path().map(|p| p.display().to_string()).unwrap_or_default(),
                completed = outcomes.len(),
                cancelled = outstanding,
                error = %failure,
                "Signing batch aborted"
            );
            return Err(failure);
        }

        outcomes.sort_by_key(|(index, _)| *index);
        let files: Vec<FileOutcome> = outcomes.into_iter().map(|(_, outcome)| outcome).collect();
        let retried: Vec<&PathBuf> = files
            .iter()
            .filter(|outcome| outcome.was_retried())
            .map(|outcome| &outcome.path)
            .collect();

        debug!(batch_id = %batch_id, retried = ?retried, "Files that needed retries");
        info!(
            batch_id = %batch_id,
            job = %job.name(),
            files = files.len(),
            "Signing batch completed"
        );

        Ok(BatchReport {
            batch_id,
            job_name: job.name().to_string(),
            files,
        })
    }
}

impl std::fmt::Debug for BatchSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchSigner")
            .field("signer", &self.signer)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
