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

//! # batchsign
//!
//! Batch signing of package files against a remote key-custody service.
//!
//! A [`SigningJob`] lists the files to sign. The [`BatchSigner`] resolves a
//! single [`SigningConfiguration`] from a [`CredentialProvider`], then fans the
//! files out over a fixed pool of four workers. Each file goes through the
//! [`FileSigner`] retry loop, which delegates the actual work to a
//! [`PackageSignaturePrimitive`] and reports every attempt to a
//! [`TelemetrySink`].
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use batchsign::{BatchSigner, BatchSignerConfig, HashMode, SigningJob};
//!
//! let signer = BatchSigner::new(credentials, primitive, telemetry, BatchSignerConfig::default());
//! let job = SigningJob::builder("nightly", HashMode::Sha256)
//!     .file("dist/extension.vsix")
//!     .build();
//!
//! let report = signer.sign_batch(job).await?;
//! println!("signed {} files", report.files.len());
//! ```
//!
//! The batch is all-or-abort: the first file that exhausts its retries or
//! exceeds the per-file wait bound fails the whole batch and cancels the
//! files still in flight. Files that already completed keep their signatures.

pub mod config;
pub mod configuration;
pub mod credentials;
pub mod digest;
pub mod error;
pub mod job;
pub mod orchestrator;
pub mod primitive;
pub mod report;
pub mod retry;
pub mod signer;
pub mod telemetry;

pub use config::{BatchSignerConfig, BatchSignerConfigBuilder};
pub use configuration::SigningConfiguration;
pub use credentials::{AccessToken, CertificateInfo, CredentialProvider, StaticCredentialProvider};
pub use digest::{resolve_digest_algorithm, DigestAlgorithm, HashMode};
pub use error::{BatchError, CredentialError, PrimitiveError, TransientSigningError};
pub use job::{SigningJob, SigningJobBuilder};
pub use orchestrator::BatchSigner;
pub use primitive::{
    CommandSignaturePrimitive, CommandTemplate, PackageHandle, PackageSignaturePrimitive,
    SignatureHandle, TimestampOutcome,
};
pub use report::{BatchReport, FileOutcome};
pub use retry::{AttemptPlan, RetrySchedule};
pub use signer::FileSigner;
pub use telemetry::{
    DependencyCall, DependencyTimer, FanoutTelemetrySink, MetricsTelemetrySink, Telemetry,
    TelemetrySink, TracingTelemetrySink,
};
