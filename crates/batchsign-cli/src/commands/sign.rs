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

//! Implementation of the `sign` command.
//!
//! Builds a [`BatchSigner`] from the loaded configuration, signs the listed
//! files as one batch and optionally writes the [`BatchReport`] as JSON.

use anyhow::{Context, Result};
use batchsign::{
    AccessToken, BatchReport, BatchSigner, BatchSignerConfig, CertificateInfo,
    CommandSignaturePrimitive, FanoutTelemetrySink, HashMode, MetricsTelemetrySink,
    SigningJob, StaticCredentialProvider, TracingTelemetrySink,
};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use url::Url;

use crate::config::BatchsignConfig;

#[derive(Debug, Clone, Args)]
pub struct SignArgs {
    /// Digest family: sha1, sha256 or dual
    #[arg(long, default_value = "sha256")]
    pub hash_mode: HashMode,

    /// Job name recorded in logs and the report
    #[arg(long)]
    pub name: String,

    /// Human-readable description of the signed content
    #[arg(long)]
    pub description: Option<String>,

    /// URL describing the signed content
    #[arg(long)]
    pub description_url: Option<Url>,

    /// Filter expression that selected the files, recorded as metadata
    #[arg(long)]
    pub filter: Option<String>,

    /// Write the batch report as JSON to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Package files to sign
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

impl SignArgs {
    fn to_job(&self) -> SigningJob {
        let mut builder = SigningJob::builder(&self.name, self.hash_mode);
        if let Some(description) = &self.description {
            builder = builder.description(description);
        }
        if let Some(url) = &self.description_url {
            builder = builder.description_url(url.clone());
        }
        if let Some(filter) = &self.filter {
            builder = builder.file_filter(filter);
        }
        builder.files(self.files.iter().cloned()).build()
    }
}

fn build_signer(config: BatchsignConfig) -> BatchSigner {
    let credentials = StaticCredentialProvider::new(
        AccessToken::new(config.credentials.access_token),
        CertificateInfo {
            certificate_name: config.credentials.certificate_name,
            key_vault_location: config.credentials.key_vault_url,
            timestamp_url: config.credentials.timestamp_url,
        },
    );

    let primitive =
        CommandSignaturePrimitive::new(config.signer.sign_command, config.signer.timestamp_command);

    let sink = FanoutTelemetrySink::new()
        .with_sink(Arc::new(TracingTelemetrySink::new()))
        .with_sink(Arc::new(MetricsTelemetrySink::new()));

    let mut signer_config = BatchSignerConfig::builder();
    if let Some(tool_name) = config.signer.tool_name {
        signer_config = signer_config.tool_name(tool_name);
    }

    BatchSigner::new(
        Arc::new(credentials),
        Arc::new(primitive),
        Arc::new(sink),
        signer_config.build(),
    )
}

/// Run the sign command.
///
/// # Arguments
///
/// * `config` - Loaded and validated configuration
/// * `args` - Job description and file list from the command line
pub async fn run(config: BatchsignConfig, args: SignArgs) -> Result<BatchReport> {
    let signer = Arc::new(build_signer(config));
    let job = args.to_job();

    let report = signer
        .spawn_batch(job)
        .await
        .context("Signing task did not complete")?
        .with_context(|| format!("Signing batch '{}' failed", args.name))?;

    info!(
        "Signed {} file(s) in batch {} ({} attempt(s) total)",
        report.files.len(),
        report.batch_id,
        report.total_attempts()
    );

    if let Some(path) = &args.report {
        let json = report.to_json().context("Failed to serialize batch report")?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        info!("Wrote batch report to {}", path.display());
    }

    Ok(report)
}
