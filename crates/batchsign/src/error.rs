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

//! Error types for batch signing.
//!
//! Errors are layered the same way the work is:
//! - [`PrimitiveError`] comes back from a single collaborator call
//! - [`TransientSigningError`] describes one failed attempt and is retried
//! - [`BatchError`] is fatal and terminates the whole batch

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors raised while obtaining credentials for a batch.
///
/// These are fatal: no file is touched when the configuration cannot be built.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Access token unavailable: {0}")]
    TokenUnavailable(String),

    #[error("Certificate metadata unavailable: {0}")]
    CertificateUnavailable(String),
}

/// Errors reported by the package signature or timestamp primitives.
#[derive(Debug, Error)]
pub enum PrimitiveError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not a signable package: {0}")]
    InvalidPackage(String),

    #[error("Command `{program}` exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("Remote service error: {0}")]
    Remote(String),

    #[error("Not configured: {0}")]
    NotConfigured(String),

    #[error("Invalid command template: {0}")]
    InvalidTemplate(String),
}

/// A single signing attempt failed. Retried by the per-file signer.
#[derive(Debug, Error)]
pub enum TransientSigningError {
    #[error("Failed to open package for signing: {0}")]
    Open(#[source] PrimitiveError),

    #[error("Signing failed: {0}")]
    Sign(#[source] PrimitiveError),

    #[error("Timestamping failed: {0}")]
    Timestamp(#[source] PrimitiveError),

    #[error("Timestamp authority {url} did not confirm the signature")]
    TimestampRejected { url: Url },
}

/// Fatal errors that abort a signing batch.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Cannot build signing configuration: {0}")]
    Credential(#[from] CredentialError),

    #[error("Signing {} failed after {attempts} attempts: {last_error}", path.display())]
    RetriesExhausted {
        path: PathBuf,
        attempts: u32,
        #[source]
        last_error: TransientSigningError,
    },

    #[error("Signing {} did not complete within {waited:?}", path.display())]
    Timeout { path: PathBuf, waited: Duration },

    #[error("Signing worker failed: {0}")]
    WorkerFailed(String),
}

impl BatchError {
    /// The file the error is about, if it concerns a single file.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            BatchError::RetriesExhausted { path, .. } | BatchError::Timeout { path, .. } => {
                Some(path)
            }
            BatchError::Credential(_) | BatchError::WorkerFailed(_) => None,
        }
    }
}
