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

//! The per-batch signing configuration.

use tracing::debug;
use url::Url;

use crate::credentials::{AccessToken, CredentialProvider};
use crate::digest::{resolve_digest_algorithm, DigestAlgorithm, HashMode};
use crate::error::CredentialError;

/// Everything the signature primitive needs to sign a file.
///
/// Built once per batch and shared read-only by every worker. The access token
/// is fetched when the configuration is built and is not refreshed while the
/// batch runs.
#[derive(Debug, Clone)]
pub struct SigningConfiguration {
    file_digest_algorithm: DigestAlgorithm,
    signature_digest_algorithm: DigestAlgorithm,
    access_token: AccessToken,
    certificate_name: String,
    key_vault_location: Url,
    timestamp_url: Option<Url>,
}

impl SigningConfiguration {
    /// Builds the configuration for a batch.
    ///
    /// Fetches the access token and certificate metadata from `credentials`
    /// and resolves the digest algorithm from `hash_mode`.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError`] if the provider cannot produce a token or
    /// the certificate metadata.
    pub async fn build(
        credentials: &dyn CredentialProvider,
        hash_mode: HashMode,
    ) -> Result<Self, CredentialError> {
        let access_token = credentials.access_token().await?;
        let certificate = credentials.certificate_info().await?;
        let digest = resolve_digest_algorithm(hash_mode);

        debug!(
            hash_mode = %hash_mode,
            digest = %digest,
            certificate = %certificate.certificate_name,
            key_vault = %certificate.key_vault_location,
            "Resolved signing configuration"
        );

        Ok(Self {
            file_digest_algorithm: digest,
            signature_digest_algorithm: digest,
            access_token,
            certificate_name: certificate.certificate_name,
            key_vault_location: certificate.key_vault_location,
            timestamp_url: certificate.timestamp_url,
        })
    }

    /// Digest used to fingerprint the package contents.
    pub fn file_digest_algorithm(&self) -> DigestAlgorithm {
        self.file_digest_algorithm
    }

    /// Digest used to compute the signature itself.
    pub fn signature_digest_algorithm(&self) -> DigestAlgorithm {
        self.signature_digest_algorithm
    }

    pub fn access_token(&self) -> &AccessToken {
        &self.access_token
    }

    pub fn certificate_name(&self) -> &str {
        &self.certificate_name
    }

    pub fn key_vault_location(&self) -> &Url {
        &self.key_vault_location
    }

    /// Timestamp authority to contact after signing, if configured.
    pub fn timestamp_url(&self) -> Option<&Url> {
        self.timestamp_url.as_ref()
    }
}
