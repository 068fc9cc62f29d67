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

//! Credential provider interface.
//!
//! The [`CredentialProvider`] trait is the seam to the remote key-custody
//! service. It supplies a short-lived bearer token and the identity and
//! location of the signing certificate.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use url::Url;

use crate::error::CredentialError;

/// A bearer token for the key-custody service.
///
/// The token never appears in `Debug` or `Display` output so it can't leak
/// through log lines or error messages.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(Arc<str>);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Arc::from(token.into()))
    }

    /// The raw token value, for handing to the signature primitive.
    pub fn secret(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

impl fmt::Display for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

/// Identity and location of the signing certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateInfo {
    /// Name of the certificate inside the key vault.
    pub certificate_name: String,
    /// URL of the key vault holding the certificate.
    pub key_vault_location: Url,
    /// Timestamp authority to contact after signing, if any.
    pub timestamp_url: Option<Url>,
}

/// Trait for obtaining credentials from the key-custody service.
///
/// Implementations may block on network I/O. The orchestrator calls each
/// method once per batch, before any file is touched.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Fetch a fresh access token.
    async fn access_token(&self) -> Result<AccessToken, CredentialError>;

    /// Fetch the signing certificate's metadata.
    async fn certificate_info(&self) -> Result<CertificateInfo, CredentialError>;
}

/// A credential provider that hands out values it was constructed with.
///
/// Useful when the caller already obtained a token out of band, for example
/// from a CI secret.
#[derive(Debug, Clone)]
pub struct StaticCredentialProvider {
    token: AccessToken,
    certificate: CertificateInfo,
}

impl StaticCredentialProvider {
    pub fn new(token: AccessToken, certificate: CertificateInfo) -> Self {
        Self { token, certificate }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentialProvider {
    async fn access_token(&self) -> Result<AccessToken, CredentialError> {
        if self.token.is_empty() {
            return Err(CredentialError::TokenUnavailable(
                "configured access token is empty".into(),
            ));
        }
        Ok(self.token.clone())
    }

    async fn certificate_info(&self) -> Result<CertificateInfo, CredentialError> {
        if self.certificate.certificate_name.trim().is_empty() {
            return Err(CredentialError::CertificateUnavailable(
                "certificate name is empty".into(),
            ));
        }
        Ok(self.certificate.clone())
    }
}
