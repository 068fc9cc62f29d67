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

//! Hash mode selection and digest algorithm resolution.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse hash selection requested by the caller of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashMode {
    /// Legacy SHA-1 signatures.
    Sha1,
    /// SHA-256 signatures.
    Sha256,
    /// Both SHA-1 and SHA-256. Not supported; resolves to SHA-256.
    Dual,
}

impl FromStr for HashMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha1" => Ok(HashMode::Sha1),
            "sha256" => Ok(HashMode::Sha256),
            "dual" => Ok(HashMode::Dual),
            other => Err(format!(
                "unknown hash mode '{}', expected sha1, sha256 or dual",
                other
            )),
        }
    }
}

impl fmt::Display for HashMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HashMode::Sha1 => "sha1",
            HashMode::Sha256 => "sha256",
            HashMode::Dual => "dual",
        };
        f.write_str(name)
    }
}

/// Concrete digest algorithm handed to the signing and timestamp primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DigestAlgorithm {
    Sha1,
    Sha256,
}

impl DigestAlgorithm {
    /// Canonical algorithm name, e.g. `SHA256`.
    pub fn name(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha1 => "SHA1",
            DigestAlgorithm::Sha256 => "SHA256",
        }
    }

    /// Dotted ASN.1 object identifier of the algorithm.
    pub fn oid(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha1 => "1.3.14.3.2.26",
            DigestAlgorithm::Sha256 => "2.16.840.1.101.3.4.2.1",
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolves a hash mode to the digest algorithm used for signing.
///
/// Only [`HashMode::Sha1`] selects the legacy digest. Every other mode,
/// including [`HashMode::Dual`], silently resolves to SHA-256. Dual signing is
/// not supported and callers asking for it get a single modern signature
/// rather than an error; this is a compatibility shim, not failure handling.
pub fn resolve_digest_algorithm(mode: HashMode) -> DigestAlgorithm {
    match mode {
        HashMode::Sha1 => DigestAlgorithm::Sha1,
        HashMode::Sha256 | HashMode::Dual => DigestAlgorithm::Sha256,
    }
}
