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

//! Package signature and timestamp primitives.
//!
//! This module provides:
//! - [`PackageSignaturePrimitive`] trait for opening a package for signing
//! - [`PackageHandle`] and [`SignatureHandle`] for the sign and timestamp steps
//! - [`CommandSignaturePrimitive`] which delegates both steps to external tools
//!
//! The container format itself is opaque here. Implementations replace the
//! package's signature region in place, so signing the same file twice leaves
//! exactly one signature behind.

mod command;

pub use command::{CommandSignaturePrimitive, CommandTemplate, ACCESS_TOKEN_ENV};

use async_trait::async_trait;
use std::path::Path;
use url::Url;

use crate::configuration::SigningConfiguration;
use crate::digest::DigestAlgorithm;
use crate::error::PrimitiveError;

/// Result of asking a timestamp authority to countersign a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampOutcome {
    Success,
    Failed,
}

/// Trait for opening package containers for signing.
#[async_trait]
pub trait PackageSignaturePrimitive: Send + Sync {
    /// Open a package for signing.
    ///
    /// Fails if the file is not a valid container or is locked by another
    /// process.
    async fn open_for_signing(&self, path: &Path)
        -> Result<Box<dyn PackageHandle>, PrimitiveError>;
}

/// An opened package, ready to be signed.
#[async_trait]
pub trait PackageHandle: Send {
    /// Compute and embed a signature using the batch's signing configuration.
    ///
    /// Mutates the package on disk when it succeeds.
    async fn sign_with_preset(
        &mut self,
        configuration: &SigningConfiguration,
    ) -> Result<Box<dyn SignatureHandle>, PrimitiveError>;
}

/// A signature embedded in a package.
#[async_trait]
pub trait SignatureHandle: Send {
    /// Ask the timestamp authority at `url` to countersign the signature.
    async fn timestamp(
        &mut self,
        url: &Url,
        digest: DigestAlgorithm,
    ) -> Result<TimestampOutcome, PrimitiveError>;
}
