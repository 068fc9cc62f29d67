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

//! Signing job submitted by the caller.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::warn;
use url::Url;

use crate::digest::HashMode;

/// A batch of files to sign.
///
/// Immutable once built. The description, description URL and file filter
/// are carried for the caller's benefit and logged, but do not influence how
/// files are signed.
#[derive(Debug, Clone)]
pub struct SigningJob {
    hash_mode: HashMode,
    name: String,
    description: Option<String>,
    description_url: Option<Url>,
    files: Vec<PathBuf>,
    file_filter: Option<String>,
}

impl SigningJob {
    pub fn builder(name: impl Into<String>, hash_mode: HashMode) -> SigningJobBuilder {
        SigningJobBuilder {
            job: SigningJob {
                hash_mode,
                name: name.into(),
                description: None,
                description_url: None,
                files: Vec::new(),
                file_filter: None,
            },
        }
    }

    pub fn hash_mode(&self) -> HashMode {
        self.hash_mode
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn description_url(&self) -> Option<&Url> {
        self.description_url.as_ref()
    }

    /// Files to sign, in submission order, each listed once.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn file_filter(&self) -> Option<&str> {
        self.file_filter.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Builder for [`SigningJob`].
#[derive(Debug, Clone)]
pub struct SigningJobBuilder {
    job: SigningJob,
}

impl SigningJobBuilder {
    pub fn description(mut self, value: impl Into<String>) -> Self {
        self.job.description = Some(value.into());
        self
    }

    pub fn description_url(mut self, value: Url) -> Self {
        self.job.description_url = Some(value);
        self
    }

    pub fn file_filter(mut self, value: impl Into<String>) -> Self {
        self.job.file_filter = Some(value.into());
        self
    }

    /// Appends a file to the batch.
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.job.files.push(path.into());
        self
    }

    /// Appends several files to the batch.
    pub fn files<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.job.files.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Builds the job.
    ///
    /// A path listed more than once is kept at its first position only, so no
    /// two workers ever sign the same file.
    pub fn build(mut self) -> SigningJob {
        let mut seen: HashSet<PathBuf> = HashSet::with_capacity(self.job.files.len());
        let name = self.job.name.clone();
        self.job.files.retain(|path| {
            let first = seen.insert(path.clone());
            if !first {
                warn_duplicate(&name, path);
            }
            first
        });
        self.job
    }
}

fn warn_duplicate(job: &str, path: &Path) {
    warn!(
        job = %job,
        path = %path.display(),
        "File listed more than once in signing job; signing it once"
    );
}
