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

//! Summary of a successful batch.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// How one file was signed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileOutcome {
    pub path: PathBuf,
    /// Attempts used, 1 to 3.
    pub attempts: u32,
    /// Wall time from the first attempt to success, in seconds.
    pub elapsed_seconds: f64,
    /// Whether a timestamp was embedded.
    pub timestamped: bool,
}

impl FileOutcome {
    /// Whether the file needed more than one attempt.
    pub fn was_retried(&self) -> bool {
        self.attempts > 1
    }
}

/// Outcome of a batch in which every file was signed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub job_name: String,
    /// One entry per file, in job order.
    pub files: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn outcome(&self, path: &Path) -> Option<&FileOutcome> {
        self.files.iter().find(|outcome| outcome.path == path)
    }

    /// Total attempts across every file.
    pub fn total_attempts(&self) -> u32 {
        self.files.iter().map(|outcome| outcome.attempts).sum()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
