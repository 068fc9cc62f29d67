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

//! Configuration for the [`BatchSigner`](crate::BatchSigner).
//!
//! The worker bound, attempt budget, retry delays and per-file wait bound are
//! fixed constants of the signing contract and are not configurable. Delays
//! and the wait bound are expressed in time units; [`BatchSignerConfig`]
//! decides how long a unit is.

use std::time::Duration;

/// Number of files signed concurrently.
pub const MAX_CONCURRENT_FILES: usize = 4;

/// Total signing attempts per file, including the first.
pub const MAX_ATTEMPTS: u32 = 3;

/// Seed of the retry delay, in time units.
pub const INITIAL_RETRY_DELAY_UNITS: f64 = 5.0;

/// Power applied to the retry delay after every failed attempt.
pub const RETRY_DELAY_EXPONENT: f64 = 1.5;

/// How long the orchestrator waits for one file's signer, in time units.
pub const FILE_WAIT_UNITS: f64 = 60.0;

/// Tool name reported to telemetry when none is configured.
pub const DEFAULT_TOOL_NAME: &str = "batchsign";

/// Configuration for a [`BatchSigner`](crate::BatchSigner).
///
/// # Construction
///
/// ```rust,ignore
/// let config = BatchSignerConfig::builder()
///     .tool_name("vsix-signer")
///     .build();
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct BatchSignerConfig {
    tool_name: String,
    time_unit: Duration,
}

impl BatchSignerConfig {
    /// Creates a new configuration builder with default values.
    pub fn builder() -> BatchSignerConfigBuilder {
        BatchSignerConfigBuilder::default()
    }

    /// Name reported to telemetry as the signing tool.
    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    /// Length of one time unit.
    pub fn time_unit(&self) -> Duration {
        self.time_unit
    }

    /// Converts a number of time units to a wall-clock duration.
    pub fn units(&self, units: f64) -> Duration {
        self.time_unit.mul_f64(units)
    }

    /// Wall-clock wait bound for a single file.
    pub fn file_wait(&self) -> Duration {
        self.units(FILE_WAIT_UNITS)
    }
}

impl Default for BatchSignerConfig {
    fn default() -> Self {
        BatchSignerConfigBuilder::default().build()
    }
}

/// Builder for [`BatchSignerConfig`].
#[derive(Debug, Clone)]
pub struct BatchSignerConfigBuilder {
    config: BatchSignerConfig,
}

impl Default for BatchSignerConfigBuilder {
    fn default() -> Self {
        Self {
            config: BatchSignerConfig {
                tool_name: DEFAULT_TOOL_NAME.to_string(),
                time_unit: Duration::from_secs(1),
            },
        }
    }
}

impl BatchSignerConfigBuilder {
    /// Sets the tool name reported to telemetry.
    pub fn tool_name(mut self, value: impl Into<String>) -> Self {
        self.config.tool_name = value.into();
        self
    }

    /// Sets the length of one time unit.
    pub fn time_unit(mut self, value: Duration) -> Self {
        self.config.time_unit = value;
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> BatchSignerConfig {
        self.config
    }
}
