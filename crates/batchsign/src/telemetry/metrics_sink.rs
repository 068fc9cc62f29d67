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

//! Telemetry sink backed by the `metrics` facade.
//!
//! Nothing is recorded unless the host installs a recorder (for example a
//! Prometheus exporter).

use std::path::Path;

use super::{DependencyCall, TelemetrySink};

pub const FILES_SUBMITTED_TOTAL: &str = "batchsign_files_submitted_total";
pub const DEPENDENCY_CALLS_TOTAL: &str = "batchsign_dependency_calls_total";
pub const DEPENDENCY_CALL_DURATION_SECONDS: &str = "batchsign_dependency_call_duration_seconds";

#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsTelemetrySink;

impl MetricsTelemetrySink {
    pub fn new() -> Self {
        Self
    }
}

impl TelemetrySink for MetricsTelemetrySink {
    fn on_file_submitted(&self, _path: &Path, tool_name: &str) {
        metrics::counter!(FILES_SUBMITTED_TOTAL, "tool" => tool_name.to_string()).increment(1);
    }

    fn on_dependency_call(&self, call: &DependencyCall) {
        let outcome = if call.failed { "failure" } else { "success" };
        metrics::counter!(
            DEPENDENCY_CALLS_TOTAL,
            "tool" => call.tool_name.clone(),
            "outcome" => outcome
        )
        .increment(1);
        metrics::histogram!(
            DEPENDENCY_CALL_DURATION_SECONDS,
            "tool" => call.tool_name.clone(),
            "outcome" => outcome
        )
        .record(call.duration.as_secs_f64());
    }
}
