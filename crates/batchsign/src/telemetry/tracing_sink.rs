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

//! Structured telemetry events through `tracing`.
//!
//! Every event carries an `event_type` field from [`events`] so log pipelines
//! can filter signing activity without parsing messages.

use std::path::Path;

use super::{DependencyCall, TelemetrySink};

/// Event types for signing telemetry.
pub mod events {
    /// File handed to a signing worker.
    pub const FILE_SUBMITTED: &str = "file.submitted";
    /// Signing attempt completed.
    pub const DEPENDENCY_CALL_SUCCEEDED: &str = "dependency.call.succeeded";
    /// Signing attempt failed.
    pub const DEPENDENCY_CALL_FAILED: &str = "dependency.call.failed";
}

/// Telemetry sink that writes structured `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTelemetrySink;

impl TracingTelemetrySink {
    pub fn new() -> Self {
        Self
    }
}

impl TelemetrySink for TracingTelemetrySink {
    fn on_file_submitted(&self, path: &Path, tool_name: &str) {
        tracing::info!(
            event_type = events::FILE_SUBMITTED,
            path = %path.display(),
            tool = %tool_name,
            "File submitted for signing"
        );
    }

    fn on_dependency_call(&self, call: &DependencyCall) {
        if call.failed {
            tracing::warn!(
                event_type = events::DEPENDENCY_CALL_FAILED,
                tool = %call.tool_name,
                started_at = %call.started_at.to_rfc3339(),
                duration_ms = call.duration.as_millis() as u64,
                description = %call.description,
                "Dependency call failed"
            );
        } else {
            tracing::info!(
                event_type = events::DEPENDENCY_CALL_SUCCEEDED,
                tool = %call.tool_name,
                started_at = %call.started_at.to_rfc3339(),
                duration_ms = call.duration.as_millis() as u64,
                description = %call.description,
                "Dependency call succeeded"
            );
        }
    }
}
