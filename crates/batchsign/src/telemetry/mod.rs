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

//! Telemetry emission for signing batches.
//!
//! This module provides:
//! - [`TelemetrySink`] trait, the seam to whatever records the events
//! - [`Telemetry`], a cheap-to-clone wrapper that adds timing capture
//! - [`TracingTelemetrySink`] structured log events
//! - [`MetricsTelemetrySink`] counters and histograms via the `metrics` facade
//! - [`FanoutTelemetrySink`] to feed several sinks at once

mod metrics_sink;
mod tracing_sink;

pub use metrics_sink::MetricsTelemetrySink;
pub use tracing_sink::{events, TracingTelemetrySink};

use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// One call to an external dependency, such as a signing attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyCall {
    pub tool_name: String,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    /// Human-readable tag, e.g. `app.vsix, SHA256, http://ts.example.net/`.
    pub description: String,
    pub failed: bool,
}

/// Receives telemetry events.
///
/// Called concurrently from every signing worker; implementations must not
/// block.
pub trait TelemetrySink: Send + Sync {
    /// A file was handed to a worker and is about to be signed.
    fn on_file_submitted(&self, path: &Path, tool_name: &str);

    /// A dependency call finished, successfully or not.
    fn on_dependency_call(&self, call: &DependencyCall);
}

/// Start time of a dependency call in progress.
#[derive(Debug, Clone, Copy)]
pub struct DependencyTimer {
    started_at: DateTime<Utc>,
    started: Instant,
}

impl DependencyTimer {
    pub fn start() -> Self {
        Self {
            started_at: Utc::now(),
            started: Instant::now(),
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Telemetry handle shared by the orchestrator and its workers.
#[derive(Clone)]
pub struct Telemetry {
    sink: Arc<dyn TelemetrySink>,
    tool_name: Arc<str>,
}

impl Telemetry {
    pub fn new(sink: Arc<dyn TelemetrySink>, tool_name: impl Into<String>) -> Self {
        Self {
            sink,
            tool_name: Arc::from(tool_name.into()),
        }
    }

    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    /// Emits a "file submitted" event.
    pub fn file_submitted(&self, path: &Path) {
        self.sink.on_file_submitted(path, &self.tool_name);
    }

    /// Closes `timer` and emits the dependency record. Returns the record.
    pub fn dependency_call(
        &self,
        timer: DependencyTimer,
        description: impl Into<String>,
        failed: bool,
    ) -> DependencyCall {
        let call = DependencyCall {
            tool_name: self.tool_name.to_string(),
            started_at: timer.started_at(),
            duration: timer.elapsed(),
            description: description.into(),
            failed,
        };
        self.sink.on_dependency_call(&call);
        call
    }
}

impl std::fmt::Debug for Telemetry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Telemetry")
            .field("tool_name", &self.tool_name)
            .finish_non_exhaustive()
    }
}

/// Forwards every event to each of its sinks, in order.
#[derive(Default, Clone)]
pub struct FanoutTelemetrySink {
    sinks: Vec<Arc<dyn TelemetrySink>>,
}

impl FanoutTelemetrySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl TelemetrySink for FanoutTelemetrySink {
    fn on_file_submitted(&self, path: &Path, tool_name: &str) {
        for sink in &self.sinks {
            sink.on_file_submitted(path, tool_name);
        }
    }

    fn on_dependency_call(&self, call: &DependencyCall) {
        for sink in &self.sinks {
            sink.on_dependency_call(call);
        }
    }
}
