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

//! Retry schedule for per-file signing.
//!
//! The schedule is a small state machine over an attempt counter and the
//! current delay. The delay grows by a power law rather than doubling:
//!
//! | attempt | delay before it (units) |
//! |---------|-------------------------|
//! | 1       | 0                       |
//! | 2       | 5^1.5 ≈ 11.18           |
//! | 3       | (5^1.5)^1.5 ≈ 37.38     |

use crate::config::{INITIAL_RETRY_DELAY_UNITS, MAX_ATTEMPTS, RETRY_DELAY_EXPONENT};

/// What the signer should do for the next attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttemptPlan {
    /// 1-based attempt number.
    pub attempt: u32,
    /// Time units to wait before starting the attempt.
    pub delay_units: f64,
}

/// Attempt counter plus power-law delay state.
#[derive(Debug, Clone)]
pub struct RetrySchedule {
    attempt: u32,
    max_attempts: u32,
    delay_units: f64,
    exponent: f64,
}

impl RetrySchedule {
    /// The schedule used for every file: 3 attempts, delay seeded at 5 units,
    /// raised to the power 1.5 after each failure.
    pub fn new() -> Self {
        Self {
            attempt: 0,
            max_attempts: MAX_ATTEMPTS,
            delay_units: INITIAL_RETRY_DELAY_UNITS,
            exponent: RETRY_DELAY_EXPONENT,
        }
    }

    /// Starts the next attempt, or returns `None` once the budget is spent.
    pub fn next_attempt(&mut self) -> Option<AttemptPlan> {
        if self.attempt >= self.max_attempts {
            return None;
        }
        self.attempt += 1;

        let delay_units = if self.attempt == 1 {
            0.0
        } else {
            self.delay_units
        };

        Some(AttemptPlan {
            attempt: self.attempt,
            delay_units,
        })
    }

    /// Records that the current attempt failed, growing the delay.
    pub fn record_failure(&mut self) {
        self.delay_units = self.delay_units.powf(self.exponent);
    }

    /// Number of attempts started so far.
    pub fn attempts(&self) -> u32 {
        self.attempt
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempt >= self.max_attempts
    }
}

impl Default for RetrySchedule {
    fn default() -> Self {
        Self::new()
    }
}
