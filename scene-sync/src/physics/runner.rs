// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Fixed-timestep runner
//!
//! Host timers rarely fire at exactly the physics rate. The runner banks
//! elapsed time and steps the simulation in whole `timestep` increments,
//! carrying the remainder into the next call.
//!
//! # Timestep Guidelines
//!
//! - `max_substeps` bounds the work done after a long stall; excess banked
//!   time beyond that bound is dropped rather than replayed.
//! - Start with 1000/60 ms and only go smaller for fast, thin bodies.

use crate::physics::Simulation;

/// Accumulating fixed-step driver for a [`Simulation`]
#[derive(Debug, Clone)]
pub struct StepRunner {
    timestep_ms: f64,
    max_substeps: u32,
    accumulator: f64,
    steps_taken: u64,
}

impl StepRunner {
    /// Create a runner
    ///
    /// # Panics
    ///
    /// Panics if timestep is non-positive, NaN, or infinite, or if
    /// `max_substeps` is zero
    pub fn new(timestep_ms: f64, max_substeps: u32) -> Self {
        assert!(
            timestep_ms > 0.0 && timestep_ms.is_finite(),
            "Timestep must be positive and finite"
        );
        assert!(max_substeps > 0, "At least one substep is required");
        StepRunner {
            timestep_ms,
            max_substeps,
            accumulator: 0.0,
            steps_taken: 0,
        }
    }

    /// Step length in milliseconds
    pub fn timestep(&self) -> f64 {
        self.timestep_ms
    }

    /// Total steps taken since creation
    pub fn steps_taken(&self) -> u64 {
        self.steps_taken
    }

    /// Banked time not yet consumed by a step
    pub fn pending(&self) -> f64 {
        self.accumulator
    }

    /// Bank `elapsed_ms` and run as many whole steps as fit
    ///
    /// Returns the number of steps executed. Negative or non-finite
    /// elapsed time is ignored.
    pub fn advance(&mut self, simulation: &mut dyn Simulation, elapsed_ms: f64) -> u32 {
        if !elapsed_ms.is_finite() || elapsed_ms <= 0.0 {
            return 0;
        }

        self.accumulator += elapsed_ms;
        let mut steps = 0;
        while self.accumulator >= self.timestep_ms && steps < self.max_substeps {
            simulation.step(self.timestep_ms);
            self.accumulator -= self.timestep_ms;
            steps += 1;
        }

        if self.accumulator >= self.timestep_ms {
            log::trace!(
                "step runner dropping {:.2} ms after {} substeps",
                self.accumulator,
                steps
            );
            self.accumulator %= self.timestep_ms;
        }

        self.steps_taken += u64::from(steps);
        steps
    }
}
