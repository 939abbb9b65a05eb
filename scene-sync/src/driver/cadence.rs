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
//! Collision polling cadence

/// Decides on which ticks collision spaces are polled
///
/// Tick time only moves forward: a tick reporting an earlier total than one
/// already seen is treated as the latest total. Polling happens whenever
/// `floor(time / interval)` changes, so the cadence is independent of the
/// render tick rate.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionCadence {
    interval: f64,
    period: u64,
    time: f64,
}

impl CollisionCadence {
    /// `interval` must be positive and finite; the driver validates config
    /// before building one
    pub fn new(interval: f64) -> Self {
        CollisionCadence {
            interval,
            period: 0,
            time: 0.0,
        }
    }

    /// Record a tick at `total` and report whether collisions should be polled
    pub fn advance(&mut self, total: f64) -> bool {
        if total.is_finite() {
            self.time = self.time.max(total);
        }
        let period = (self.time / self.interval).floor() as u64;
        if period == self.period {
            return false;
        }
        self.period = period;
        true
    }

    /// Polling interval
    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Period of the last poll
    pub fn period(&self) -> u64 {
        self.period
    }

    /// Latest tick time seen
    pub fn time(&self) -> f64 {
        self.time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fire_pattern() {
        let mut cadence = CollisionCadence::new(50.0);
        let fired: Vec<bool> = [10.0, 40.0, 60.0, 90.0, 110.0]
            .iter()
            .map(|&t| cadence.advance(t))
            .collect();
        assert_eq!(fired, vec![false, false, true, false, true]);
        assert_eq!(cadence.period(), 2);
    }

    #[test]
    fn test_time_is_monotonic() {
        let mut cadence = CollisionCadence::new(50.0);
        assert!(cadence.advance(120.0));
        assert!(!cadence.advance(30.0));
        assert_eq!(cadence.time(), 120.0);
        assert!(!cadence.advance(f64::NAN));
    }

    #[test]
    fn test_skipped_periods_fire_once() {
        let mut cadence = CollisionCadence::new(50.0);
        assert!(cadence.advance(500.0));
        assert_eq!(cadence.period(), 10);
        assert!(!cadence.advance(510.0));
    }
}
