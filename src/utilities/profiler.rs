// Copyright (C) 2025 Bellande Artificial Intelligence Computer Vision Research Innovation Center, Ronaldson Bellande

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Named wall-clock timers, used to measure how long the pipeline takes to
/// hand out batches.
#[derive(Default)]
pub struct Profiler {
    timings: BTreeMap<String, Vec<Duration>>,
    current_timers: BTreeMap<String, Instant>,
}

impl Profiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, name: &str) {
        self.current_timers.insert(name.to_string(), Instant::now());
    }

    pub fn stop(&mut self, name: &str) {
        if let Some(start_time) = self.current_timers.remove(name) {
            self.record(name, start_time.elapsed());
        }
    }

    pub fn record(&mut self, name: &str, duration: Duration) {
        self.timings
            .entry(name.to_string())
            .or_default()
            .push(duration);
    }

    pub fn get_statistics(&self, name: &str) -> Option<ProfileStats> {
        let durations = self.timings.get(name)?;
        let min = *durations.iter().min()?;
        let max = *durations.iter().max()?;
        let total: Duration = durations.iter().sum();

        Some(ProfileStats {
            count: durations.len(),
            total,
            average: total / durations.len() as u32,
            min,
            max,
        })
    }

    pub fn report(&self) -> String {
        let mut report = String::from("Pipeline Profile:\n");
        for name in self.timings.keys() {
            if let Some(stats) = self.get_statistics(name) {
                report.push_str(&format!(
                    "{}: {} calls, total={:?}, avg={:?}, min={:?}, max={:?}\n",
                    name, stats.count, stats.total, stats.average, stats.min, stats.max
                ));
            }
        }
        report
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileStats {
    pub count: usize,
    pub total: Duration,
    pub average: Duration,
    pub min: Duration,
    pub max: Duration,
}
