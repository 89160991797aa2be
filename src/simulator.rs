//! Synthetic metric simulation
//!
//! On a real device this module is where actual sensor reads would go.
//! Here every value is drawn from a normal distribution shaped by a
//! per-metric profile, clamped into the profile's bounds and rounded to
//! two decimals. The output is explicitly synthetic telemetry: bounded
//! and profile-shaped, nothing more.
//!
//! The profile table is pure data so new profiles are added by extending
//! the table, not the control flow. The RNG is owned by the simulator and
//! injectable, so tests can seed it to hit anomaly branches reliably.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::report::MetricResult;
use crate::template::MetricDefinition;

/// Statistical parameters for generating one metric's value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationProfile {
    pub mean: f64,
    pub stddev: f64,
    pub min: f64,
    pub max: f64,
}

/// Fallback for metric names without a dedicated profile.
pub const DEFAULT_PROFILE: SimulationProfile =
    SimulationProfile { mean: 50.0, stddev: 15.0, min: 0.0, max: 100.0 };

/// Built-in profiles for the metrics the standard templates declare.
pub const SIMULATION_PROFILES: &[(&str, SimulationProfile)] = &[
    ("cpu_temperature", SimulationProfile { mean: 48.0, stddev: 12.0, min: 25.0, max: 95.0 }),
    ("memory_usage", SimulationProfile { mean: 55.0, stddev: 15.0, min: 5.0, max: 99.0 }),
    ("network_latency", SimulationProfile { mean: 35.0, stddev: 25.0, min: 1.0, max: 500.0 }),
    ("packet_loss_rate", SimulationProfile { mean: 0.8, stddev: 1.2, min: 0.0, max: 15.0 }),
    ("disk_usage", SimulationProfile { mean: 60.0, stddev: 20.0, min: 1.0, max: 99.0 }),
    ("cpu_usage", SimulationProfile { mean: 40.0, stddev: 20.0, min: 0.0, max: 100.0 }),
];

/// Profile for a metric name, falling back to [`DEFAULT_PROFILE`].
pub fn profile_for(name: &str) -> SimulationProfile {
    SIMULATION_PROFILES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, p)| *p)
        .unwrap_or(DEFAULT_PROFILE)
}

/// Produces one synthetic value per declared metric.
pub struct MetricSimulator<R: Rng = StdRng> {
    rng: R,
}

impl MetricSimulator<StdRng> {
    /// Simulator with a private entropy-seeded RNG. Concurrent runs in
    /// separate processes never share a randomness source.
    pub fn new() -> Self {
        Self { rng: StdRng::from_entropy() }
    }
}

impl Default for MetricSimulator<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> MetricSimulator<R> {
    /// Simulator over a caller-supplied RNG, for deterministic tests.
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// One draw for a metric name: gaussian sample, clamp, round to 2 dp.
    pub fn simulate_value(&mut self, name: &str) -> f64 {
        let profile = profile_for(name);
        let sample = match Normal::new(profile.mean, profile.stddev) {
            Ok(dist) => dist.sample(&mut self.rng),
            // degenerate stddev collapses to the mean
            Err(_) => profile.mean,
        };
        (sample.clamp(profile.min, profile.max) * 100.0).round() / 100.0
    }

    /// Run every declared metric, preserving declaration order and
    /// carrying thresholds over from the definition.
    pub fn run_tests(&mut self, metrics: &[MetricDefinition]) -> Vec<MetricResult> {
        metrics
            .iter()
            .map(|metric| MetricResult {
                name: metric.name.clone(),
                unit: metric.unit.clone(),
                value: self.simulate_value(&metric.name),
                threshold_max: metric.threshold_max,
                threshold_min: metric.threshold_min,
            })
            .collect()
    }
}
