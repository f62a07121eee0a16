//! Simulation metrics.

use std::collections::VecDeque;

/// Simulation metrics.
#[derive(Debug, Clone)]
pub struct SimulationMetrics {
    /// Total conversions attempted.
    pub total_conversions: u64,
    /// Conversions that returned a result.
    pub successful_conversions: u64,
    /// Conversions that returned an error.
    pub failed_conversions: u64,
    /// Results that disagreed with the reference engine for their generation.
    pub mismatched_conversions: u64,
    /// Configuration updates applied while running.
    pub reconfigurations: u64,
    /// Latency samples (µs).
    latency_samples: VecDeque<u64>,
    /// Maximum samples to keep.
    max_samples: usize,
}

impl SimulationMetrics {
    /// Create new metrics.
    pub fn new() -> Self {
        Self {
            total_conversions: 0,
            successful_conversions: 0,
            failed_conversions: 0,
            mismatched_conversions: 0,
            reconfigurations: 0,
            latency_samples: VecDeque::with_capacity(10000),
            max_samples: 10000,
        }
    }

    /// Record a successful conversion.
    pub fn record_success(&mut self, latency_us: u64) {
        self.total_conversions += 1;
        self.successful_conversions += 1;

        if self.latency_samples.len() >= self.max_samples {
            self.latency_samples.pop_front();
        }
        self.latency_samples.push_back(latency_us);
    }

    /// Record a failed conversion.
    pub fn record_failure(&mut self) {
        self.total_conversions += 1;
        self.failed_conversions += 1;
    }

    /// Record a result that did not match its reference.
    pub fn record_mismatch(&mut self) {
        self.mismatched_conversions += 1;
    }

    pub fn record_reconfiguration(&mut self) {
        self.reconfigurations += 1;
    }

    /// Get average latency in µs.
    pub fn average_latency_us(&self) -> u64 {
        if self.latency_samples.is_empty() {
            return 0;
        }

        let sum: u64 = self.latency_samples.iter().sum();
        sum / self.latency_samples.len() as u64
    }

    /// Get p50 latency.
    pub fn p50_latency_us(&self) -> u64 {
        self.percentile_latency(50)
    }

    /// Get p99 latency.
    pub fn p99_latency_us(&self) -> u64 {
        self.percentile_latency(99)
    }

    /// Get percentile latency.
    fn percentile_latency(&self, percentile: usize) -> u64 {
        if self.latency_samples.is_empty() {
            return 0;
        }

        let mut sorted: Vec<_> = self.latency_samples.iter().copied().collect();
        sorted.sort_unstable();

        let idx = (sorted.len() * percentile / 100).min(sorted.len() - 1);
        sorted[idx]
    }

    /// Get success rate.
    pub fn success_rate(&self) -> f64 {
        if self.total_conversions == 0 {
            return 0.0;
        }

        self.successful_conversions as f64 / self.total_conversions as f64
    }

    /// Get throughput (conversions per second).
    pub fn throughput(&self, duration_secs: f64) -> f64 {
        if duration_secs <= 0.0 {
            return 0.0;
        }

        self.total_conversions as f64 / duration_secs
    }
}

impl Default for SimulationMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics() {
        let mut metrics = SimulationMetrics::new();

        metrics.record_success(100);
        metrics.record_success(200);
        metrics.record_success(150);
        metrics.record_failure();
        metrics.record_mismatch();

        assert_eq!(metrics.total_conversions, 4);
        assert_eq!(metrics.successful_conversions, 3);
        assert_eq!(metrics.failed_conversions, 1);
        assert_eq!(metrics.mismatched_conversions, 1);
        assert_eq!(metrics.average_latency_us(), 150);
        assert_eq!(metrics.p50_latency_us(), 150);
        assert_eq!(metrics.p99_latency_us(), 200);
        assert_eq!(metrics.success_rate(), 0.75);
        assert_eq!(metrics.throughput(2.0), 2.0);
    }

    #[test]
    fn test_sample_window() {
        let mut metrics = SimulationMetrics::new();
        for latency in 0..10_050 {
            metrics.record_success(latency);
        }

        assert_eq!(metrics.total_conversions, 10_050);
        // Oldest 50 samples were dropped.
        assert_eq!(metrics.percentile_latency(0), 50);
    }
}
