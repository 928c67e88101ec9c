// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Metrics collection for flood simulation results.

use std::collections::HashMap;
use std::time::Duration;

/// Collects admission outcomes during a flood.
#[derive(Debug, Default)]
pub struct FloodMetrics {
    /// Count of requests by outcome
    outcomes: HashMap<Outcome, usize>,
    /// Count of requests by IP
    requests_per_ip: HashMap<String, usize>,
    /// Count of admitted requests by IP
    allowed_per_ip: HashMap<String, usize>,
    /// Longest retry hint handed out
    max_retry_after: Duration,
}

/// Possible outcomes for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Allowed,
    Throttled,
}

impl FloodMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request outcome.
    pub fn record(&mut self, outcome: Outcome, ip: &str, retry_after: Option<Duration>) {
        *self.outcomes.entry(outcome).or_insert(0) += 1;
        *self.requests_per_ip.entry(ip.to_string()).or_insert(0) += 1;
        if outcome == Outcome::Allowed {
            *self.allowed_per_ip.entry(ip.to_string()).or_insert(0) += 1;
        }
        if let Some(retry_after) = retry_after {
            self.max_retry_after = self.max_retry_after.max(retry_after);
        }
    }

    pub fn total_requests(&self) -> usize {
        self.outcomes.values().sum()
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.outcomes.get(&outcome).copied().unwrap_or(0)
    }

    /// Ratio of throttled to total.
    pub fn block_rate(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            return 0.0;
        }
        self.count(Outcome::Throttled) as f64 / total as f64
    }

    pub fn unique_ips(&self) -> usize {
        self.requests_per_ip.len()
    }

    /// Highest number of admissions any single IP received.
    pub fn max_allowed_per_ip(&self) -> usize {
        self.allowed_per_ip.values().copied().max().unwrap_or(0)
    }

    pub fn report(&self) -> MetricsReport {
        MetricsReport {
            total_requests: self.total_requests(),
            allowed: self.count(Outcome::Allowed),
            throttled: self.count(Outcome::Throttled),
            block_rate: self.block_rate(),
            unique_ips: self.unique_ips(),
            max_allowed_per_ip: self.max_allowed_per_ip(),
            max_retry_after: self.max_retry_after,
        }
    }
}

/// Summary report of a flood.
#[derive(Debug, Clone)]
pub struct MetricsReport {
    pub total_requests: usize,
    pub allowed: usize,
    pub throttled: usize,
    pub block_rate: f64,
    pub unique_ips: usize,
    pub max_allowed_per_ip: usize,
    pub max_retry_after: Duration,
}

impl std::fmt::Display for MetricsReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Flood Report ===")?;
        writeln!(f, "Total Requests:    {}", self.total_requests)?;
        writeln!(f, "Allowed:           {}", self.allowed)?;
        writeln!(f, "Throttled:         {}", self.throttled)?;
        writeln!(f, "Block Rate:        {:.1}%", self.block_rate * 100.0)?;
        writeln!(f, "Unique IPs:        {}", self.unique_ips)?;
        writeln!(f, "Max Allowed/IP:    {}", self.max_allowed_per_ip)?;
        writeln!(f, "Max Retry-After:   {:?}", self.max_retry_after)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collection() {
        let mut metrics = FloodMetrics::new();
        metrics.record(Outcome::Allowed, "10.0.0.1", None);
        metrics.record(Outcome::Allowed, "10.0.0.2", None);
        metrics.record(Outcome::Throttled, "10.0.0.1", Some(Duration::from_secs(4)));

        assert_eq!(metrics.total_requests(), 3);
        assert_eq!(metrics.count(Outcome::Allowed), 2);
        assert_eq!(metrics.unique_ips(), 2);
        assert_eq!(metrics.max_allowed_per_ip(), 1);
        assert_eq!(metrics.report().max_retry_after, Duration::from_secs(4));
    }

    #[test]
    fn test_block_rate() {
        let mut metrics = FloodMetrics::new();
        for _ in 0..3 {
            metrics.record(Outcome::Allowed, "10.0.0.1", None);
        }
        for _ in 0..7 {
            metrics.record(Outcome::Throttled, "10.0.0.1", None);
        }

        assert!((metrics.block_rate() - 0.7).abs() < 0.01);
    }
}
