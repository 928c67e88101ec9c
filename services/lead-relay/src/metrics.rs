// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus metrics owned by the application state.

use crate::notify::{ChannelKind, DispatchOutcome};
use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

pub struct Metrics {
    registry: Registry,
    admissions: IntCounterVec,
    dispatches: IntCounterVec,
    channel_failures: IntCounterVec,
    tracked_keys: IntGauge,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let admissions = IntCounterVec::new(
            Opts::new("relay_admissions_total", "Admission decisions by outcome"),
            &["decision"],
        )?;
        let dispatches = IntCounterVec::new(
            Opts::new("relay_dispatch_total", "Notification dispatches by verdict"),
            &["verdict"],
        )?;
        let channel_failures = IntCounterVec::new(
            Opts::new("relay_channel_failures_total", "Failed deliveries by channel"),
            &["channel"],
        )?;
        let tracked_keys = IntGauge::new("relay_tracked_keys", "Clients tracked by the admission gate")?;

        registry.register(Box::new(admissions.clone()))?;
        registry.register(Box::new(dispatches.clone()))?;
        registry.register(Box::new(channel_failures.clone()))?;
        registry.register(Box::new(tracked_keys.clone()))?;

        Ok(Self {
            registry,
            admissions,
            dispatches,
            channel_failures,
            tracked_keys,
        })
    }

    pub fn record_admission(&self, allowed: bool) {
        let decision = if allowed { "allowed" } else { "throttled" };
        self.admissions.with_label_values(&[decision]).inc();
    }

    pub fn record_dispatch(&self, outcome: &DispatchOutcome) {
        self.dispatches
            .with_label_values(&[outcome.verdict().as_str()])
            .inc();
        for channel in [ChannelKind::Email, ChannelKind::Sms] {
            if outcome.error(channel).is_some() {
                self.channel_failures
                    .with_label_values(&[channel.as_str()])
                    .inc();
            }
        }
    }

    pub fn set_tracked_keys(&self, count: usize) {
        self.tracked_keys.set(count as i64);
    }

    /// Render all metrics in the Prometheus text format.
    pub fn render(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
