// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Per-client admission gate.
//!
//! Every client key (normally the caller's IP) owns a continuously refilling
//! token bucket:
//! - capacity is the configured throttle limit, and a new key starts full
//! - one permit is replenished per throttle TTL, fractional refill allowed
//! - each admitted request consumes exactly one permit
//!
//! Buckets live in a sharded map, so checks for the same key are serialized
//! by the shard lock while different keys rarely contend. Buckets that see no
//! traffic for the idle horizon are evicted by [`AdmissionGate::evict`].

use crate::clock::{Clock, SystemClock};
use crate::config::ThrottleConfig;
use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// Result of an admission check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Admission {
    /// Request may proceed
    Allowed {
        /// Whole permits left after this request
        remaining: u32,
    },
    /// Request is throttled
    Limited {
        /// Time until the next permit is available
        retry_after: Duration,
    },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed { .. })
    }
}

/// Token bucket for a single key.
#[derive(Debug)]
struct TokenBucket {
    /// Available tokens, always within `[0, capacity]`
    tokens: f64,
    /// Last time tokens were accounted for
    last_refill: Instant,
    /// Last time the key was checked, allowed or not
    last_used: Instant,
}

impl TokenBucket {
    fn full(capacity: f64, now: Instant) -> Self {
        Self {
            tokens: capacity,
            last_refill: now,
            last_used: now,
        }
    }

    /// Refill tokens based on elapsed time.
    fn refill(&mut self, now: Instant, ttl_secs: f64, capacity: f64) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed / ttl_secs).min(capacity);
        self.last_refill = now;
    }

    /// Try to consume a token. Returns true if successful.
    fn try_consume(&mut self) -> bool {
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Get time until a token is available.
    fn time_until_available(&self, ttl_secs: f64) -> Duration {
        if self.tokens >= 1.0 {
            Duration::ZERO
        } else {
            Duration::try_from_secs_f64((1.0 - self.tokens) * ttl_secs).unwrap_or(Duration::MAX)
        }
    }
}

/// Thread-safe keyed rate limiter.
pub struct AdmissionGate<C: Clock = SystemClock> {
    buckets: DashMap<String, TokenBucket>,
    capacity: f64,
    ttl_secs: f64,
    idle_horizon: Duration,
    clock: C,
}

impl AdmissionGate<SystemClock> {
    /// Create a gate using wall-clock time.
    pub fn new(config: &ThrottleConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> AdmissionGate<C> {
    /// Create a gate driven by the given clock.
    pub fn with_clock(config: &ThrottleConfig, clock: C) -> Self {
        Self {
            buckets: DashMap::new(),
            capacity: f64::from(config.limit.max(1)),
            ttl_secs: config.ttl().as_secs_f64().max(f64::MIN_POSITIVE),
            idle_horizon: config.idle_horizon(),
            clock,
        }
    }

    /// Check and, if allowed, consume one permit for `key`.
    pub fn check(&self, key: &str) -> Admission {
        let now = self.clock.now();

        let mut bucket = match self.buckets.get_mut(key) {
            Some(bucket) => bucket,
            None => self
                .buckets
                .entry(key.to_owned())
                .or_insert_with(|| TokenBucket::full(self.capacity, now)),
        };

        bucket.refill(now, self.ttl_secs, self.capacity);
        bucket.last_used = now;

        if bucket.try_consume() {
            Admission::Allowed {
                remaining: bucket.tokens.floor() as u32,
            }
        } else {
            let retry_after = bucket.time_until_available(self.ttl_secs);
            debug!(key, ?retry_after, "Client throttled");
            Admission::Limited { retry_after }
        }
    }

    /// Boolean form of [`check`](Self::check).
    pub fn admit(&self, key: &str) -> bool {
        self.check(key).is_allowed()
    }

    /// Drop buckets idle for longer than the idle horizon.
    ///
    /// Returns the number of evicted keys.
    pub fn evict(&self) -> usize {
        let now = self.clock.now();
        let mut evicted = 0;
        self.buckets.retain(|_, bucket| {
            let keep = now.saturating_duration_since(bucket.last_used) < self.idle_horizon;
            if !keep {
                evicted += 1;
            }
            keep
        });
        if evicted > 0 {
            debug!(evicted, remaining = self.buckets.len(), "Evicted idle clients");
        }
        evicted
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.buckets.len()
    }

    /// Tokens currently held for `key`, without refilling.
    pub fn tokens(&self, key: &str) -> Option<f64> {
        self.buckets.get(key).map(|bucket| bucket.tokens)
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }
}
