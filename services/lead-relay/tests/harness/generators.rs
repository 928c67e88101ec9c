// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test data generators.

use lead_relay::validator::LeadSubmission;
use serde_json::{json, Value};
use std::net::{IpAddr, Ipv4Addr};

/// Generate a pool of IP addresses for testing.
pub fn generate_ips(count: usize) -> Vec<IpAddr> {
    (0..count)
        .map(|i| {
            // Use 10.x.x.x private range
            let a = ((i >> 16) & 0xFF) as u8;
            let b = ((i >> 8) & 0xFF) as u8;
            let c = (i & 0xFF) as u8;
            IpAddr::V4(Ipv4Addr::new(10, a, b, c))
        })
        .collect()
}

/// A valid lead, varied by index.
pub fn valid_lead(i: usize) -> LeadSubmission {
    LeadSubmission {
        name: format!("Lead {i}"),
        phone: format!("+1555{:07}", i % 10_000_000),
        email: format!("lead{i}@example.com"),
        message: Some(format!("Please call me about job {i}")),
    }
}

pub fn valid_lead_json() -> Value {
    json!({
        "name": "Grace Hopper",
        "phone": "+12025550123",
        "email": "grace@example.com",
        "message": "Need a quote for a kitchen remodel",
    })
}

fn altered(f: impl FnOnce(&mut LeadSubmission)) -> LeadSubmission {
    let mut lead = valid_lead(1);
    f(&mut lead);
    lead
}

/// Submissions that must be rejected, with the field at fault.
pub fn malformed_leads() -> Vec<(LeadSubmission, &'static str)> {
    vec![
        (altered(|l| l.name = String::new()), "name"),
        (altered(|l| l.name = "A".to_string()), "name"),
        (altered(|l| l.name = "N".repeat(32)), "name"),
        (altered(|l| l.phone = String::new()), "phone"),
        (altered(|l| l.phone = "5551234567".to_string()), "phone"),
        (altered(|l| l.phone = "+1555abc4567".to_string()), "phone"),
        (altered(|l| l.phone = "+1234567890123456".to_string()), "phone"),
        (altered(|l| l.email = String::new()), "email"),
        (altered(|l| l.email = "not-an-email".to_string()), "email"),
        (altered(|l| l.email = "a@b".to_string()), "email"),
        (altered(|l| l.email = "two@@example.com".to_string()), "email"),
        (altered(|l| l.email = "<script>@example.com".to_string()), "email"),
        (altered(|l| l.message = Some("x".to_string())), "message"),
        (altered(|l| l.message = Some("m".repeat(256))), "message"),
    ]
}

/// Small deterministic generator for reproducible interleavings.
#[derive(Debug, Clone)]
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn next_u64(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.0 >> 33
    }

    /// Uniform in `0..bound`.
    pub fn below(&mut self, bound: u64) -> u64 {
        self.next_u64() % bound.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lead_relay::validator::validate;

    #[test]
    fn test_generate_ips() {
        let ips = generate_ips(256);
        assert_eq!(ips.len(), 256);
        let unique: std::collections::HashSet<_> = ips.iter().collect();
        assert_eq!(unique.len(), 256);
    }

    #[test]
    fn test_valid_leads_pass_validation() {
        for i in [0, 1, 42, 9_999_999] {
            assert!(validate(&valid_lead(i)).is_valid(), "lead {i}");
        }
    }

    #[test]
    fn test_lcg_is_deterministic() {
        let mut a = Lcg::new(7);
        let mut b = Lcg::new(7);
        for _ in 0..10 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }
}
