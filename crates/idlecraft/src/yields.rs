//! # Yield Table
//!
//! Per-resource yield multipliers.
//!
//! A resource's multiplier is its permanent factor (1.0 until an upgrade
//! scales it) times every active timed boost that covers it.

use std::collections::HashMap;

use idlecraft_economy::{ResourceKey, YieldMultiplier};

/// A temporary multiplier from a consumable effect.
#[derive(Clone, Debug, PartialEq)]
pub struct TimedBoost {
    /// Effect that granted the boost.
    pub source: String,
    /// Resource covered; `None` covers all of them.
    pub resource: Option<ResourceKey>,
    /// Multiplier while active.
    pub factor: f64,
    /// Milliseconds left.
    pub remaining_ms: u64,
}

/// Yield multipliers for every resource.
#[derive(Clone, Debug, Default)]
pub struct YieldTable {
    factors: HashMap<ResourceKey, f64>,
    boosts: Vec<TimedBoost>,
}

impl YieldTable {
    /// Creates a table where every resource yields 1.0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Permanent factor of a resource.
    #[must_use]
    pub fn factor(&self, resource: &str) -> f64 {
        self.factors.get(resource).copied().unwrap_or(1.0)
    }

    /// Multiplies a resource's permanent factor.
    pub fn scale(&mut self, resource: &str, by: f64) {
        let factor = self.factors.entry(resource.to_string()).or_insert(1.0);
        *factor *= by;
    }

    /// Starts a timed boost. A boost from the same source covering the same
    /// resource is refreshed rather than stacked.
    pub fn add_boost(&mut self, boost: TimedBoost) {
        if let Some(existing) = self
            .boosts
            .iter_mut()
            .find(|b| b.source == boost.source && b.resource == boost.resource)
        {
            *existing = boost;
        } else {
            self.boosts.push(boost);
        }
    }

    /// Active timed boosts.
    #[must_use]
    pub fn boosts(&self) -> &[TimedBoost] {
        &self.boosts
    }

    /// Advances the clock. Returns the boosts that ran out.
    pub fn tick(&mut self, elapsed_ms: u64) -> Vec<TimedBoost> {
        let mut expired = Vec::new();
        self.boosts.retain_mut(|boost| {
            boost.remaining_ms = boost.remaining_ms.saturating_sub(elapsed_ms);
            if boost.remaining_ms == 0 {
                expired.push(boost.clone());
                false
            } else {
                true
            }
        });
        expired
    }
}

impl YieldMultiplier for YieldTable {
    fn multiplier(&self, resource_type: &str) -> f64 {
        self.boosts
            .iter()
            .filter(|b| b.resource.as_deref().map_or(true, |r| r == resource_type))
            .fold(self.factor(resource_type), |acc, b| acc * b.factor)
    }
}
