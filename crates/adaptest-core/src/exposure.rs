//! Item exposure tracking.
//!
//! Exposure is the fraction of administrations in which an item has been
//! shown; the selector refuses items whose exposure exceeds its limit.
//! The tracker owns the per-item counters instead of scattering them
//! through shared parameter records, so the caller decides whether a
//! tracker is scoped to one session or shared across many. A tracker
//! shared across concurrent sessions must be serialized externally; it
//! assumes at most one writer at a time.

use std::collections::HashMap;

use crate::model::ItemId;

/// Default fraction added to an item's exposure each time it is served.
pub const DEFAULT_EXPOSURE_INCREMENT: f64 = 0.05;

/// Per-item exposure counters with a saturating increment.
#[derive(Debug, Clone)]
pub struct ExposureTracker {
    counts: HashMap<ItemId, f64>,
    increment: f64,
}

impl Default for ExposureTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ExposureTracker {
    pub fn new() -> Self {
        Self::with_increment(DEFAULT_EXPOSURE_INCREMENT)
    }

    pub fn with_increment(increment: f64) -> Self {
        Self {
            counts: HashMap::new(),
            increment,
        }
    }

    /// Current exposure for an item; 0.0 when it has never been served.
    pub fn exposure(&self, id: &ItemId) -> f64 {
        self.counts.get(id).copied().unwrap_or(0.0)
    }

    /// Add the configured increment to an item's exposure, saturating at
    /// 1.0, and return the new value.
    pub fn record_serve(&mut self, id: &ItemId) -> f64 {
        let entry = self.counts.entry(id.clone()).or_insert(0.0);
        *entry = (*entry + self.increment).min(1.0);
        *entry
    }

    /// Seed a starting exposure, e.g. from historical administration
    /// data. Values are clamped into [0, 1].
    pub fn seed(&mut self, id: ItemId, exposure: f64) {
        self.counts.insert(id, exposure.clamp(0.0, 1.0));
    }

    /// Number of items with recorded exposure.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ItemId, f64)> {
        self.counts.iter().map(|(id, &e)| (id, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unseen_items_have_zero_exposure() {
        let tracker = ExposureTracker::new();
        assert_eq!(tracker.exposure(&ItemId::new("q1")), 0.0);
    }

    #[test]
    fn record_serve_adds_increment() {
        let mut tracker = ExposureTracker::new();
        let id = ItemId::new("q1");
        assert!((tracker.record_serve(&id) - 0.05).abs() < 1e-12);
        assert!((tracker.record_serve(&id) - 0.10).abs() < 1e-12);
        assert!((tracker.exposure(&id) - 0.10).abs() < 1e-12);
    }

    #[test]
    fn exposure_saturates_at_one() {
        let mut tracker = ExposureTracker::with_increment(0.4);
        let id = ItemId::new("q1");
        for _ in 0..5 {
            tracker.record_serve(&id);
        }
        assert_eq!(tracker.exposure(&id), 1.0);
    }

    #[test]
    fn seed_clamps_into_unit_interval() {
        let mut tracker = ExposureTracker::new();
        tracker.seed(ItemId::new("hot"), 1.7);
        tracker.seed(ItemId::new("cold"), -0.3);
        assert_eq!(tracker.exposure(&ItemId::new("hot")), 1.0);
        assert_eq!(tracker.exposure(&ItemId::new("cold")), 0.0);
    }
}
