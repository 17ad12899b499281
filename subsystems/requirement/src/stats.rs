//! # Requirement Statistics
//!
//! Plain counters; the context object is only ever touched from one event
//! handler at a time, so no atomics are needed.

/// Pool and transition counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequirementStats {
    /// Pairs created
    pub allocations: u32,
    /// Slots returned to the pool
    pub frees: u32,
    /// Highest number of live records seen
    pub peak: u32,
    /// Pairings refused for lack of slots
    pub exhausted: u32,
    /// Transitions refused by the slave state machine
    pub rejected: u32,
}

impl RequirementStats {
    /// Zeroed counters
    pub const fn new() -> Self {
        Self {
            allocations: 0,
            frees: 0,
            peak: 0,
            exhausted: 0,
            rejected: 0,
        }
    }

    pub(crate) fn record_alloc(&mut self, live: usize) {
        self.allocations = self.allocations.saturating_add(1);
        self.peak = self.peak.max(live as u32);
    }

    pub(crate) fn record_free(&mut self, count: usize) {
        self.frees = self.frees.saturating_add(count as u32);
    }

    pub(crate) fn record_exhausted(&mut self) {
        self.exhausted = self.exhausted.saturating_add(1);
    }

    pub(crate) fn record_rejected(&mut self) {
        self.rejected = self.rejected.saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peak_tracks_maximum() {
        let mut stats = RequirementStats::new();
        stats.record_alloc(1);
        stats.record_alloc(2);
        stats.record_free(2);
        stats.record_alloc(1);

        assert_eq!(stats.allocations, 3);
        assert_eq!(stats.frees, 2);
        assert_eq!(stats.peak, 2);
    }
}
