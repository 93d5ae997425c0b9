use std::collections::HashSet;
use std::ops::RangeInclusive;

/// Positions (0-based) already attributed to a reported change, per side.
///
/// Every phase of an analysis receives the tracker by `&mut` and only sees the
/// claims left by the phases before it; no position is ever claimed twice.
#[derive(Debug, Clone, Default)]
pub struct ClaimTracker {
    source: HashSet<usize>,
    changed: HashSet<usize>,
}

impl ClaimTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_source_claimed(&self, pos: usize) -> bool {
        self.source.contains(&pos)
    }

    pub fn is_changed_claimed(&self, pos: usize) -> bool {
        self.changed.contains(&pos)
    }

    pub fn claim_source(&mut self, pos: usize) {
        let fresh = self.source.insert(pos);
        debug_assert!(fresh, "source line {} claimed twice", pos);
    }

    pub fn claim_changed(&mut self, pos: usize) {
        let fresh = self.changed.insert(pos);
        debug_assert!(fresh, "changed line {} claimed twice", pos);
    }

    pub fn claim_pair(&mut self, source: usize, changed: usize) {
        self.claim_source(source);
        self.claim_changed(changed);
    }

    pub fn source_count(&self) -> usize {
        self.source.len()
    }

    pub fn changed_count(&self) -> usize {
        self.changed.len()
    }
}

/// Which line sequence a position belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Source,
    Changed,
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Side::Source => Side::Changed,
            Side::Changed => Side::Source,
        }
    }
}

impl ClaimTracker {
    pub fn is_claimed(&self, side: Side, pos: usize) -> bool {
        match side {
            Side::Source => self.is_source_claimed(pos),
            Side::Changed => self.is_changed_claimed(pos),
        }
    }

    pub fn claim(&mut self, side: Side, pos: usize) {
        match side {
            Side::Source => self.claim_source(pos),
            Side::Changed => self.claim_changed(pos),
        }
    }

    pub fn claim_range(&mut self, side: Side, range: RangeInclusive<usize>) {
        range.for_each(|pos| self.claim(side, pos));
    }

    pub fn any_claimed(&self, side: Side, mut range: RangeInclusive<usize>) -> bool {
        range.any(|pos| self.is_claimed(side, pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sides_are_independent() {
        let mut claims = ClaimTracker::new();
        claims.claim_pair(1, 4);
        assert!(claims.is_source_claimed(1));
        assert!(!claims.is_changed_claimed(1));
        assert!(claims.is_claimed(Side::Changed, 4));
        assert_eq!(claims.source_count(), 1);
    }

    #[test]
    fn range_queries() {
        let mut claims = ClaimTracker::new();
        claims.claim_range(Side::Source, 3..=5);
        assert!(claims.any_claimed(Side::Source, 0..=3));
        assert!(!claims.any_claimed(Side::Source, 6..=9));
        assert!(!claims.any_claimed(Side::Changed, 3..=5));
    }

    #[test]
    #[should_panic(expected = "claimed twice")]
    #[cfg(debug_assertions)]
    fn double_claims_are_caught() {
        let mut claims = ClaimTracker::new();
        claims.claim_source(2);
        claims.claim_source(2);
    }
}
