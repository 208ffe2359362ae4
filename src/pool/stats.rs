//! Point-in-time snapshot of pool state

use std::fmt;

/// Counters captured from a pool in one pass.
///
/// `active` and `blocked` are signed because both can swing past their
/// resting bounds while borrows are in flight (a borrower reserves a slot
/// before it knows whether it will get a handle).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolStats {
    /// Handles currently lent to callers.
    pub active: i64,

    /// Handles sitting in the idle registry.
    pub idle: usize,

    /// Callers inside borrow that do not hold a handle yet.
    pub blocked: i64,

    /// Configured capacity.
    pub max_active: usize,
}

impl PoolStats {
    /// Slots left before the pool is exhausted. Negative while borrows are
    /// over-subscribed.
    pub fn before_exhausted(&self) -> i64 {
        self.max_active as i64 - self.active
    }

    /// Whether active count has reached capacity exactly.
    pub fn is_exhausted(&self) -> bool {
        self.before_exhausted() == 0
    }
}

impl fmt::Display for PoolStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "active: {}; blocked: {}; idle: {}; before_exhausted: {}",
            self.active,
            self.blocked,
            self.idle,
            self.before_exhausted()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn before_exhausted_tracks_capacity() {
        let stats = PoolStats {
            active: 3,
            idle: 1,
            blocked: 0,
            max_active: 5,
        };
        assert_eq!(stats.before_exhausted(), 2);
        assert!(!stats.is_exhausted());
    }

    #[test]
    fn exhausted_exactly_at_capacity() {
        let stats = PoolStats {
            active: 5,
            idle: 0,
            blocked: 2,
            max_active: 5,
        };
        assert_eq!(stats.before_exhausted(), 0);
        assert!(stats.is_exhausted());
    }

    #[test]
    fn oversubscribed_goes_negative() {
        let stats = PoolStats {
            active: 6,
            idle: 0,
            blocked: 1,
            max_active: 5,
        };
        assert_eq!(stats.before_exhausted(), -1);
        assert!(!stats.is_exhausted());
    }

    #[test]
    fn display_summarizes_all_counters() {
        let stats = PoolStats {
            active: 2,
            idle: 1,
            blocked: 0,
            max_active: 4,
        };
        assert_eq!(
            stats.to_string(),
            "active: 2; blocked: 0; idle: 1; before_exhausted: 2"
        );
    }
}
