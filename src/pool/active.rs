//! Concurrency-safe tracking of handles currently out on loan

use dashmap::DashSet;

/// Set of handle ids lent to callers.
///
/// Membership is keyed by the pool-assigned handle id, so a handle can be
/// checked in and out without the set ever owning the connection itself.
#[derive(Debug, Default)]
pub(crate) struct ActiveSet {
    ids: DashSet<u64>,
}

impl ActiveSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record a handle as lent out. Returns false if it was already present.
    pub(crate) fn insert(&self, id: u64) -> bool {
        self.ids.insert(id)
    }

    /// Remove a handle on release. Absence is not an error; releasing a
    /// handle the pool never issued is a caller-contract violation we
    /// tolerate.
    pub(crate) fn remove(&self, id: u64) -> bool {
        self.ids.remove(&id).is_some()
    }

    pub(crate) fn contains(&self, id: u64) -> bool {
        self.ids.contains(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_remove_round_trip() {
        let set = ActiveSet::new();
        assert!(set.insert(1));
        assert!(set.insert(2));
        assert_eq!(set.len(), 2);
        assert!(set.contains(1));

        assert!(set.remove(1));
        assert!(!set.contains(1));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn double_insert_reports_existing_membership() {
        let set = ActiveSet::new();
        assert!(set.insert(9));
        assert!(!set.insert(9));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn removing_unknown_id_is_tolerated() {
        let set = ActiveSet::new();
        assert!(!set.remove(42));
        assert_eq!(set.len(), 0);
    }
}
