// src/reconcile/satisfied.rs
use chrono::NaiveDate;
use std::collections::HashSet;

/// (class id, fiscal period) pairs already bound during one batch.
///
/// Owned by the caller's processing loop and passed into each batch so
/// repeated runs never share state. Call [`SatisfiedSet::reset`] between
/// logical batches (e.g. per filer).
#[derive(Debug, Clone, Default)]
pub struct SatisfiedSet {
    pairs: HashSet<(String, Option<NaiveDate>)>,
}

impl SatisfiedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the pair and returns true, or returns false if an earlier
    /// document already claimed it.
    pub fn try_claim(&mut self, class_id: &str, period: Option<NaiveDate>) -> bool {
        self.pairs.insert((class_id.to_string(), period))
    }

    pub fn is_satisfied(&self, class_id: &str, period: Option<NaiveDate>) -> bool {
        self.pairs.contains(&(class_id.to_string(), period))
    }

    /// True if the class has been bound for any period.
    pub fn has_class(&self, class_id: &str) -> bool {
        self.pairs.iter().any(|(id, _)| id == class_id)
    }

    /// Needed class ids not yet bound for any period.
    pub fn remaining<'n>(&self, needed: &'n HashSet<String>) -> Vec<&'n str> {
        let mut remaining: Vec<&str> = needed
            .iter()
            .filter(|class_id| !self.has_class(class_id))
            .map(String::as_str)
            .collect();
        remaining.sort_unstable();
        remaining
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn reset(&mut self) {
        self.pairs.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_claim_wins() {
        let fye = NaiveDate::from_ymd_opt(2024, 12, 31);
        let mut set = SatisfiedSet::new();

        assert!(set.try_claim("C000123456", fye));
        assert!(!set.try_claim("C000123456", fye));
        assert!(set.is_satisfied("C000123456", fye));

        // Another period of the same class is a separate pair
        assert!(set.try_claim("C000123456", NaiveDate::from_ymd_opt(2023, 12, 31)));
        assert!(set.try_claim("C000123456", None));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_remaining_and_reset() {
        let needed: HashSet<String> = ["C1", "C2", "C3"].iter().map(|s| s.to_string()).collect();
        let mut set = SatisfiedSet::new();
        set.try_claim("C2", None);

        assert_eq!(set.remaining(&needed), vec!["C1", "C3"]);
        assert!(set.has_class("C2"));

        set.reset();
        assert!(set.is_empty());
        assert_eq!(set.remaining(&needed).len(), 3);
    }
}
