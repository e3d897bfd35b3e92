#![expect(
    clippy::module_name_repetitions,
    reason = "Subscription types deliberately include the module name for clarity"
)]

use std::collections::HashSet;

/// Ordered set of subscribed identifiers.
///
/// Identifiers keep their first-insertion order, which is also the order they appear in on the
/// wire. The set is always sent whole: the feed protocol has no incremental subscribe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionSet {
    ordered: Vec<String>,
    members: HashSet<String>,
}

impl SubscriptionSet {
    #[must_use]
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::default();
        set.extend(ids);
        set
    }

    /// Adds identifiers that are not already present. Returns how many were new.
    pub fn extend<I, S>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let before = self.ordered.len();
        for id in ids {
            let id = id.into();
            if self.members.insert(id.clone()) {
                self.ordered.push(id);
            }
        }
        self.ordered.len() - before
    }

    /// Removes identifiers. Returns how many were present.
    pub fn remove<I, S>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let removed: HashSet<String> = ids
            .into_iter()
            .filter_map(|id| self.members.take(id.as_ref()))
            .collect();

        if !removed.is_empty() {
            self.ordered.retain(|id| !removed.contains(id));
        }
        removed.len()
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.members.contains(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.ordered
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<String> {
        self.ordered.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_first_insertion_order_without_duplicates() {
        let mut set = SubscriptionSet::new(["A", "B"]);

        assert_eq!(set.extend(["B", "C", "A", "D"]), 2);
        assert_eq!(set.as_slice(), ["A", "B", "C", "D"]);
    }

    #[test]
    fn remove_reports_only_present_ids() {
        let mut set = SubscriptionSet::new(["A", "B", "C"]);

        assert_eq!(set.remove(["B", "Z"]), 1);
        assert_eq!(set.as_slice(), ["A", "C"]);
        assert!(!set.contains("B"));
    }

    #[test]
    fn readding_after_remove_moves_to_end() {
        let mut set = SubscriptionSet::new(["A", "B"]);

        set.remove(["A"]);
        set.extend(["A"]);

        assert_eq!(set.snapshot(), vec!["B".to_owned(), "A".to_owned()]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn empty_set() {
        let mut set = SubscriptionSet::default();

        assert!(set.is_empty());
        assert_eq!(set.remove(["A"]), 0);
    }
}
