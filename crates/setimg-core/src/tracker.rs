//! Mutation provenance
//!
//! The [`MutationTracker`] is a pure store: it never validates, dedupes or
//! orders. Ordering is applied once, by [`crate::aggregate`].

use setimg_resource::{FileRef, ResourceIdentifier};
use std::collections::HashMap;

/// Where a mutation happened
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MutationKey {
    /// Resource identity
    pub resource: ResourceIdentifier,
    /// Source file path
    pub file_path: String,
    /// Position within the source file
    pub file_index: usize,
    /// Concrete field path
    pub field_path: String,
}

impl MutationKey {
    /// Create key from identity, provenance and field path
    #[inline]
    #[must_use]
    pub fn new(resource: &ResourceIdentifier, file: &FileRef, field_path: impl Into<String>) -> Self {
        Self {
            resource: resource.clone(),
            file_path: file.path.clone(),
            file_index: file.index,
            field_path: field_path.into(),
        }
    }
}

/// One before/after pair
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Change {
    /// Value before the pass
    pub current_value: String,
    /// Value written by the pass
    pub updated_value: String,
}

/// Per-pass accumulator of changes
///
/// Not synchronized; parallel passes give each worker its own tracker and
/// [`merge`](Self::merge) them afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationTracker {
    records: HashMap<MutationKey, Vec<Change>>,
}

impl MutationTracker {
    /// Create empty tracker
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a change under `key`
    pub fn record(&mut self, key: MutationKey, before: impl Into<String>, after: impl Into<String>) {
        self.records.entry(key).or_default().push(Change {
            current_value: before.into(),
            updated_value: after.into(),
        });
    }

    /// Absorb another tracker's records
    pub fn merge(&mut self, other: Self) {
        for (key, changes) in other.records {
            self.records.entry(key).or_default().extend(changes);
        }
    }

    /// Total number of recorded changes
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }

    /// Check if nothing was recorded
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of distinct keys
    #[inline]
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.records.len()
    }

    /// Changes recorded under `key`
    #[inline]
    #[must_use]
    pub fn get(&self, key: &MutationKey) -> Option<&[Change]> {
        self.records.get(key).map(Vec::as_slice)
    }

    /// Iterate records in unspecified order
    pub fn iter(&self) -> impl Iterator<Item = (&MutationKey, &[Change])> {
        self.records.iter().map(|(k, v)| (k, v.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(field: &str) -> MutationKey {
        MutationKey::new(
            &ResourceIdentifier::new("v1", "Pod", "p", ""),
            &FileRef {
                path: "pod.yaml".into(),
                index: 0,
            },
            field,
        )
    }

    #[test]
    fn record_appends_under_key() {
        let mut tracker = MutationTracker::new();
        assert!(tracker.is_empty());

        tracker.record(key("spec.containers[0].image"), "nginx", "nginx:2");
        tracker.record(key("spec.containers[0].image"), "nginx", "nginx:2");
        tracker.record(key("spec.containers[1].image"), "redis", "redis:7");

        assert_eq!(tracker.len(), 3);
        assert_eq!(tracker.key_count(), 2);
        assert_eq!(tracker.get(&key("spec.containers[0].image")).unwrap().len(), 2);
    }

    #[test]
    fn merge_combines_trackers() {
        let mut a = MutationTracker::new();
        a.record(key("x"), "a", "b");
        let mut b = MutationTracker::new();
        b.record(key("x"), "c", "d");
        b.record(key("y"), "e", "f");

        a.merge(b);
        assert_eq!(a.len(), 3);
        let x = a.get(&key("x")).unwrap();
        assert_eq!(x[0].current_value, "a");
        assert_eq!(x[1].current_value, "c");
    }
}
