//! Set of tag IDs wanted from a single directory scan.

use std::collections::HashSet;

/// Tag IDs to collect from one directory, plus the largest of them.
///
/// Entries of a directory are sorted by tag ID, so once the scan reaches
/// [`max`](Self::max) nothing further can match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WantedSet {
    ids: HashSet<u16>,
    max: u16,
}

impl WantedSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag ID.
    pub fn insert(&mut self, id: u16) {
        self.ids.insert(id);
        self.max = self.max.max(id);
    }

    /// Check if a tag ID is wanted.
    #[inline]
    pub fn contains(&self, id: u16) -> bool {
        self.ids.contains(&id)
    }

    /// Largest wanted tag ID, 0 when empty.
    #[inline]
    pub fn max(&self) -> u16 {
        self.max
    }

    /// Check if nothing is wanted.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of wanted tag IDs.
    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }
}

impl FromIterator<u16> for WantedSet {
    fn from_iter<I: IntoIterator<Item = u16>>(iter: I) -> Self {
        let mut set = WantedSet::new();
        set.extend(iter);
        set
    }
}

impl Extend<u16> for WantedSet {
    fn extend<I: IntoIterator<Item = u16>>(&mut self, iter: I) {
        for id in iter {
            self.insert(id);
        }
    }
}
