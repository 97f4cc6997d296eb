//! Old page index → new page index correspondence
//!
//! Built while pages are emitted to an output document and consumed by
//! the outline remapper. Indices are 0-based.

use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageIndexMap {
    entries: BTreeMap<usize, usize>,
}

impl PageIndexMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every page maps to itself
    pub fn identity(page_count: usize) -> Self {
        Self::offset(page_count, 0)
    }

    /// Pages `0..page_count` map to `offset..offset + page_count`
    pub fn offset(page_count: usize, offset: usize) -> Self {
        Self {
            entries: (0..page_count).map(|i| (i, i + offset)).collect(),
        }
    }

    /// Record where an original page landed; returns the previous mapping
    pub fn insert(&mut self, original: usize, new: usize) -> Option<usize> {
        self.entries.insert(original, new)
    }

    pub fn get(&self, original: usize) -> Option<usize> {
        self.entries.get(&original).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether every index in `0..page_count` has a mapping
    pub fn is_complete(&self, page_count: usize) -> bool {
        self.entries.len() == page_count && (0..page_count).all(|i| self.entries.contains_key(&i))
    }

    /// Whether the map is complete and its values are a permutation of
    /// `0..page_count`
    pub fn is_permutation(&self, page_count: usize) -> bool {
        if !self.is_complete(page_count) {
            return false;
        }
        let mut seen = vec![false; page_count];
        for &new in self.entries.values() {
            if new >= page_count || seen[new] {
                return false;
            }
            seen[new] = true;
        }
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.entries.iter().map(|(&k, &v)| (k, v))
    }
}

impl FromIterator<(usize, usize)> for PageIndexMap {
    fn from_iter<T: IntoIterator<Item = (usize, usize)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_identity_is_permutation() {
        let map = PageIndexMap::identity(5);
        assert!(map.is_complete(5));
        assert!(map.is_permutation(5));
        assert_eq!(map.get(3), Some(3));
        assert_eq!(map.get(5), None);
    }

    #[test]
    fn test_offset_is_complete_but_not_permutation() {
        let map = PageIndexMap::offset(3, 10);
        assert!(map.is_complete(3));
        assert!(!map.is_permutation(3));
        assert_eq!(map.get(0), Some(10));
    }

    #[test]
    fn test_missing_index_is_incomplete() {
        let map: PageIndexMap = vec![(0, 0), (2, 1)].into_iter().collect();
        assert!(!map.is_complete(3));
        assert!(!map.is_permutation(3));
    }

    #[test]
    fn test_duplicate_target_is_not_permutation() {
        let map: PageIndexMap = vec![(0, 0), (1, 0)].into_iter().collect();
        assert!(map.is_complete(2));
        assert!(!map.is_permutation(2));
    }

    proptest! {
        #[test]
        fn out_of_order_insertion_yields_permutation(
            order in Just((0..40usize).collect::<Vec<_>>()).prop_shuffle()
        ) {
            let mut map = PageIndexMap::new();
            for original in order {
                map.insert(original, original);
            }
            prop_assert!(map.is_permutation(40));
        }
    }
}
