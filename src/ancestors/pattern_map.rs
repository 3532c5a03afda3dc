//! # Ordered Pattern Map
//!
//! Deduplicating map from genotype pattern to the sites that carry it,
//! one map per frequency bucket. Keys are the raw pattern bytes and
//! compare lexicographically; iteration runs from smallest to largest
//! key, which makes descriptor emission deterministic across runs.
//!
//! Entries are kept in a sorted vector and located by binary search: the
//! O(log n) lookup the structure needs, with the canonical pattern bytes
//! owned by the [`PatternArena`] and never copied on a hit.

use crate::ancestors::arena::{ArenaRef, PatternArena};
use crate::data::site::SiteId;
use crate::error::Result;

/// One distinct genotype pattern within a frequency bucket.
#[derive(Debug)]
pub struct PatternEntry {
    /// Canonical pattern bytes, owned by the builder's arena
    pub genotypes: ArenaRef,
    /// Sites sharing the pattern, in insertion order
    pub sites: Vec<SiteId>,
}

impl PatternEntry {
    /// Number of sites carrying this pattern
    pub fn num_sites(&self) -> usize {
        self.sites.len()
    }
}

/// Ordered map from genotype pattern to [`PatternEntry`].
#[derive(Debug, Default)]
pub struct PatternMap {
    /// Sorted lexicographically by canonical pattern bytes
    entries: Vec<PatternEntry>,
}

impl PatternMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct patterns
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in ascending key order
    pub fn iter(&self) -> impl Iterator<Item = &PatternEntry> {
        self.entries.iter()
    }

    /// Look up `genotypes`, interning it into `arena` on a miss.
    ///
    /// On a hit the incoming buffer is only compared against the
    /// arena-owned canonical copy and then discarded.
    pub fn get_or_insert(
        &mut self,
        arena: &mut PatternArena,
        genotypes: &[u8],
    ) -> Result<&mut PatternEntry> {
        let idx = match self
            .entries
            .binary_search_by(|e| arena.get(e.genotypes).cmp(genotypes))
        {
            Ok(idx) => idx,
            Err(idx) => {
                let canonical = arena.intern(genotypes)?;
                self.entries.try_reserve(1)?;
                self.entries.insert(
                    idx,
                    PatternEntry {
                        genotypes: canonical,
                        sites: Vec::new(),
                    },
                );
                idx
            }
        };
        Ok(&mut self.entries[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_shares_canonical_bytes() {
        let mut arena = PatternArena::new(64);
        let mut map = PatternMap::new();

        let a = map.get_or_insert(&mut arena, &[1, 1, 0, 0]).unwrap();
        a.sites.push(SiteId::new(0));
        let first_ref = a.genotypes;

        let b = map.get_or_insert(&mut arena, &[1, 1, 0, 0]).unwrap();
        b.sites.push(SiteId::new(1));

        assert_eq!(map.len(), 1);
        let entry = map.iter().next().unwrap();
        assert_eq!(entry.genotypes, first_ref);
        assert_eq!(entry.sites, vec![SiteId::new(0), SiteId::new(1)]);
        assert_eq!(arena.get(entry.genotypes), &[1, 1, 0, 0]);
    }

    #[test]
    fn test_iteration_is_lexicographic() {
        let mut arena = PatternArena::new(64);
        let mut map = PatternMap::new();

        map.get_or_insert(&mut arena, &[1, 1, 0, 0]).unwrap();
        map.get_or_insert(&mut arena, &[0, 1, 1, 0]).unwrap();
        map.get_or_insert(&mut arena, &[1, 0, 1, 0]).unwrap();

        let keys: Vec<&[u8]> = map.iter().map(|e| arena.get(e.genotypes)).collect();
        assert_eq!(keys, vec![&[0, 1, 1, 0], &[1, 0, 1, 0], &[1, 1, 0, 0]]);
    }

    #[test]
    fn test_distinct_patterns_get_distinct_entries() {
        let mut arena = PatternArena::new(64);
        let mut map = PatternMap::new();

        map.get_or_insert(&mut arena, &[0, 0, 1]).unwrap();
        map.get_or_insert(&mut arena, &[0, 1, 0]).unwrap();
        assert_eq!(map.len(), 2);
    }
}
