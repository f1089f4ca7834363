//! Domain sets sharded by top-level key
//!
//! Shadowing needs one domain to be a dotted suffix of another, which forces
//! both to share their last two labels. Every partition can therefore be
//! processed on its own.

use std::collections::{HashMap, HashSet};

use crate::domain::{Domain, TopLevelKey};

/// All domains sharing one top-level key.
pub type Partition = HashSet<Domain>;

/// Mutable, deduplicating map from top-level key to partition.
#[derive(Debug, Default, Clone)]
pub struct PartitionMap {
    partitions: HashMap<TopLevelKey, Partition>,
}

impl PartitionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a domain into its partition, creating the partition on first
    /// use. Returns `false` if the domain was already present.
    pub fn insert(&mut self, domain: Domain) -> bool {
        self.partitions
            .entry(domain.top_level_key())
            .or_default()
            .insert(domain)
    }

    pub fn contains(&self, domain: &Domain) -> bool {
        self.partitions
            .get(&domain.top_level_key())
            .is_some_and(|set| set.contains(domain))
    }

    pub fn get(&self, key: &TopLevelKey) -> Option<&Partition> {
        self.partitions.get(key)
    }

    /// Total number of domains across all partitions.
    pub fn len(&self) -> usize {
        self.partitions.values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.values().all(HashSet::is_empty)
    }

    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TopLevelKey, &Partition)> {
        self.partitions.iter()
    }

    /// Take the partitions out, e.g. to wrap them in locks.
    pub fn into_inner(self) -> HashMap<TopLevelKey, Partition> {
        self.partitions
    }

    /// Rebuild from raw partitions. Empty partitions are dropped.
    pub fn from_partitions(partitions: HashMap<TopLevelKey, Partition>) -> Self {
        let partitions = partitions
            .into_iter()
            .filter(|(_, set)| !set.is_empty())
            .collect();
        Self { partitions }
    }

    /// Freeze into per-partition sequences sorted by ascending canonical
    /// length, ready for the shadow scan.
    pub fn freeze(self) -> FrozenPartitions {
        let mut partitions: Vec<Vec<Domain>> = self
            .partitions
            .into_values()
            .filter(|set| !set.is_empty())
            .map(|set| {
                let mut sorted: Vec<Domain> = set.into_iter().collect();
                sorted.sort_unstable_by_key(Domain::canonical_len);
                sorted
            })
            .collect();
        // Largest partitions first so the widest work starts early.
        partitions.sort_unstable_by_key(|p| std::cmp::Reverse(p.len()));

        log::debug!("Froze {} partitions", partitions.len());
        FrozenPartitions { partitions }
    }
}

impl FromIterator<Domain> for PartitionMap {
    fn from_iter<I: IntoIterator<Item = Domain>>(iter: I) -> Self {
        let mut map = Self::new();
        for domain in iter {
            map.insert(domain);
        }
        map
    }
}

impl Extend<Domain> for PartitionMap {
    fn extend<I: IntoIterator<Item = Domain>>(&mut self, iter: I) {
        for domain in iter {
            self.insert(domain);
        }
    }
}

// =============================================================================
// Frozen partitions
// =============================================================================

/// Read-only partitions, each sorted by ascending canonical length.
#[derive(Debug, Default, Clone)]
pub struct FrozenPartitions {
    partitions: Vec<Vec<Domain>>,
}

impl FrozenPartitions {
    pub fn partitions(&self) -> &[Vec<Domain>] {
        &self.partitions
    }

    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    pub fn domain_count(&self) -> usize {
        self.partitions.iter().map(Vec::len).sum()
    }
}
