//! Allow-list reconciliation
//!
//! Every allow entry is a work unit on the rayon pool. An entry removes
//! itself and all its descendants from its partition, and is recorded as an
//! override when a proper ancestor of it is blocked, since removal alone
//! would leave it covered by that ancestor.
//!
//! # Locking
//!
//! - one `RwLock` per top-level key, created on demand (double-checked)
//! - the key-to-lock map has its own `RwLock`
//! - the override set has its own `Mutex`
//!
//! A work unit holds at most one partition lock at a time and takes the
//! override lock only after releasing it.
//!
//! # Passes
//!
//! Overrides are decided against the block set as it stood before any
//! removal, so the outcome never depends on scheduling. `run` therefore
//! makes two joined passes: classify every entry under read locks, then
//! remove under write locks.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rayon::prelude::*;

use sb_core::domain::{Domain, TopLevelKey};
use sb_core::partition::{Partition, PartitionMap};

// =============================================================================
// Per-key locks
// =============================================================================

/// Partitions wrapped in one lock per top-level key.
pub struct PartitionLocks {
    locks: RwLock<HashMap<TopLevelKey, Arc<RwLock<Partition>>>>,
}

impl PartitionLocks {
    pub fn new(partitions: PartitionMap) -> Self {
        let locks = partitions
            .into_inner()
            .into_iter()
            .map(|(key, set)| (key, Arc::new(RwLock::new(set))))
            .collect();
        Self {
            locks: RwLock::new(locks),
        }
    }

    /// Lock for `key`, creating an empty partition if none exists yet.
    /// An existing lock is never replaced.
    pub fn lock_for(&self, key: &TopLevelKey) -> Arc<RwLock<Partition>> {
        if let Some(lock) = self.locks.read().get(key) {
            return Arc::clone(lock);
        }

        let mut locks = self.locks.write();
        let lock = locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(RwLock::new(Partition::new())));
        Arc::clone(lock)
    }

    /// Number of keys with a lock.
    pub fn len(&self) -> usize {
        self.locks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Unwrap the locks once every work unit has finished.
    pub fn into_partitions(self) -> PartitionMap {
        let partitions: HashMap<TopLevelKey, Partition> = self
            .locks
            .into_inner()
            .into_iter()
            .map(|(key, lock)| {
                let set = match Arc::try_unwrap(lock) {
                    Ok(lock) => lock.into_inner(),
                    Err(shared) => shared.read().clone(),
                };
                (key, set)
            })
            .collect();
        PartitionMap::from_partitions(partitions)
    }
}

// =============================================================================
// Override set
// =============================================================================

/// Allow entries that need an explicit unblock directive.
#[derive(Default)]
pub struct OverrideSet {
    entries: Mutex<BTreeSet<Domain>>,
}

impl OverrideSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, domain: Domain) -> bool {
        self.entries.lock().insert(domain)
    }

    pub fn contains(&self, domain: &Domain) -> bool {
        self.entries.lock().contains(domain)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Overrides in canonical order.
    pub fn into_sorted(self) -> Vec<Domain> {
        self.entries.into_inner().into_iter().collect()
    }
}

// =============================================================================
// Reconciler
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub entries: usize,
    pub removed: usize,
    pub overrides: usize,
    /// Entries that neither removed a domain nor became an override
    pub untouched: usize,
}

pub struct Reconciled {
    pub partitions: PartitionMap,
    pub overrides: Vec<Domain>,
    pub stats: ReconcileStats,
}

pub struct Reconciler {
    locks: PartitionLocks,
    overrides: OverrideSet,
}

impl Reconciler {
    pub fn new(partitions: PartitionMap) -> Self {
        Self {
            locks: PartitionLocks::new(partitions),
            overrides: OverrideSet::new(),
        }
    }

    /// Apply the allow list on the current rayon pool.
    pub fn run(self, entries: &[Domain]) -> Reconciled {
        let marked: Vec<bool> = entries
            .par_iter()
            .map(|entry| self.classify_entry(entry))
            .collect();

        let removed: Vec<usize> = entries
            .par_iter()
            .map(|entry| self.remove_entry(entry))
            .collect();

        let untouched = marked
            .iter()
            .zip(&removed)
            .filter(|(marked, removed)| !**marked && **removed == 0)
            .count();

        let stats = ReconcileStats {
            entries: entries.len(),
            removed: removed.iter().sum(),
            overrides: self.overrides.len(),
            untouched,
        };

        log::info!(
            "Applied allow list: {} entries, {} domains removed, {} overrides",
            stats.entries,
            stats.removed,
            stats.overrides
        );

        Reconciled {
            partitions: self.locks.into_partitions(),
            overrides: self.overrides.into_sorted(),
            stats,
        }
    }

    /// Record `entry` as an override if a proper ancestor of it is blocked.
    pub fn classify_entry(&self, entry: &Domain) -> bool {
        let lock = self.locks.lock_for(&entry.top_level_key());

        let shadower = {
            let partition = lock.read();
            entry
                .ancestors()
                .find(|ancestor| partition.contains(*ancestor))
                .map(str::to_string)
        };

        match shadower {
            Some(shadower) => {
                log::debug!("Add domain to explicit allow list: {} (shadowed by {})", entry, &shadower[1..]);
                self.overrides.insert(entry.clone());
                true
            }
            None => false,
        }
    }

    /// Remove `entry` and its descendants. Returns how many domains this call
    /// removed.
    pub fn remove_entry(&self, entry: &Domain) -> usize {
        let lock = self.locks.lock_for(&entry.top_level_key());

        let doomed: Vec<Domain> = lock
            .read()
            .iter()
            .filter(|domain| domain.is_within(entry))
            .cloned()
            .collect();
        if doomed.is_empty() {
            return 0;
        }

        let mut partition = lock.write();
        let mut removed = 0usize;
        for domain in doomed {
            if partition.remove(&domain) {
                log::debug!("Remove domain because of allow list: {} (entry {})", domain, entry);
                removed += 1;
            }
        }
        removed
    }
}

/// Apply the allow list to `partitions` on the current rayon pool.
pub fn reconcile_allow_list(partitions: PartitionMap, entries: &[Domain]) -> Reconciled {
    Reconciler::new(partitions).run(entries)
}
