use sb_core::domain::Domain;
use sb_core::partition::PartitionMap;

pub struct MergeStats {
    pub entries: usize,
    pub inserted: usize,
    pub duplicates: usize,
}

/// Fold the manual block list into the partitions.
pub fn merge_block_list(partitions: &mut PartitionMap, entries: Vec<Domain>) -> MergeStats {
    let count = entries.len();
    let mut inserted = 0usize;

    for domain in entries {
        if partitions.insert(domain) {
            inserted += 1;
        }
    }

    log::info!("Merged block list: {} entries, {} new", count, inserted);

    MergeStats {
        entries: count,
        inserted,
        duplicates: count - inserted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Domain {
        Domain::parse(s).unwrap()
    }

    #[test]
    fn merges_new_and_duplicate_entries() {
        let mut partitions: PartitionMap = [d("example.com")].into_iter().collect();
        let stats = merge_block_list(
            &mut partitions,
            vec![d("example.com"), d("tracker.example.org"), d("tracker.example.org")],
        );

        assert_eq!(stats.entries, 3);
        assert_eq!(stats.inserted, 1);
        assert_eq!(stats.duplicates, 2);
        assert_eq!(partitions.len(), 2);
        assert!(partitions.contains(&d("tracker.example.org")));
    }

    #[test]
    fn empty_block_list_is_noop() {
        let mut partitions: PartitionMap = [d("example.com")].into_iter().collect();
        let stats = merge_block_list(&mut partitions, Vec::new());
        assert_eq!(stats.inserted, 0);
        assert_eq!(partitions.len(), 1);
    }
}
