use crossbeam_channel::Sender;
use rayon::prelude::*;

use sb_core::domain::Domain;
use sb_core::partition::FrozenPartitions;

pub struct ShadowStats {
    pub before: usize,
    pub after: usize,
    pub shadowed: usize,
    pub partitions: usize,
}

impl ShadowStats {
    pub fn new(before: usize, after: usize, partitions: usize) -> Self {
        Self {
            before,
            after,
            shadowed: before.saturating_sub(after),
            partitions,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("result collector stopped before the shadow filter finished")]
pub struct SinkClosed;

/// True if some proper ancestor of `domain` is in `sorted`.
///
/// `sorted` must be ordered by ascending canonical length. An ancestor is
/// strictly shorter than its descendant, so the scan stops at the first
/// longer candidate.
#[inline]
pub fn is_shadowed(sorted: &[Domain], domain: &Domain) -> bool {
    let len = domain.canonical_len();
    for candidate in sorted {
        if candidate.canonical_len() > len {
            break;
        }
        if candidate.is_ancestor_of(domain) {
            return true;
        }
    }
    false
}

/// Minimal set of one length-sorted partition, in input order.
pub fn minimal_set(sorted: &[Domain]) -> Vec<Domain> {
    sorted
        .iter()
        .filter(|domain| !is_shadowed(sorted, domain))
        .cloned()
        .collect()
}

/// Send every domain that no other domain shadows to `sink`, in parallel over
/// partitions and over the domains inside each partition.
///
/// The sink is dropped on return, so a collector draining it sees the channel
/// close once all producers are done.
pub fn emit_minimal(frozen: &FrozenPartitions, sink: Sender<Domain>) -> Result<(), SinkClosed> {
    frozen.partitions().par_iter().try_for_each(|partition| {
        partition
            .par_iter()
            .filter(|domain| !is_shadowed(partition, domain))
            .try_for_each_with(sink.clone(), |tx, domain| {
                tx.send(domain.clone()).map_err(|_| SinkClosed)
            })
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use proptest::prelude::*;
    use sb_core::partition::PartitionMap;

    use super::*;

    fn d(s: &str) -> Domain {
        Domain::parse(s).unwrap()
    }

    fn minimal_names(domains: &[&str]) -> BTreeSet<String> {
        let frozen = domains.iter().map(|s| d(s)).collect::<PartitionMap>().freeze();
        frozen
            .partitions()
            .iter()
            .flat_map(|p| minimal_set(p))
            .map(|domain| domain.to_string())
            .collect()
    }

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn drops_shadowed_subdomains() {
        assert_eq!(
            minimal_names(&["example.com", "x.example.com", "a.b.example.com", "example.org"]),
            set(&["example.com", "example.org"])
        );
    }

    #[test]
    fn keeps_boundary_lookalikes() {
        assert_eq!(
            minimal_names(&["evil-example.com", "example.com"]),
            set(&["evil-example.com", "example.com"])
        );
        assert_eq!(
            minimal_names(&["evilexample.com", "example.com", "ads.evilexample.com"]),
            set(&["evilexample.com", "example.com"])
        );
    }

    #[test]
    fn scans_past_same_length_candidates() {
        // Same-length siblings sort ahead of the real ancestor's descendant.
        assert_eq!(
            minimal_names(&["aa.example.com", "bb.example.com", "x.bb.example.com", "cc.example.com"]),
            set(&["aa.example.com", "bb.example.com", "cc.example.com"])
        );
    }

    #[test]
    fn keeps_deep_chain_root_only() {
        assert_eq!(
            minimal_names(&["d.c.b.example.com", "c.b.example.com", "b.example.com"]),
            set(&["b.example.com"])
        );
    }

    #[test]
    fn is_shadowed_stops_at_longer_candidates() {
        let sorted = vec![d("a.com"), d("x.a.com"), d("long.x.a.com")];
        assert!(!is_shadowed(&sorted, &d("a.com")));
        assert!(is_shadowed(&sorted, &d("x.a.com")));
        assert!(is_shadowed(&sorted, &d("long.x.a.com")));
    }

    #[test]
    fn emits_through_channel() {
        let frozen = ["example.com", "x.example.com", "example.org", "y.example.org", "z.example.net"]
            .iter()
            .map(|s| d(s))
            .collect::<PartitionMap>()
            .freeze();

        let (tx, rx) = crossbeam_channel::unbounded();
        emit_minimal(&frozen, tx).unwrap();
        let emitted: BTreeSet<String> = rx.iter().map(|domain| domain.to_string()).collect();

        assert_eq!(emitted, set(&["example.com", "example.org", "z.example.net"]));
    }

    #[test]
    fn reports_closed_sink() {
        let frozen = [d("example.com")].into_iter().collect::<PartitionMap>().freeze();
        let (tx, rx) = crossbeam_channel::bounded(1);
        drop(rx);
        assert_eq!(emit_minimal(&frozen, tx), Err(SinkClosed));
    }

    #[test]
    fn stats_count_shadowed() {
        let stats = ShadowStats::new(10, 4, 3);
        assert_eq!(stats.shadowed, 6);
    }

    // -------------------------------------------------------------------------
    // Properties
    // -------------------------------------------------------------------------

    fn domain_strategy() -> impl Strategy<Value = Domain> {
        let label = prop::sample::select(vec!["a", "b", "ab", "ba", "xa"]);
        let base = prop::sample::select(vec!["example.com", "aexample.com", "example.org"]);
        (prop::collection::vec(label, 0..4), base).prop_map(|(labels, base)| {
            let mut name = labels.join(".");
            if !name.is_empty() {
                name.push('.');
            }
            name.push_str(base);
            Domain::parse(&name).unwrap()
        })
    }

    fn minimal_of(domains: Vec<Domain>) -> Vec<Domain> {
        let frozen = domains.into_iter().collect::<PartitionMap>().freeze();
        frozen.partitions().iter().flat_map(|p| minimal_set(p)).collect()
    }

    proptest! {
        #[test]
        fn minimality_is_idempotent(domains in prop::collection::vec(domain_strategy(), 0..60)) {
            let once: BTreeSet<Domain> = minimal_of(domains).into_iter().collect();
            let twice: BTreeSet<Domain> = minimal_of(once.iter().cloned().collect()).into_iter().collect();
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn coverage_is_preserved(domains in prop::collection::vec(domain_strategy(), 0..60)) {
            let minimal = minimal_of(domains.clone());
            for domain in &domains {
                prop_assert!(minimal.iter().any(|kept| domain.is_within(kept)));
            }
            for kept in &minimal {
                prop_assert!(!minimal.iter().any(|other| other.is_ancestor_of(kept)));
            }
        }
    }
}
