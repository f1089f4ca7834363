//! Fan-in of the shadow filter's output
//!
//! A single collector thread drains the channel that all shadow workers send
//! into, then the keep list and the overrides are sorted so two runs over the
//! same input produce the same file.

use crossbeam_channel::Receiver;

use sb_core::domain::Domain;
use sb_core::types::Entry;

/// Drain `rx` until every sender is dropped.
pub fn drain(rx: Receiver<Domain>) -> Vec<Domain> {
    let mut kept = Vec::new();
    for domain in rx {
        kept.push(domain);
    }
    log::info!("Minimal domains collected: {}", kept.len());
    kept
}

/// Final, sorted result of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectedOutput {
    /// Minimal block set
    pub keep: Vec<Domain>,
    /// Allow entries that need an explicit unblock
    pub overrides: Vec<Domain>,
}

impl CollectedOutput {
    pub fn new(mut keep: Vec<Domain>, mut overrides: Vec<Domain>) -> Self {
        keep.sort_unstable();
        keep.dedup();
        overrides.sort_unstable();
        overrides.dedup();
        Self { keep, overrides }
    }

    /// Block entries first, then unblock entries, so every override follows
    /// the block directive of any ancestor.
    pub fn entries(&self) -> impl Iterator<Item = Entry> + '_ {
        self.keep
            .iter()
            .cloned()
            .map(Entry::block)
            .chain(self.overrides.iter().cloned().map(Entry::unblock))
    }

    pub fn len(&self) -> usize {
        self.keep.len() + self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keep.is_empty() && self.overrides.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use sb_core::types::Directive;

    use super::*;

    fn d(s: &str) -> Domain {
        Domain::parse(s).unwrap()
    }

    #[test]
    fn drains_from_many_producers() {
        let (tx, rx) = crossbeam_channel::bounded(4);
        let collector = thread::spawn(move || drain(rx));

        let producers: Vec<_> = (0..8)
            .map(|i| {
                let tx = tx.clone();
                thread::spawn(move || {
                    for j in 0..50 {
                        tx.send(d(&format!("h{}-{}.example.com", i, j))).unwrap();
                    }
                })
            })
            .collect();
        drop(tx);
        for producer in producers {
            producer.join().unwrap();
        }

        let kept = collector.join().unwrap();
        assert_eq!(kept.len(), 400);
    }

    #[test]
    fn output_is_sorted_and_blocks_come_first() {
        let output = CollectedOutput::new(
            vec![d("b.com"), d("a.com"), d("a.com")],
            vec![d("z.a.com"), d("y.a.com")],
        );
        assert_eq!(output.len(), 4);

        let entries: Vec<(Directive, String)> = output
            .entries()
            .map(|entry| (entry.directive, entry.domain.to_string()))
            .collect();
        assert_eq!(
            entries,
            vec![
                (Directive::Block, "a.com".to_string()),
                (Directive::Block, "b.com".to_string()),
                (Directive::Unblock, "y.a.com".to_string()),
                (Directive::Unblock, "z.a.com".to_string()),
            ]
        );
    }
}
