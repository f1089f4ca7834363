//! End-to-end compile: partition → merge → reconcile → filter → collect
//!
//! Each phase is joined before the next one starts. Merging must finish
//! before reconciliation so overrides see the whole block list; reconciliation
//! must finish before filtering so the filter reads frozen partitions.

use std::thread;
use std::time::Instant;

use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

use sb_core::domain::Domain;
use sb_core::partition::PartitionMap;

use crate::collector::{drain, CollectedOutput};
use crate::merger::{merge_block_list, MergeStats};
use crate::reconciler::{reconcile_allow_list, ReconcileStats};
use crate::shadow::{emit_minimal, ShadowStats, SinkClosed};

pub const DEFAULT_CHANNEL_CAPACITY: usize = 4096;

/// Parsed input lists.
#[derive(Debug, Clone, Default)]
pub struct Inputs {
    pub domains: Vec<Domain>,
    pub block_list: Vec<Domain>,
    pub allow_list: Vec<Domain>,
}

#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Worker threads; 0 picks rayon's default (one per CPU)
    pub threads: usize,
    /// Bound of the channel between shadow workers and the collector
    pub channel_capacity: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            threads: 0,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("failed to start worker pool: {0}")]
    Pool(#[from] ThreadPoolBuildError),
    #[error(transparent)]
    Sink(#[from] SinkClosed),
    #[error("result collector panicked")]
    CollectorPanicked,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PhaseTimings {
    pub partition_ms: f64,
    pub merge_ms: f64,
    pub reconcile_ms: f64,
    pub filter_ms: f64,
    pub total_ms: f64,
}

pub struct CompileStats {
    pub domains_read: usize,
    pub partitions: usize,
    pub merge: MergeStats,
    pub reconcile: ReconcileStats,
    pub shadow: ShadowStats,
    pub timings: PhaseTimings,
}

pub struct Compiled {
    pub output: CollectedOutput,
    pub stats: CompileStats,
}

/// Run every phase on a fresh worker pool.
pub fn compile(inputs: Inputs, options: &CompileOptions) -> Result<Compiled, CompileError> {
    let pool = build_pool(options.threads)?;
    compile_on(&pool, inputs, options.channel_capacity)
}

fn build_pool(threads: usize) -> Result<ThreadPool, ThreadPoolBuildError> {
    ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|idx| format!("sb-worker-{}", idx))
        .build()
}

fn compile_on(pool: &ThreadPool, inputs: Inputs, channel_capacity: usize) -> Result<Compiled, CompileError> {
    let start = Instant::now();
    let Inputs {
        domains,
        block_list,
        allow_list,
    } = inputs;

    let domains_read = domains.len();
    let mut partitions: PartitionMap = domains.into_iter().collect();
    log::info!(
        "Finished reading domains: {} domains, {} unique in {} top-level keys",
        domains_read,
        partitions.len(),
        partitions.partition_count()
    );
    let partition_time = start.elapsed();

    let merge_start = Instant::now();
    let merge = merge_block_list(&mut partitions, block_list);
    let merge_time = merge_start.elapsed();

    let reconcile_start = Instant::now();
    let reconciled = pool.install(|| reconcile_allow_list(partitions, &allow_list));
    let reconcile_time = reconcile_start.elapsed();

    let filter_start = Instant::now();
    let frozen = reconciled.partitions.freeze();
    let before = frozen.domain_count();
    let partition_count = frozen.partition_count();

    let (tx, rx) = crossbeam_channel::bounded(channel_capacity.max(1));
    let (emitted, collected) = thread::scope(|scope| {
        let collector = scope.spawn(move || drain(rx));
        log::info!("Started shadow filter over {} partitions", partition_count);
        let emitted = pool.install(|| emit_minimal(&frozen, tx));
        (emitted, collector.join())
    });
    emitted?;
    let keep = collected.map_err(|_| CompileError::CollectorPanicked)?;
    let filter_time = filter_start.elapsed();

    let shadow = ShadowStats::new(before, keep.len(), partition_count);
    let output = CollectedOutput::new(keep, reconciled.overrides);

    let stats = CompileStats {
        domains_read,
        partitions: partition_count,
        merge,
        reconcile: reconciled.stats,
        shadow,
        timings: PhaseTimings {
            partition_ms: partition_time.as_secs_f64() * 1000.0,
            merge_ms: merge_time.as_secs_f64() * 1000.0,
            reconcile_ms: reconcile_time.as_secs_f64() * 1000.0,
            filter_ms: filter_time.as_secs_f64() * 1000.0,
            total_ms: start.elapsed().as_secs_f64() * 1000.0,
        },
    };

    Ok(Compiled { output, stats })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Domain {
        Domain::parse(s).unwrap()
    }

    fn ds(names: &[&str]) -> Vec<Domain> {
        names.iter().map(|s| d(s)).collect()
    }

    fn run(domains: &[&str], block_list: &[&str], allow_list: &[&str]) -> Compiled {
        let inputs = Inputs {
            domains: ds(domains),
            block_list: ds(block_list),
            allow_list: ds(allow_list),
        };
        let options = CompileOptions {
            threads: 4,
            channel_capacity: 2,
        };
        compile(inputs, &options).unwrap()
    }

    #[test]
    fn allowed_subdomain_of_blocked_domain_becomes_override() {
        let compiled = run(&["example.com", "x.example.com"], &[], &["x.example.com"]);
        assert_eq!(compiled.output.keep, ds(&["example.com"]));
        assert_eq!(compiled.output.overrides, ds(&["x.example.com"]));
    }

    #[test]
    fn allowed_standalone_domain_is_just_removed() {
        let compiled = run(&["a.com", "b.com"], &[], &["a.com"]);
        assert_eq!(compiled.output.keep, ds(&["b.com"]));
        assert!(compiled.output.overrides.is_empty());
    }

    #[test]
    fn lookalikes_are_both_kept() {
        let compiled = run(&["evil-example.com", "example.com"], &[], &[]);
        assert_eq!(compiled.output.keep, ds(&["evil-example.com", "example.com"]));
    }

    #[test]
    fn block_list_is_merged_before_allow_list() {
        // The manual entry shadows the allow entry, so it must be overridden.
        let compiled = run(&["ads.tracker.net"], &["tracker.net"], &["cdn.tracker.net"]);
        assert_eq!(compiled.output.keep, ds(&["tracker.net"]));
        assert_eq!(compiled.output.overrides, ds(&["cdn.tracker.net"]));
        assert_eq!(compiled.stats.merge.inserted, 1);
    }

    #[test]
    fn counts_every_phase() {
        let compiled = run(
            &["example.com", "a.example.com", "a.example.com", "b.example.org", "c.example.org"],
            &["example.org"],
            &["c.example.org"],
        );
        let stats = &compiled.stats;
        assert_eq!(stats.domains_read, 5);
        assert_eq!(stats.merge.inserted, 1);
        assert_eq!(stats.reconcile.removed, 1);
        assert_eq!(stats.reconcile.overrides, 1);
        assert_eq!(stats.shadow.before, 4);
        assert_eq!(stats.shadow.after, 2);
        assert_eq!(stats.shadow.shadowed, 2);
        assert_eq!(compiled.output.keep, ds(&["example.com", "example.org"]));
        assert_eq!(compiled.output.overrides, ds(&["c.example.org"]));
    }

    #[test]
    fn empty_inputs_give_empty_output() {
        let compiled = compile(Inputs::default(), &CompileOptions::default()).unwrap();
        assert!(compiled.output.is_empty());
        assert_eq!(compiled.stats.partitions, 0);
    }

    #[test]
    fn large_input_with_small_channel() {
        let mut domains = Vec::new();
        for i in 0..500 {
            domains.push(format!("site{}.com", i));
            domains.push(format!("ads.site{}.com", i));
        }
        let names: Vec<&str> = domains.iter().map(String::as_str).collect();
        let compiled = run(&names, &[], &["ads.site7.com", "site9.com"]);

        assert_eq!(compiled.output.keep.len(), 499);
        assert_eq!(compiled.output.overrides, ds(&["ads.site7.com"]));
    }
}
