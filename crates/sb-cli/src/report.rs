use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use sb_compiler::pipeline::CompileStats;

/// Machine-readable summary of a build run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub domains_read: usize,
    pub partitions: usize,
    pub block_list_entries: usize,
    pub block_list_inserted: usize,
    pub allow_list_entries: usize,
    pub allow_list_untouched: usize,
    pub removed: usize,
    pub overrides: usize,
    pub before_filter: usize,
    pub minimal: usize,
    pub shadowed: usize,
    pub timings_ms: Timings,
}

#[derive(Debug, Clone, Serialize)]
pub struct Timings {
    pub partition: f64,
    pub merge: f64,
    pub reconcile: f64,
    pub filter: f64,
    pub total: f64,
}

impl From<&CompileStats> for RunReport {
    fn from(stats: &CompileStats) -> Self {
        Self {
            domains_read: stats.domains_read,
            partitions: stats.partitions,
            block_list_entries: stats.merge.entries,
            block_list_inserted: stats.merge.inserted,
            allow_list_entries: stats.reconcile.entries,
            allow_list_untouched: stats.reconcile.untouched,
            removed: stats.reconcile.removed,
            overrides: stats.reconcile.overrides,
            before_filter: stats.shadow.before,
            minimal: stats.shadow.after,
            shadowed: stats.shadow.shadowed,
            timings_ms: Timings {
                partition: stats.timings.partition_ms,
                merge: stats.timings.merge_ms,
                reconcile: stats.timings.reconcile_ms,
                filter: stats.timings.filter_ms,
                total: stats.timings.total_ms,
            },
        }
    }
}

impl RunReport {
    pub fn print(&self) {
        println!("  Domains:    {} read, {} top-level keys", self.domains_read, self.partitions);
        println!(
            "  Block list: {} entries ({} new)",
            self.block_list_entries, self.block_list_inserted
        );
        println!(
            "  Allow list: {} entries, {} domains removed, {} overrides",
            self.allow_list_entries, self.removed, self.overrides
        );
        println!(
            "  Minimal:    {} -> {} (shadowed {})",
            self.before_filter, self.minimal, self.shadowed
        );
        println!(
            "  Time:       {:.1}ms (partition: {:.1}ms, merge: {:.1}ms, reconcile: {:.1}ms, filter: {:.1}ms)",
            self.timings_ms.total,
            self.timings_ms.partition,
            self.timings_ms.merge,
            self.timings_ms.reconcile,
            self.timings_ms.filter,
        );
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize run report")?;
        fs::write(path, json).with_context(|| format!("Failed to write '{}'", path.display()))
    }
}
