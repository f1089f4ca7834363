//! Reading back a generated servers file
//!
//! Used to audit a published file: every line must be a directive, and no
//! block directive may be shadowed by another one.

use std::collections::HashSet;

use sb_core::directive::{parse_directive, DirectiveError};
use sb_core::domain::Domain;
use sb_core::partition::PartitionMap;
use sb_core::types::Directive;

use crate::shadow::is_shadowed;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid line {line_no} in servers file: '{text}': {reason}")]
pub struct CheckError {
    pub line_no: usize,
    pub text: String,
    pub reason: DirectiveError,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    pub blocks: usize,
    pub unblocks: usize,
    pub duplicates: usize,
    /// Block directives covered by another block directive, sorted
    pub shadowed: Vec<Domain>,
    /// Unblock directives with no blocked ancestor, sorted
    pub stray_unblocks: Vec<Domain>,
}

impl CheckReport {
    /// A minimal file has no duplicates and no shadowed block directives.
    pub fn is_minimal(&self) -> bool {
        self.duplicates == 0 && self.shadowed.is_empty()
    }
}

/// Audit the contents of a servers file. Blank lines and `#` comments are
/// skipped.
pub fn check_servers_file(text: &str) -> Result<CheckReport, CheckError> {
    let mut blocks: HashSet<Domain> = HashSet::new();
    let mut unblocks: HashSet<Domain> = HashSet::new();
    let mut report = CheckReport::default();

    for (idx, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let entry = parse_directive(line).map_err(|reason| CheckError {
            line_no: idx + 1,
            text: line.to_string(),
            reason,
        })?;

        let fresh = match entry.directive {
            Directive::Block => blocks.insert(entry.domain),
            Directive::Unblock => unblocks.insert(entry.domain),
        };
        if !fresh {
            report.duplicates += 1;
        }
    }

    report.blocks = blocks.len();
    report.unblocks = unblocks.len();

    let frozen = blocks.iter().cloned().collect::<PartitionMap>().freeze();
    report.shadowed = frozen
        .partitions()
        .iter()
        .flat_map(|partition| {
            partition
                .iter()
                .filter(move |domain| is_shadowed(partition, domain))
                .cloned()
        })
        .collect();
    report.shadowed.sort_unstable();

    report.stray_unblocks = unblocks
        .into_iter()
        .filter(|domain| !domain.ancestors().any(|ancestor| blocks.contains(ancestor)))
        .collect();
    report.stray_unblocks.sort_unstable();

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Domain {
        Domain::parse(s).unwrap()
    }

    #[test]
    fn accepts_minimal_file() {
        let report = check_servers_file(
            "server=/example.com/\nserver=/example.org/\n\n# note\nserver=/x.example.com/#\n",
        )
        .unwrap();
        assert_eq!(report.blocks, 2);
        assert_eq!(report.unblocks, 1);
        assert!(report.is_minimal());
        assert!(report.stray_unblocks.is_empty());
    }

    #[test]
    fn flags_shadowed_and_duplicate_blocks() {
        let report = check_servers_file(
            "server=/example.com/\nserver=/ads.example.com/\nserver=/example.com/\n",
        )
        .unwrap();
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.shadowed, vec![d("ads.example.com")]);
        assert!(!report.is_minimal());
    }

    #[test]
    fn flags_stray_unblocks() {
        let report = check_servers_file("server=/example.com/\nserver=/x.example.org/#\n").unwrap();
        assert_eq!(report.stray_unblocks, vec![d("x.example.org")]);
        assert!(report.is_minimal());
    }

    #[test]
    fn rejects_malformed_line() {
        let err = check_servers_file("server=/example.com/\naddress=/x/0.0.0.0\n").unwrap_err();
        assert_eq!(err.line_no, 2);
        assert!(matches!(err.reason, DirectiveError::NotADirective(_)));
    }
}
