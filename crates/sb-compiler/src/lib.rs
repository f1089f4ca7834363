//! shadowblock Blocklist Compiler
//!
//! This crate turns a hosts-format blocklist plus personal block and allow
//! lists into a minimal dnsmasq servers file.

pub mod parser;
pub mod sources;
pub mod merger;
pub mod reconciler;
pub mod shadow;
pub mod collector;
pub mod builder;
pub mod check;
pub mod pipeline;

pub use builder::{build_servers_file, write_servers_file};
pub use check::{check_servers_file, CheckReport};
pub use collector::CollectedOutput;
pub use parser::{parse_domain_list, parse_hosts_list, ListKind, ParseError};
pub use pipeline::{compile, CompileOptions, Compiled, Inputs};
pub use reconciler::{reconcile_allow_list, Reconciler};
pub use shadow::{emit_minimal, minimal_set};
pub use sources::{load_hosts_file, load_optional_list, SourceError};
