//! shadowblock Core Library
//!
//! This crate provides the domain model shared by the shadowblock compiler
//! and CLI.
//!
//! # Architecture
//!
//! Domains are canonicalized once into a boundary-safe form, so every
//! ancestor/descendant question is a single suffix test. Domains are then
//! sharded by their last two labels; no domain can shadow another across
//! shards, which lets the compiler work on each shard independently.
//!
//! # Modules
//!
//! - `domain`: canonical domains, ancestor predicates, top-level keys
//! - `partition`: the sharded domain map and its frozen, length-sorted form
//! - `directive`: dnsmasq `server=/.../` line format
//! - `types`: Shared type definitions

pub mod directive;
pub mod domain;
pub mod partition;
pub mod types;

// Re-export commonly used types
pub use directive::{format_directive, parse_directive, DirectiveError};
pub use domain::{Domain, DomainError, TopLevelKey};
pub use partition::{FrozenPartitions, Partition, PartitionMap};
pub use types::{Directive, Entry};
