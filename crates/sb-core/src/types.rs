//! Core type definitions for shadowblock
//!
//! These types travel from the compiler out to the directive writer.

use crate::domain::Domain;

// =============================================================================
// Directives
// =============================================================================

/// What the resolver should do for a domain and everything below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Directive {
    /// Block the domain and all its subdomains
    Block = 0,
    /// Explicitly unblock a domain that a blocked ancestor would cover
    Unblock = 1,
}

impl TryFrom<u8> for Directive {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Block),
            1 => Ok(Self::Unblock),
            _ => Err(()),
        }
    }
}

/// A domain tagged with the directive to emit for it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Entry {
    pub directive: Directive,
    pub domain: Domain,
}

impl Entry {
    pub fn block(domain: Domain) -> Self {
        Self {
            directive: Directive::Block,
            domain,
        }
    }

    pub fn unblock(domain: Domain) -> Self {
        Self {
            directive: Directive::Unblock,
            domain,
        }
    }
}
