//! Canonical domain names and boundary-safe suffix predicates
//!
//! Every domain is stored with a leading `.` so that "is an ancestor of"
//! becomes a plain `ends_with` on the canonical string:
//!
//! ```
//! use sb_core::domain::Domain;
//!
//! let parent = Domain::parse("example.com").unwrap();
//! let child = Domain::parse("ads.example.com").unwrap();
//! let lookalike = Domain::parse("evilexample.com").unwrap();
//!
//! assert!(parent.is_ancestor_of(&child));
//! assert!(!parent.is_ancestor_of(&lookalike));
//! ```

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

/// Label separator, also used as the boundary marker in canonical form.
const SEP: char = '.';

/// Error type for domain canonicalization.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("empty domain")]
    Empty,
    #[error("domain '{0}' has fewer than two labels")]
    MissingTopLevelKey(String),
    #[error("domain '{0}' contains an empty label")]
    EmptyLabel(String),
    #[error("domain '{0}' contains an invalid character")]
    InvalidCharacter(String),
}

// =============================================================================
// Domain
// =============================================================================

/// A canonical domain name.
///
/// Equality, hashing and ordering all work on the canonical string, which is
/// the lowercased name with the boundary marker prepended.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Domain {
    canonical: String,
}

impl Domain {
    /// Canonicalize a raw domain string.
    ///
    /// Surrounding whitespace and one trailing root dot are ignored. ASCII
    /// letters are lowercased.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        let trimmed = trimmed.strip_suffix(SEP).unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Err(DomainError::Empty);
        }

        if trimmed
            .chars()
            .any(|c| c.is_whitespace() || c == '/' || c.is_control())
        {
            return Err(DomainError::InvalidCharacter(trimmed.to_string()));
        }

        let mut labels = 0usize;
        for label in trimmed.split(SEP) {
            if label.is_empty() {
                return Err(DomainError::EmptyLabel(trimmed.to_string()));
            }
            labels += 1;
        }
        if labels < 2 {
            return Err(DomainError::MissingTopLevelKey(trimmed.to_string()));
        }

        let mut canonical = String::with_capacity(trimmed.len() + 1);
        canonical.push(SEP);
        canonical.push_str(&trimmed.to_ascii_lowercase());
        Ok(Self { canonical })
    }

    /// The canonical form, including the leading boundary marker.
    #[inline]
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// The plain name, without the boundary marker.
    #[inline]
    pub fn name(&self) -> &str {
        &self.canonical[1..]
    }

    /// Length of the canonical form. An ancestor is always shorter than its
    /// descendants.
    #[inline]
    pub fn canonical_len(&self) -> usize {
        self.canonical.len()
    }

    /// Labels from leftmost to rightmost.
    pub fn labels(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.name().split(SEP)
    }

    pub fn label_count(&self) -> usize {
        self.labels().count()
    }

    /// True if `other` is this domain prefixed with one or more labels.
    #[inline]
    pub fn is_ancestor_of(&self, other: &Domain) -> bool {
        other.canonical.len() > self.canonical.len() && other.canonical.ends_with(&self.canonical)
    }

    #[inline]
    pub fn is_descendant_of(&self, other: &Domain) -> bool {
        other.is_ancestor_of(self)
    }

    /// True if this domain equals `other` or lies below it.
    #[inline]
    pub fn is_within(&self, other: &Domain) -> bool {
        self.canonical.ends_with(&other.canonical)
    }

    /// The sharding key: the last two labels.
    pub fn top_level_key(&self) -> TopLevelKey {
        TopLevelKey(self.canonical[self.top_level_start()..].to_string())
    }

    /// Proper ancestors, nearest first, down to and including the domain
    /// made of the last two labels. Items are canonical strings.
    pub fn ancestors(&self) -> Ancestors<'_> {
        Ancestors {
            current: &self.canonical,
            floor: self.canonical.len() - self.top_level_start(),
        }
    }

    /// Byte offset of the boundary marker in front of the last two labels.
    fn top_level_start(&self) -> usize {
        let mut dots = self.canonical.rmatch_indices(SEP);
        dots.next();
        // Canonical form always carries at least two boundary markers.
        dots.next().map(|(idx, _)| idx).unwrap_or(0)
    }
}

impl FromStr for Domain {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lets hash sets of domains be probed with a canonical `&str`.
impl Borrow<str> for Domain {
    fn borrow(&self) -> &str {
        &self.canonical
    }
}

// =============================================================================
// Ancestor walk
// =============================================================================

/// Iterator over the proper ancestors of a domain.
pub struct Ancestors<'a> {
    current: &'a str,
    floor: usize,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current.len() <= self.floor {
            return None;
        }
        let next_sep = self.current[1..].find(SEP)? + 1;
        self.current = &self.current[next_sep..];
        Some(self.current)
    }
}

// =============================================================================
// Top-level key
// =============================================================================

/// Last two labels of a domain, in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TopLevelKey(String);

impl TopLevelKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TopLevelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0[1..])
    }
}
