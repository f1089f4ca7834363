//! dnsmasq `--servers-file` directive format
//!
//! ```text
//! server=/ads.example.com/       block (no upstream server)
//! server=/cdn.ads.example.com/#  unblock (use the default servers)
//! ```

use std::fmt;

use crate::domain::{Domain, DomainError};
use crate::types::{Directive, Entry};

const PREFIX: &str = "server=/";
const BLOCK_SUFFIX: &str = "/";
const UNBLOCK_SUFFIX: &str = "/#";

/// Error type for reading directive lines back.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectiveError {
    #[error("not a server directive: '{0}'")]
    NotADirective(String),
    #[error("invalid domain in directive: {0}")]
    InvalidDomain(#[from] DomainError),
}

/// Formats one entry as a directive line, without the newline.
pub struct DirectiveLine<'a>(pub &'a Entry);

impl fmt::Display for DirectiveLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = match self.0.directive {
            Directive::Block => BLOCK_SUFFIX,
            Directive::Unblock => UNBLOCK_SUFFIX,
        };
        write!(f, "{}{}{}", PREFIX, self.0.domain, suffix)
    }
}

/// Format one entry as a directive line, without the newline.
pub fn format_directive(entry: &Entry) -> String {
    DirectiveLine(entry).to_string()
}

/// Parse one directive line. Surrounding whitespace is ignored.
pub fn parse_directive(line: &str) -> Result<Entry, DirectiveError> {
    let line = line.trim();
    let rest = line
        .strip_prefix(PREFIX)
        .ok_or_else(|| DirectiveError::NotADirective(line.to_string()))?;

    let (name, directive) = if let Some(name) = rest.strip_suffix(UNBLOCK_SUFFIX) {
        (name, Directive::Unblock)
    } else if let Some(name) = rest.strip_suffix(BLOCK_SUFFIX) {
        (name, Directive::Block)
    } else {
        return Err(DirectiveError::NotADirective(line.to_string()));
    };

    Ok(Entry {
        directive,
        domain: Domain::parse(name)?,
    })
}
