//! Line parsers for the three input lists
//!
//! The main block list is a hosts file (`0.0.0.0 ads.example.com`); the manual
//! block list and the allow list carry one domain per line. Blank lines and
//! `#` comments are skipped everywhere. Any other line that does not yield a
//! domain fails the whole list.

use std::fmt;
use std::net::IpAddr;

use sb_core::domain::{Domain, DomainError};

/// Which input a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    /// Main hosts-format block list
    Hosts,
    /// Manual block list
    Block,
    /// Allow list
    Allow,
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ListKind::Hosts => "domains file",
            ListKind::Block => "block list",
            ListKind::Allow => "allow list",
        })
    }
}

/// Why a single line was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LineError {
    #[error("expected '<address> <domain>'")]
    MissingDomain,
    #[error("'{0}' is not an IP address")]
    InvalidAddress(String),
    #[error("unexpected trailing field '{0}'")]
    TrailingField(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Aggregate failure for one list: the first bad line plus a count of the rest.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid line {line_no} in {kind}: '{text}': {reason}{suffix}", suffix = further_suffix(.further))]
pub struct ParseError {
    pub kind: ListKind,
    /// 1-based line number of the first malformed line
    pub line_no: usize,
    pub text: String,
    pub reason: LineError,
    /// Malformed lines after the first one
    pub further: usize,
}

fn further_suffix(further: &usize) -> String {
    if *further == 0 {
        String::new()
    } else {
        format!(" (and {} more malformed lines)", further)
    }
}

/// Parse a hosts-format block list.
pub fn parse_hosts_list(text: &str) -> Result<Vec<Domain>, ParseError> {
    parse_lines(text, ListKind::Hosts, parse_hosts_line)
}

/// Parse a one-domain-per-line list.
pub fn parse_domain_list(text: &str, kind: ListKind) -> Result<Vec<Domain>, ParseError> {
    parse_lines(text, kind, |line| Ok(Domain::parse(line)?))
}

fn parse_lines<F>(text: &str, kind: ListKind, parse_line: F) -> Result<Vec<Domain>, ParseError>
where
    F: Fn(&str) -> Result<Domain, LineError>,
{
    let mut domains = Vec::new();
    let mut first_error: Option<ParseError> = None;

    for (idx, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || is_comment_line(line) {
            continue;
        }

        match parse_line(line) {
            Ok(domain) => domains.push(domain),
            Err(reason) => {
                log::debug!("Malformed line {} in {}: {:?}: {}", idx + 1, kind, line, reason);
                match first_error.as_mut() {
                    Some(err) => err.further += 1,
                    None => {
                        first_error = Some(ParseError {
                            kind,
                            line_no: idx + 1,
                            text: line.to_string(),
                            reason,
                            further: 0,
                        })
                    }
                }
            }
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(domains),
    }
}

fn is_comment_line(line: &str) -> bool {
    line.starts_with('#')
}

fn parse_hosts_line(line: &str) -> Result<Domain, LineError> {
    let line = match line.find('#') {
        Some(pos) => line[..pos].trim_end(),
        None => line,
    };

    let mut parts = line.split_whitespace();
    let address = parts.next().ok_or(LineError::MissingDomain)?;
    let domain = parts.next().ok_or(LineError::MissingDomain)?;
    if let Some(extra) = parts.next() {
        return Err(LineError::TrailingField(extra.to_string()));
    }

    if address.parse::<IpAddr>().is_err() {
        return Err(LineError::InvalidAddress(address.to_string()));
    }

    Ok(Domain::parse(domain)?)
}
