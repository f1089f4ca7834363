//! Reading the input lists from disk
//!
//! The main domains file is mandatory. The manual block list and the allow
//! list are optional corrections: a missing file reads as an empty list.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sb_core::domain::Domain;

use crate::parser::{parse_domain_list, parse_hosts_list, ListKind, ParseError};

/// Error type for loading an input source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("could not find {kind} '{shown}'", shown = .path.display())]
    Missing { kind: ListKind, path: PathBuf },
    #[error("could not read {kind} '{shown}'", shown = .path.display())]
    Io {
        kind: ListKind,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Read and parse the mandatory hosts-format domains file.
pub fn load_hosts_file(path: &Path) -> Result<Vec<Domain>, SourceError> {
    let text = read_source(path, ListKind::Hosts)?.ok_or_else(|| SourceError::Missing {
        kind: ListKind::Hosts,
        path: path.to_path_buf(),
    })?;
    Ok(parse_hosts_list(&text)?)
}

/// Read and parse an optional one-domain-per-line list.
pub fn load_optional_list(path: &Path, kind: ListKind) -> Result<Vec<Domain>, SourceError> {
    match read_source(path, kind)? {
        Some(text) => Ok(parse_domain_list(&text, kind)?),
        None => {
            log::warn!("Could not find {} '{}'; assumed empty", kind, path.display());
            Ok(Vec::new())
        }
    }
}

/// `Ok(None)` if the file does not exist.
fn read_source(path: &Path, kind: ListKind) -> Result<Option<String>, SourceError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(SourceError::Io {
            kind,
            path: path.to_path_buf(),
            source,
        }),
    }
}
