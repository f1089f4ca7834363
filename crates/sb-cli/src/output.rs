use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

use sb_compiler::{write_servers_file, CollectedOutput};

/// Write the servers file next to `path` and rename it into place, so a
/// failed run never leaves a truncated file behind.
pub fn write_output(path: &Path, output: &CollectedOutput) -> Result<usize> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).with_context(|| format!("Failed to create '{}'", dir.display()))?;

    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in '{}'", dir.display()))?;
    let written = write_servers_file(output, tmp.as_file_mut())
        .with_context(|| format!("Failed to write '{}'", tmp.path().display()))?;
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("Failed to sync '{}'", tmp.path().display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(tmp.path(), fs::Permissions::from_mode(0o644))
            .with_context(|| format!("Failed to set permissions on '{}'", tmp.path().display()))?;
    }

    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to replace '{}'", path.display()))?;
    Ok(written)
}

pub fn read_output(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use sb_core::domain::Domain;
    use tempfile::TempDir;

    use super::*;

    fn d(s: &str) -> Domain {
        Domain::parse(s).unwrap()
    }

    #[test]
    fn writes_and_replaces_output() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("servers-blacklist");

        let first = CollectedOutput::new(vec![d("example.com")], vec![d("x.example.com")]);
        assert_eq!(write_output(&path, &first).unwrap(), 2);
        assert_eq!(
            read_output(&path).unwrap(),
            "server=/example.com/\nserver=/x.example.com/#\n"
        );

        let second = CollectedOutput::new(vec![d("example.org")], Vec::new());
        write_output(&path, &second).unwrap();
        assert_eq!(read_output(&path).unwrap(), "server=/example.org/\n");

        let leftovers = fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn missing_output_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(read_output(&dir.path().join("absent")).is_err());
    }
}
