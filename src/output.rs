//! Delivering the rendered manifest to a file or standard output.

use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

use crate::error::{Error, Result};

/// Write `text` to `path`, replacing any existing file in one step.
///
/// The text lands in a temporary file next to `path` first, so a failed run
/// never leaves a half-written manifest behind.
pub fn write_file(path: &Path, text: &str) -> Result<()> {
    let output_error = |source: std::io::Error| Error::Output {
        path: path.display().to_string(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir).map_err(output_error)?;
    file.write_all(text.as_bytes()).map_err(output_error)?;
    file.as_file().sync_all().map_err(output_error)?;
    file.persist(path).map_err(|e| output_error(e.error))?;

    info!("Wrote manifest to {}", path.display());
    Ok(())
}

/// Print `text` on standard output.
pub fn write_stdout(text: &str) -> Result<()> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(text.as_bytes())
        .and_then(|_| handle.flush())
        .map_err(|source| Error::Output {
            path: "<stdout>".to_string(),
            source,
        })
}

/// Send `text` to `path` when given, else to standard output.
pub fn emit(text: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => write_file(path, text),
        None => write_stdout(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use assert_fs::TempDir;
    use assert_matches::assert_matches;
    use predicates::prelude::*;

    #[test]
    fn test_write_file_creates_manifest() {
        let temp = TempDir::new().unwrap();
        let target = temp.child(".mrconfig");

        write_file(target.path(), "# Generated by github2mr - 0 repositories\n").unwrap();

        target.assert("# Generated by github2mr - 0 repositories\n");
    }

    #[test]
    fn test_write_file_replaces_existing() {
        let temp = TempDir::new().unwrap();
        let target = temp.child(".mrconfig");
        target.write_str("old contents\n").unwrap();

        write_file(target.path(), "new contents\n").unwrap();

        target.assert(predicate::str::contains("new").and(predicate::str::contains("old").not()));
        // Only the manifest itself remains in the directory
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_file_missing_directory() {
        let temp = TempDir::new().unwrap();
        let target = temp.child("missing/dir/.mrconfig");

        let result = write_file(target.path(), "text");
        assert_matches!(result, Err(Error::Output { .. }));
        target.assert(predicate::path::missing());
    }
}
