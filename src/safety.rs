//! Safety check so rendered output never overwrites the song list it came from.

use anyhow::{bail, Result};
use std::path::Path;

/// Validates that an output path is safe to (over)write.
///
/// Checks:
/// - Output cannot be an existing directory
/// - Output cannot be the source song list (compared after resolving symlinks
///   and relative segments when both exist)
pub fn validate_output_path(output: &Path, source: Option<&Path>) -> Result<()> {
    if output.is_dir() {
        bail!(
            "Safety check failed: output '{}' is a directory",
            output.display()
        );
    }

    if let Some(source) = source {
        let same = output == source
            || match (output.canonicalize(), source.canonicalize()) {
                (Ok(a), Ok(b)) => a == b,
                _ => false,
            };
        if same {
            bail!(
                "Safety check failed: output '{}' cannot be the same as source '{}'",
                output.display(),
                source.display()
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_valid_output() {
        let output = PathBuf::from("/tmp/playlist-results.html");
        let source = PathBuf::from("/data/songs.json");
        assert!(validate_output_path(&output, Some(&source)).is_ok());
        assert!(validate_output_path(&output, None).is_ok());
    }

    #[test]
    fn test_output_equals_source() {
        let path = PathBuf::from("/data/songs.json");
        let result = validate_output_path(&path, Some(&path));
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("cannot be the same as source"));
    }

    #[test]
    fn test_output_equals_source_via_relative_path() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("songs.json");
        std::fs::write(&source, "[]").unwrap();
        let sneaky = dir.path().join(".").join("songs.json");
        assert!(validate_output_path(&sneaky, Some(&source)).is_err());
    }

    #[test]
    fn test_output_is_directory() {
        let dir = tempfile::tempdir().unwrap();
        let result = validate_output_path(dir.path(), None);
        assert!(result.unwrap_err().to_string().contains("is a directory"));
    }
}
