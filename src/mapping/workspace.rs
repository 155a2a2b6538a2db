use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::warn;

/// Line counts of files in the current working copy, used to reject
/// mappings that land past the end of a file.
pub trait FileLines {
    /// None when the count is unknown. A file known to be absent is
    /// reported as `Some(0)`.
    fn line_count(&self, path: &str) -> Option<usize>;
}

/// No working copy available; no bounds checks.
pub struct NoWorkingCopy;

impl FileLines for NoWorkingCopy {
    fn line_count(&self, _path: &str) -> Option<usize> {
        None
    }
}

/// Files read from a checkout on disk.
pub struct WorkingCopy {
    root: PathBuf,
}

impl WorkingCopy {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FileLines for WorkingCopy {
    fn line_count(&self, path: &str) -> Option<usize> {
        match std::fs::read_to_string(self.root.join(path)) {
            Ok(contents) => Some(contents.lines().count()),
            Err(err) if err.kind() == ErrorKind::NotFound => Some(0),
            Err(err) => {
                warn!(path, error = %err, "cannot read working copy file, skipping bounds check");
                None
            }
        }
    }
}

impl FileLines for HashMap<String, usize> {
    fn line_count(&self, path: &str) -> Option<usize> {
        self.get(path).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_working_copy_counts_lines() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/lib.rs"), "a\nb\nc\n").unwrap();

        let copy = WorkingCopy::new(dir.path());
        assert_eq!(copy.line_count("src/lib.rs"), Some(3));
        assert_eq!(copy.line_count("src/missing.rs"), Some(0));
    }

    #[test]
    fn test_no_working_copy_is_unknown() {
        assert_eq!(NoWorkingCopy.line_count("anything"), None);
    }
}
