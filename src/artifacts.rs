use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const PR_DATA_FILE: &str = "pr_data.json";
pub const COMMENTS_FILE: &str = "comments.json";
pub const DIFF_FILE: &str = "diff.patch";
pub const MAPPINGS_FILE: &str = "mappings.json";
pub const FEEDBACK_FILE: &str = "feedback.json";

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ArtifactError + '_ {
    move |source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    }
}

pub fn ensure_dir(dir: &Path) -> Result<(), ArtifactError> {
    fs::create_dir_all(dir).map_err(io_error(dir))
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ArtifactError> {
    let json = serde_json::to_string_pretty(value).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json + "\n").map_err(io_error(path))?;
    debug!(path = %path.display(), "wrote artifact");
    Ok(())
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let contents = read_text(path)?;
    serde_json::from_str(&contents).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub fn write_text(path: &Path, text: &str) -> Result<(), ArtifactError> {
    fs::write(path, text).map_err(io_error(path))?;
    debug!(path = %path.display(), "wrote artifact");
    Ok(())
}

pub fn read_text(path: &Path) -> Result<String, ArtifactError> {
    fs::read_to_string(path).map_err(io_error(path))
}

/// Write JSON to `path`, or pretty-print it on stdout when no path is given.
pub fn emit_json<T: Serialize + ?Sized>(path: Option<&Path>, value: &T) -> Result<(), ArtifactError> {
    match path {
        Some(path) => write_json(path, value),
        None => {
            let json = serde_json::to_string_pretty(value).map_err(|source| ArtifactError::Json {
                path: PathBuf::from("<stdout>"),
                source,
            })?;
            println!("{}", json);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pr::ReviewComment;

    #[test]
    fn test_json_artifact_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("out/run1");
        ensure_dir(&nested).unwrap();
        let path = nested.join(COMMENTS_FILE);

        let comments: Vec<ReviewComment> =
            serde_json::from_str(include_str!("../tests/fixtures/sample_comments.json")).unwrap();
        write_json(&path, &comments).unwrap();
        let back: Vec<ReviewComment> = read_json(&path).unwrap();
        assert_eq!(back, comments);
    }

    #[test]
    fn test_read_errors_name_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        let err = read_json::<Vec<ReviewComment>>(&missing).unwrap_err();
        assert!(err.to_string().contains("nope.json"));

        let garbage = dir.path().join("garbage.json");
        write_text(&garbage, "{not json").unwrap();
        let err = read_json::<Vec<ReviewComment>>(&garbage).unwrap_err();
        assert!(matches!(err, ArtifactError::Json { .. }));
    }
}
