//! Inter-stage artifacts on disk.
//!
//! Stages never share memory; each one reads the previous stage's file and
//! writes its own. JSON artifacts are UTF-8, 2-space indented, non-ASCII
//! kept verbatim. Writes go to a sibling temp file first and are renamed
//! into place, so an aborted run never leaves a half-written artifact that a
//! later "skip if exists" would trust.

use crate::error::QuizGenError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default artifact locations used by the `run-all` orchestrator.
pub const DEFAULT_INPUT: &str = "input/base_questions.docx";
pub const DEFAULT_PARSED: &str = "output/parsed.json";
pub const DEFAULT_QUESTIONS: &str = "output/questions.json";
pub const DEFAULT_IMAGES_DIR: &str = "output/images";
pub const DEFAULT_RESULT: &str = "output/result.docx";

/// File name of the Illustrator manifest inside the image directory.
pub const IMAGE_MANIFEST: &str = "images.json";

/// Serialise `value` as pretty JSON and write it atomically to `path`.
pub fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<(), QuizGenError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| QuizGenError::Internal(format!("serialise {}: {e}", path.display())))?;
    write_atomic(path, json.as_bytes())?;
    debug!("Wrote {} ({} bytes)", path.display(), json.len());
    Ok(())
}

/// Read and decode a JSON artifact.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, QuizGenError> {
    let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => QuizGenError::FileNotFound {
            path: path.to_path_buf(),
        },
        ErrorKind::PermissionDenied => QuizGenError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => QuizGenError::ArtifactRead {
            path: path.to_path_buf(),
            source: e,
        },
    })?;
    serde_json::from_str(&text).map_err(|e| QuizGenError::ArtifactParse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Write bytes to `path` through a temp file + rename.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), QuizGenError> {
    let write_err = |source| QuizGenError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };
    ensure_parent(path)?;
    let tmp = tmp_sibling(path);
    std::fs::write(&tmp, bytes).map_err(write_err)?;
    std::fs::rename(&tmp, path).map_err(write_err)
}

/// Create the parent directory of `path` if it has one.
pub fn ensure_parent(path: &Path) -> Result<(), QuizGenError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent),
        _ => Ok(()),
    }
}

/// Create `dir` and all missing ancestors.
pub fn ensure_dir(dir: &Path) -> Result<(), QuizGenError> {
    std::fs::create_dir_all(dir).map_err(|e| QuizGenError::OutputWriteFailed {
        path: dir.to_path_buf(),
        source: e,
    })
}

/// Remove a previous output file so it can be rewritten.
///
/// A missing file is fine. A file that cannot be removed because another
/// process holds it open surfaces as [`QuizGenError::OutputLocked`].
pub fn remove_stale_output(path: &Path) -> Result<bool, QuizGenError> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            info!("Removed old file: {}", path.display());
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) if e.kind() == ErrorKind::PermissionDenied => Err(QuizGenError::OutputLocked {
            path: path.to_path_buf(),
        }),
        Err(e) => Err(QuizGenError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// `result.docx` → `result.docx.tmp`, in the same directory so rename is atomic.
fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "artifact".into());
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QuestionRecord, QuestionSet};

    #[test]
    fn save_then_load_question_set() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/questions.json");
        let set = QuestionSet {
            questions: vec![QuestionRecord {
                title: "Área".into(),
                order: 1,
                ..Default::default()
            }],
        };
        save_json(&set, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("Área"), "non-ASCII must be kept verbatim");
        assert!(text.contains("\n  \"questions\""), "2-space indent expected: {text}");
        assert!(!dir.path().join("nested/out/questions.json.tmp").exists());

        let back: QuestionSet = load_json(&path).unwrap();
        assert_eq!(back, set);
    }

    #[test]
    fn load_missing_is_file_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_json::<QuestionSet>(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, QuizGenError::FileNotFound { .. }));
    }

    #[test]
    fn load_garbage_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = load_json::<QuestionSet>(&path).unwrap_err();
        assert!(matches!(err, QuizGenError::ArtifactParse { .. }));
    }

    #[test]
    fn remove_stale_output_reports_whether_removed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.docx");
        assert!(!remove_stale_output(&path).unwrap());
        std::fs::write(&path, b"old").unwrap();
        assert!(remove_stale_output(&path).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn tmp_sibling_keeps_directory() {
        let p = tmp_sibling(Path::new("out/result.docx"));
        assert_eq!(p, PathBuf::from("out/result.docx.tmp"));
    }
}
