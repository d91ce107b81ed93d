//! Locating the source package.
//!
//! The Extractor needs a local .docx. A path is checked where it is; an
//! http(s) URL is fetched into a scratch directory owned by the returned
//! [`SourceDocx`] and removed with it. In both cases the file must open as
//! a ZIP archive holding [`MAIN_PART`], so a renamed PDF or an unrelated
//! archive is rejected before any output is written.

use crate::error::QuizGenError;
use reqwest::Url;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info};

/// Package part every WordprocessingML document carries.
pub const MAIN_PART: &str = "word/document.xml";

const FALLBACK_NAME: &str = "downloaded.docx";

/// A checked .docx on local disk.
#[derive(Debug)]
pub struct SourceDocx {
    path: PathBuf,
    scratch: Option<TempDir>,
}

impl SourceDocx {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_downloaded(&self) -> bool {
        self.scratch.is_some()
    }
}

/// Turn `input` (a path or an http/https URL) into a checked local package.
pub async fn locate(input: &str, timeout_secs: u64) -> Result<SourceDocx, QuizGenError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(QuizGenError::InvalidInput {
            input: input.to_string(),
        });
    }

    let source = match Url::parse(input) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => fetch(url, timeout_secs).await?,
        _ => SourceDocx {
            path: PathBuf::from(input),
            scratch: None,
        },
    };
    check_package(&source.path)?;
    debug!("Source package: {}", source.path.display());
    Ok(source)
}

/// Fail unless `path` is a readable ZIP archive containing [`MAIN_PART`].
pub fn check_package(path: &Path) -> Result<(), QuizGenError> {
    if !path.is_file() {
        return Err(QuizGenError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => QuizGenError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => QuizGenError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;

    let not_docx = |reason: String| QuizGenError::NotADocx {
        path: path.to_path_buf(),
        reason,
    };
    let mut archive =
        zip::ZipArchive::new(file).map_err(|e| not_docx(format!("not a ZIP package ({e})")))?;
    if archive.by_name(MAIN_PART).is_err() {
        return Err(not_docx(format!("package has no {MAIN_PART} part")));
    }
    Ok(())
}

async fn fetch(url: Url, timeout_secs: u64) -> Result<SourceDocx, QuizGenError> {
    info!("Downloading document from {}", url);
    let failed = |reason: String| QuizGenError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;
    let body = get_body(&client, &url).await.map_err(|e| {
        if e.is_timeout() {
            QuizGenError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    })?;

    let scratch = tempfile::Builder::new()
        .prefix("quizgen-")
        .tempdir()
        .map_err(|e| QuizGenError::Internal(format!("cannot create download directory: {e}")))?;
    let path = scratch.path().join(download_name(&url));
    tokio::fs::write(&path, &body)
        .await
        .map_err(|e| QuizGenError::Internal(format!("cannot save download: {e}")))?;

    info!("Downloaded {} bytes to {}", body.len(), path.display());
    Ok(SourceDocx {
        path,
        scratch: Some(scratch),
    })
}

async fn get_body(client: &reqwest::Client, url: &Url) -> reqwest::Result<Vec<u8>> {
    let response = client.get(url.clone()).send().await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}

/// Last URL segment when it names a .docx, otherwise a fixed name.
fn download_name(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| name.to_ascii_lowercase().ends_with(".docx"))
        .unwrap_or(FALLBACK_NAME)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_zip(path: &Path, entry: &str) {
        let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
        zip.start_file(entry, zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"<x/>").unwrap();
        zip.finish().unwrap();
    }

    #[test]
    fn download_name_keeps_docx_segment() {
        let url = |s: &str| Url::parse(s).unwrap();
        assert_eq!(download_name(&url("https://x.org/a/base.docx")), "base.docx");
        assert_eq!(download_name(&url("https://x.org/a/Base.DOCX")), "Base.DOCX");
        assert_eq!(download_name(&url("https://x.org/get?id=4")), FALLBACK_NAME);
        assert_eq!(download_name(&url("https://x.org/files/")), FALLBACK_NAME);
    }

    #[test]
    fn missing_file_and_directory_are_not_found() {
        let err = check_package(Path::new("/definitely/not/here.docx")).unwrap_err();
        assert!(matches!(err, QuizGenError::FileNotFound { .. }));
        let dir = tempfile::tempdir().unwrap();
        let err = check_package(dir.path()).unwrap_err();
        assert!(matches!(err, QuizGenError::FileNotFound { .. }));
    }

    #[test]
    fn renamed_pdf_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("fake.docx");
        std::fs::write(&p, b"%PDF-1.7 not a docx").unwrap();
        match check_package(&p).unwrap_err() {
            QuizGenError::NotADocx { reason, .. } => assert!(reason.contains("ZIP")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn zip_without_document_part_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("notes.docx");
        write_zip(&p, "notes.txt");
        match check_package(&p).unwrap_err() {
            QuizGenError::NotADocx { reason, .. } => assert!(reason.contains(MAIN_PART)),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn local_docx_is_located_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("ok.docx");
        write_zip(&p, MAIN_PART);
        let source = locate(p.to_str().unwrap(), 5).await.unwrap();
        assert_eq!(source.path(), p.as_path());
        assert!(!source.is_downloaded());
    }

    #[tokio::test]
    async fn blank_input_is_invalid() {
        let err = locate("  ", 5).await.unwrap_err();
        assert!(matches!(err, QuizGenError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn unreachable_url_is_a_download_failure() {
        let err = locate("http://127.0.0.1:9/base.docx", 5).await.unwrap_err();
        assert!(matches!(
            err,
            QuizGenError::DownloadFailed { .. } | QuizGenError::DownloadTimeout { .. }
        ));
    }
}
