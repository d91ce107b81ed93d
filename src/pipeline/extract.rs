//! Extractor: paragraph text and embedded media from a .docx package.
//!
//! A .docx is a ZIP archive. Paragraph text comes from `docx-rs`, which
//! parses `word/document.xml` into a typed tree:
//!
//! ```text
//! Document
//!  └── DocumentChild::Paragraph
//!        └── ParagraphChild::Run
//!              └── RunChild::Text / RunChild::Tab
//! ```
//!
//! Media is copied straight out of the archive with `zip`: every entry under
//! `word/media/` is written, flattened to its file name, into the media
//! directory. Media failures are never fatal; they are logged and the
//! document simply contributes fewer (or zero) images.

use crate::error::{MediaError, QuizGenError};
use crate::model::ParsedDocument;
use crate::pipeline::segment::split_questions;
use docx_rs::{DocumentChild, Docx, ParagraphChild, RunChild};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Prefix of the media store inside a .docx package.
const MEDIA_PREFIX: &str = "word/media/";

/// Read `path` into a [`ParsedDocument`], copying embedded images to `media_dir`.
///
/// `path` must already be a resolved local file (see
/// [`crate::pipeline::input::locate`]).
pub fn extract_document(path: &Path, media_dir: &Path) -> Result<ParsedDocument, QuizGenError> {
    let docx = read_package(path)?;
    let paragraphs = paragraph_texts(&docx);
    info!("Paragraphs found: {}", paragraphs.len());

    let raw_text = paragraphs.join("\n");
    let question_blocks = split_questions(&raw_text);
    info!("Detected {} question segments", question_blocks.len());
    for (i, block) in question_blocks.iter().enumerate() {
        debug!("Q{}: {}", i + 1, preview(block, 80));
    }

    let extracted_images = match extract_media(path, media_dir) {
        Ok(images) => images,
        Err(e) => {
            warn!("Could not extract images: {}", e);
            Vec::new()
        }
    };

    let source_path = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());

    Ok(ParsedDocument {
        source_path,
        raw_text,
        question_blocks,
        extracted_images,
    })
}

/// Parse the package's main document part.
fn read_package(path: &Path) -> Result<Docx, QuizGenError> {
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => QuizGenError::FileNotFound {
            path: path.to_path_buf(),
        },
        io::ErrorKind::PermissionDenied => QuizGenError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => QuizGenError::ArtifactRead {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    docx_rs::read_docx(&bytes).map_err(|e| QuizGenError::CorruptDocument {
        path: path.to_path_buf(),
        detail: format!("{e:?}"),
    })
}

/// Text of every body paragraph, in document order, empty ones included.
pub fn paragraph_texts(docx: &Docx) -> Vec<String> {
    docx.document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(para) => Some(paragraph_text(para)),
            _ => None,
        })
        .collect()
}

/// Concatenate the text runs of one paragraph.
fn paragraph_text(para: &docx_rs::Paragraph) -> String {
    let mut text = String::new();
    for child in &para.children {
        if let ParagraphChild::Run(run) = child {
            for rc in &run.children {
                match rc {
                    RunChild::Text(t) => text.push_str(&t.text),
                    RunChild::Tab(_) => text.push('\t'),
                    _ => {}
                }
            }
        }
    }
    text
}

/// Copy every `word/media/*` entry into `media_dir`, sorted by file name.
pub fn extract_media(path: &Path, media_dir: &Path) -> Result<Vec<PathBuf>, MediaError> {
    let file = File::open(path).map_err(|e| MediaError::ArchiveUnreadable {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| MediaError::ArchiveUnreadable {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    let mut names: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with(MEDIA_PREFIX) && !n.ends_with('/'))
        .map(str::to_string)
        .collect();
    names.sort();

    if names.is_empty() {
        debug!("No embedded media in {}", path.display());
        return Ok(Vec::new());
    }

    std::fs::create_dir_all(media_dir).map_err(|e| MediaError::OutputDir {
        path: media_dir.to_path_buf(),
        detail: e.to_string(),
    })?;

    let mut images = Vec::with_capacity(names.len());
    for name in names {
        match copy_entry(&mut archive, &name, media_dir) {
            Ok(dest) => {
                debug!("Extracted {} → {}", name, dest.display());
                images.push(dest);
            }
            Err(e) => warn!("{}", e),
        }
    }

    info!("Extracted {} embedded images", images.len());
    Ok(images)
}

fn copy_entry(
    archive: &mut zip::ZipArchive<File>,
    name: &str,
    media_dir: &Path,
) -> Result<PathBuf, MediaError> {
    let entry_err = |detail: String| MediaError::EntryFailed {
        name: name.to_string(),
        detail,
    };

    // Flatten: only the final component is kept, which also rules out
    // `..` segments escaping the media directory.
    let file_name = Path::new(name)
        .file_name()
        .ok_or_else(|| entry_err("entry has no file name".into()))?;
    let dest = media_dir.join(file_name);

    let mut entry = archive.by_name(name).map_err(|e| entry_err(e.to_string()))?;
    let mut out = File::create(&dest).map_err(|e| entry_err(e.to_string()))?;
    io::copy(&mut entry, &mut out).map_err(|e| entry_err(e.to_string()))?;
    Ok(dest)
}

fn preview(s: &str, max_chars: usize) -> String {
    s.chars()
        .take(max_chars)
        .collect::<String>()
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use docx_rs::{Paragraph, Run};
    use std::io::Write;

    fn write_docx(path: &Path, paragraphs: &[&str]) {
        let mut doc = Docx::new();
        for p in paragraphs {
            doc = doc.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*p)));
        }
        let file = File::create(path).unwrap();
        doc.build().pack(file).unwrap();
    }

    #[test]
    fn extracts_paragraphs_and_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("base.docx");
        write_docx(
            &input,
            &[
                "Practice set",
                "1. Each closet has shirts in 4 colors.",
                "How many uniforms?",
                "2. A ball has radius 3 cm.",
            ],
        );

        let parsed = extract_document(&input, &dir.path().join("media")).unwrap();
        assert_eq!(
            parsed.raw_text,
            "Practice set\n1. Each closet has shirts in 4 colors.\nHow many uniforms?\n2. A ball has radius 3 cm."
        );
        assert_eq!(parsed.question_blocks.len(), 3);
        assert_eq!(
            parsed.question_blocks[1],
            "1. Each closet has shirts in 4 colors.\nHow many uniforms?"
        );
        assert!(parsed.extracted_images.is_empty());
        assert!(parsed.source_path.is_absolute());
    }

    #[test]
    fn empty_document_has_no_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("empty.docx");
        write_docx(&input, &[]);

        let parsed = extract_document(&input, &dir.path().join("media")).unwrap();
        assert!(parsed.question_blocks.is_empty());
        assert!(parsed.raw_text.trim().is_empty());
    }

    #[test]
    fn media_entries_are_flattened_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("with_media.docx");
        {
            let file = File::create(&input).unwrap();
            let mut zip = zip::ZipWriter::new(file);
            let opts = zip::write::SimpleFileOptions::default();
            zip.start_file("word/media/image2.png", opts).unwrap();
            zip.write_all(b"two").unwrap();
            zip.start_file("word/media/image1.png", opts).unwrap();
            zip.write_all(b"one").unwrap();
            zip.start_file("word/document.xml", opts).unwrap();
            zip.write_all(b"<w:document/>").unwrap();
            zip.finish().unwrap();
        }

        let media = dir.path().join("media");
        let images = extract_media(&input, &media).unwrap();
        assert_eq!(images, vec![media.join("image1.png"), media.join("image2.png")]);
        assert_eq!(std::fs::read(media.join("image1.png")).unwrap(), b"one");
    }

    #[test]
    fn unreadable_archive_is_soft_failure() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.docx");
        std::fs::write(&input, b"PK\x03\x04garbage").unwrap();
        let err = extract_media(&input, &dir.path().join("media")).unwrap_err();
        assert!(matches!(err, MediaError::ArchiveUnreadable { .. }));
    }

    #[test]
    fn corrupt_package_is_fatal_for_text() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.docx");
        std::fs::write(&input, b"PK\x03\x04garbage").unwrap();
        let err = extract_document(&input, &dir.path().join("media")).unwrap_err();
        assert!(matches!(err, QuizGenError::CorruptDocument { .. }));
    }
}
