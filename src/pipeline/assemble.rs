//! Assembler: serialise records into the tagged-line output document.
//!
//! Per record, in ascending `order`:
//!
//! ```text
//! @title … @plusmarks      one paragraph per line (render_block_lines)
//! Figure: + picture        only when an image is associated
//! page break
//! ```
//!
//! Image association prefers the Illustrator manifest (`images.json`,
//! keyed by `order`). Without a manifest entry it falls back to filename
//! matching: first the title (spaces → `_`, first 20 chars,
//! case-insensitive), then the decimal `order`, first match wins.

use crate::artifact::{ensure_parent, load_json, write_atomic, IMAGE_MANIFEST};
use crate::config::PipelineConfig;
use crate::error::QuizGenError;
use crate::model::{ImageManifest, QuestionRecord, QuestionSet};
use crate::progress::Stage;
use docx_rs::{BreakType, Docx, Paragraph, Pic, Run, Style, StyleType};
use image::ImageFormat;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Literal comment line that opens each MCQ block.
pub const MCQ_COMMENT: &str =
    "// Use this block for each question when adding Multiple Choice Questions (MCQ)";

const EMU_PER_INCH: f32 = 914_400.0;
const TITLE_MATCH_CHARS: usize = 20;
const HEADING_STYLE: &str = "Heading1";

/// Outcome of one assembly run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssemblyStats {
    pub records: usize,
    pub images_embedded: usize,
    pub images_failed: usize,
}

/// Tagged lines for one record, without figure or page break.
///
/// The last option is emitted a second time after the `@@option` line.
/// This looks like a defect in the format but is kept so output stays
/// line-for-line identical to existing documents.
pub fn render_block_lines(q: &QuestionRecord) -> Vec<String> {
    let mut lines = vec![
        format!("@title {}", q.title),
        format!("@description {}", q.description),
        String::new(),
        MCQ_COMMENT.to_string(),
        format!("@question {}", q.question),
        format!("@instruction {}", q.instruction),
        format!("@difficulty {}", q.difficulty),
        format!("@Order {}", q.order),
    ];
    lines.extend(q.options.iter().map(|o| format!("@option {o}")));
    lines.push(format!("@@option {}", q.correct_answer));
    lines.push(format!(
        "@option {}",
        q.options.last().map(String::as_str).unwrap_or("")
    ));
    lines.push("@explanation".to_string());
    lines.push(q.explanation.clone());
    lines.push(format!("@subject {}", q.subject));
    lines.push(format!("@unit {}", q.unit));
    lines.push(format!("@topic {}", q.topic));
    lines.push(format!("@plusmarks {}", q.plusmarks));
    lines
}

/// Files available for association, loaded once per run.
#[derive(Debug, Default)]
pub struct ImageIndex {
    dir: PathBuf,
    manifest: Option<ImageManifest>,
    /// `(file name, path)`, sorted by name.
    files: Vec<(String, PathBuf)>,
}

impl ImageIndex {
    /// Scan `dir`. A missing directory yields an empty index.
    pub fn load(dir: &Path) -> Self {
        let manifest_path = dir.join(IMAGE_MANIFEST);
        let manifest = if manifest_path.is_file() {
            match load_json::<ImageManifest>(&manifest_path) {
                Ok(m) => Some(m),
                Err(e) => {
                    warn!("Ignoring unreadable image manifest: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let mut files: Vec<(String, PathBuf)> = match std::fs::read_dir(dir) {
            Ok(entries) => entries
                .filter_map(Result::ok)
                .filter(|e| e.path().is_file())
                .map(|e| (e.file_name().to_string_lossy().into_owned(), e.path()))
                .filter(|(name, _)| name != IMAGE_MANIFEST)
                .collect(),
            Err(e) => {
                warn!("Cannot read image directory {}: {}", dir.display(), e);
                Vec::new()
            }
        };
        files.sort();

        Self {
            dir: dir.to_path_buf(),
            manifest,
            files,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Image for `record`, if any.
    pub fn lookup(&self, record: &QuestionRecord) -> Option<PathBuf> {
        if let Some(path) = self.from_manifest(record.order) {
            return Some(path);
        }

        let key: String = record
            .title
            .replace(' ', "_")
            .chars()
            .take(TITLE_MATCH_CHARS)
            .collect::<String>()
            .to_lowercase();
        if let Some((_, path)) = self
            .files
            .iter()
            .find(|(name, _)| name.to_lowercase().contains(&key))
        {
            return Some(path.clone());
        }

        let order = record.order.to_string();
        self.files
            .iter()
            .find(|(name, _)| name.contains(&order))
            .map(|(_, path)| path.clone())
    }

    /// Manifest path for `order`, re-rooted under the scanned directory when
    /// the recorded path no longer resolves.
    fn from_manifest(&self, order: u32) -> Option<PathBuf> {
        let artifact = self.manifest.as_ref()?.find(order)?;
        if artifact.path.is_file() {
            return Some(artifact.path.clone());
        }
        let rerooted = self.dir.join(artifact.path.file_name()?);
        rerooted.is_file().then_some(rerooted)
    }
}

/// Write the output document for `questions` to `out`.
///
/// `images_dir` of `None` means no record gets a figure. An existing file at
/// `out` is replaced.
pub fn assemble(
    questions: &QuestionSet,
    images_dir: Option<&Path>,
    out: &Path,
    config: &PipelineConfig,
) -> Result<AssemblyStats, QuizGenError> {
    let index = images_dir.map(ImageIndex::load);
    let records = questions.in_order();
    let total = records.len();
    let mut stats = AssemblyStats {
        records: total,
        ..Default::default()
    };

    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_start(Stage::Assemble, total);
    }

    let mut docx = Docx::new()
        .add_style(
            Style::new(HEADING_STYLE, StyleType::Paragraph)
                .name("Heading 1")
                .size(32)
                .bold(),
        )
        .add_paragraph(
            Paragraph::new()
                .add_run(Run::new().add_text(&config.document_heading))
                .style(HEADING_STYLE),
        );

    for record in records {
        if let Some(ref cb) = config.progress_callback {
            cb.on_item_start(Stage::Assemble, record.order, total);
        }

        for line in render_block_lines(record) {
            docx = docx.add_paragraph(text_paragraph(&line));
        }

        if let Some(path) = index.as_ref().and_then(|ix| ix.lookup(record)) {
            docx = docx.add_paragraph(text_paragraph("Figure:"));
            match load_picture(&path, config.figure_width_inches) {
                Ok(pic) => {
                    debug!("Question {}: embedded {}", record.order, path.display());
                    docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_image(pic)));
                    stats.images_embedded += 1;
                }
                Err(e) => {
                    warn!("Question {}: {}", record.order, e);
                    if let Some(ref cb) = config.progress_callback {
                        cb.on_item_error(Stage::Assemble, record.order, total, &e);
                    }
                    docx = docx.add_paragraph(text_paragraph(&format!(
                        "[Image could not be inserted: {}]",
                        path.display()
                    )));
                    stats.images_failed += 1;
                }
            }
        }

        docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_break(BreakType::Page)));

        if let Some(ref cb) = config.progress_callback {
            cb.on_item_complete(Stage::Assemble, record.order, total);
        }
    }

    let mut buf = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buf)
        .map_err(|e| QuizGenError::DocumentWriteFailed {
            path: out.to_path_buf(),
            detail: e.to_string(),
        })?;
    ensure_parent(out)?;
    write_atomic(out, buf.get_ref())?;

    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_complete(Stage::Assemble, total);
    }
    info!(
        "Saved final doc to {} ({} questions, {} images)",
        out.display(),
        stats.records,
        stats.images_embedded
    );
    Ok(stats)
}

fn text_paragraph(text: &str) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(text))
}

/// Decode the file, re-encode as PNG and size it to `width_inches`,
/// keeping the aspect ratio.
fn load_picture(path: &Path, width_inches: f32) -> Result<Pic, String> {
    let img = image::open(path).map_err(|e| format!("cannot decode {}: {e}", path.display()))?;
    let (w, h) = (img.width(), img.height());
    if w == 0 || h == 0 {
        return Err(format!("{} has zero size", path.display()));
    }

    let mut png = Cursor::new(Vec::new());
    img.write_to(&mut png, ImageFormat::Png)
        .map_err(|e| format!("cannot re-encode {}: {e}", path.display()))?;

    let width_emu = (width_inches * EMU_PER_INCH).round() as u32;
    let height_emu = (u64::from(width_emu) * u64::from(h) / u64::from(w)) as u32;
    Ok(Pic::new_with_dimensions(png.into_inner(), w, h).size(width_emu, height_emu))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DiagramKind, Difficulty, ImageArtifact};
    use crate::pipeline::extract::{extract_media, paragraph_texts};

    fn record(order: u32, title: &str, options: &[&str], correct: &str) -> QuestionRecord {
        QuestionRecord {
            title: title.into(),
            description: "desc".into(),
            question: "How many?".into(),
            instruction: "Select the best answer.".into(),
            difficulty: Difficulty::Easy,
            order,
            options: options.iter().map(|s| s.to_string()).collect(),
            correct_answer: correct.into(),
            explanation: "Because.".into(),
            subject: "Quantitative Math".into(),
            unit: "u".into(),
            topic: "t".into(),
            plusmarks: 1,
        }
    }

    fn read_back(path: &Path) -> Vec<String> {
        let bytes = std::fs::read(path).unwrap();
        paragraph_texts(&docx_rs::read_docx(&bytes).unwrap())
    }

    fn write_png(path: &Path, w: u32, h: u32) {
        image::RgbImage::from_pixel(w, h, image::Rgb([0, 0, 0]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn block_lines_in_fixed_order() {
        let q = record(3, "Uniform", &["12", "11", "13", "24"], "12");
        let lines = render_block_lines(&q);
        assert_eq!(
            lines,
            vec![
                "@title Uniform",
                "@description desc",
                "",
                MCQ_COMMENT,
                "@question How many?",
                "@instruction Select the best answer.",
                "@difficulty easy",
                "@Order 3",
                "@option 12",
                "@option 11",
                "@option 13",
                "@option 24",
                "@@option 12",
                "@option 24",
                "@explanation",
                "Because.",
                "@subject Quantitative Math",
                "@unit u",
                "@topic t",
                "@plusmarks 1",
            ]
        );
    }

    #[test]
    fn last_option_is_repeated_after_correct_answer() {
        // Known quirk of the output format: one extra trailing @option line.
        let q = record(1, "T", &["A", "B", "C", "D"], "A");
        let lines = render_block_lines(&q);
        let option_lines = lines.iter().filter(|l| l.starts_with("@option ")).count();
        assert_eq!(option_lines, q.options.len() + 1);
        assert_eq!(lines.iter().filter(|l| l.starts_with("@@option ")).count(), 1);
        let correct_at = lines.iter().position(|l| l == "@@option A").unwrap();
        assert_eq!(lines[correct_at + 1], "@option D");
    }

    #[test]
    fn no_options_gives_empty_trailing_option() {
        let q = record(1, "T", &[], "");
        let lines = render_block_lines(&q);
        assert!(lines.contains(&"@@option ".to_string()));
        assert!(lines.contains(&"@option ".to_string()));
    }

    #[test]
    fn lookup_by_title_then_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Uniform_Color_Combinations_table.png"), b"x").unwrap();
        std::fs::write(dir.path().join("figure_7.png"), b"x").unwrap();
        let index = ImageIndex::load(dir.path());

        let by_title = index.lookup(&record(1, "Uniform Color Combinations", &[], ""));
        assert_eq!(
            by_title.unwrap().file_name().unwrap(),
            "Uniform_Color_Combinations_table.png"
        );
        let by_order = index.lookup(&record(7, "Something Else", &[], ""));
        assert_eq!(by_order.unwrap().file_name().unwrap(), "figure_7.png");
        assert!(index.lookup(&record(9, "Nothing", &[], "")).is_none());
    }

    #[test]
    fn manifest_wins_over_filenames() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Packed_table.png"), b"x").unwrap();
        std::fs::write(dir.path().join("other.png"), b"x").unwrap();
        let manifest = ImageManifest {
            images: vec![ImageArtifact {
                order: 1,
                title: "Packed".into(),
                kind: DiagramKind::Balls,
                path: PathBuf::from("/moved/elsewhere/other.png"),
            }],
        };
        crate::artifact::save_json(&manifest, &dir.path().join(IMAGE_MANIFEST)).unwrap();

        let index = ImageIndex::load(dir.path());
        let found = index.lookup(&record(1, "Packed", &[], "")).unwrap();
        assert_eq!(found, dir.path().join("other.png"));
    }

    #[test]
    fn missing_image_dir_is_empty_index() {
        let index = ImageIndex::load(Path::new("/definitely/not/here"));
        assert!(index.is_empty());
    }

    #[test]
    fn assembles_heading_blocks_and_figure() {
        let dir = tempfile::tempdir().unwrap();
        let images = dir.path().join("images");
        std::fs::create_dir_all(&images).unwrap();
        write_png(&images.join("Uniform_table.png"), 40, 20);

        let set = QuestionSet {
            questions: vec![
                record(2, "Second", &["A", "B"], "B"),
                record(1, "Uniform", &["12", "11", "13", "24"], "12"),
            ],
        };
        let out = dir.path().join("out").join("result.docx");
        let stats = assemble(&set, Some(&images), &out, &PipelineConfig::default()).unwrap();
        assert_eq!(
            stats,
            AssemblyStats {
                records: 2,
                images_embedded: 1,
                images_failed: 0
            }
        );

        let text = read_back(&out);
        assert_eq!(text[0], "Auto-generated Questions");
        let first = text.iter().position(|l| l == "@title Uniform").unwrap();
        let second = text.iter().position(|l| l == "@title Second").unwrap();
        assert!(first < second, "records must be in ascending order");
        assert!(text.iter().any(|l| l == "@@option 12"));
        assert!(text.iter().any(|l| l == "Figure:"));

        let media = extract_media(&out, &dir.path().join("media")).unwrap();
        assert_eq!(media.len(), 1);
    }

    /// Paragraph texts, with page-break paragraphs read back as `<page>`.
    fn read_back_with_breaks(path: &Path) -> Vec<String> {
        use docx_rs::{Break, DocumentChild, ParagraphChild, RunChild};
        let bytes = std::fs::read(path).unwrap();
        let docx = docx_rs::read_docx(&bytes).unwrap();
        let page = Break::new(BreakType::Page);
        docx.document
            .children
            .iter()
            .filter_map(|c| match c {
                DocumentChild::Paragraph(p) => Some(p),
                _ => None,
            })
            .map(|p| {
                let is_break = p.children.iter().any(|pc| match pc {
                    ParagraphChild::Run(r) => r
                        .children
                        .iter()
                        .any(|rc| matches!(rc, RunChild::Break(b) if *b == page)),
                    _ => false,
                });
                if is_break {
                    "<page>".to_string()
                } else {
                    paragraph_texts_of(p)
                }
            })
            .collect()
    }

    fn paragraph_texts_of(p: &docx_rs::Paragraph) -> String {
        p.children
            .iter()
            .filter_map(|pc| match pc {
                docx_rs::ParagraphChild::Run(r) => Some(r),
                _ => None,
            })
            .flat_map(|r| r.children.iter())
            .filter_map(|rc| match rc {
                docx_rs::RunChild::Text(t) => Some(t.text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn every_record_ends_with_page_break() {
        let dir = tempfile::tempdir().unwrap();
        let images = dir.path().join("images");
        std::fs::create_dir_all(&images).unwrap();
        write_png(&images.join("Pictured_banner.png"), 30, 10);

        let set = QuestionSet {
            questions: vec![
                record(1, "Pictured", &["A", "B"], "A"),
                record(2, "Plain", &["C", "D"], "D"),
            ],
        };
        let out = dir.path().join("result.docx");
        assemble(&set, Some(&images), &out, &PipelineConfig::default()).unwrap();

        let paras = read_back_with_breaks(&out);
        let breaks: Vec<usize> = paras
            .iter()
            .enumerate()
            .filter(|(_, t)| *t == "<page>")
            .map(|(i, _)| i)
            .collect();
        assert_eq!(breaks.len(), 2);
        assert_eq!(breaks[1], paras.len() - 1);

        // Record 1: Figure:, picture paragraph, break.
        assert_eq!(paras[breaks[0] - 2], "Figure:");
        assert_eq!(paras[breaks[0] - 1], "");
        // Record 2: no figure, break right after the last tag line.
        assert_eq!(paras[breaks[1] - 1], "@plusmarks 1");
        assert_eq!(paras[breaks[0] + 1], "@title Plain");
    }

    #[test]
    fn undecodable_image_becomes_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let images = dir.path().join("images");
        std::fs::create_dir_all(&images).unwrap();
        let bad = images.join("Broken_banner.png");
        std::fs::write(&bad, b"not a png").unwrap();

        let set = QuestionSet {
            questions: vec![record(1, "Broken", &["A"], "A")],
        };
        let out = dir.path().join("result.docx");
        let stats = assemble(&set, Some(&images), &out, &PipelineConfig::default()).unwrap();
        assert_eq!(stats.images_failed, 1);

        let text = read_back(&out);
        let expected = format!("[Image could not be inserted: {}]", bad.display());
        assert!(text.contains(&expected));
    }

    #[test]
    fn empty_set_has_only_heading() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("result.docx");
        let config = PipelineConfig::builder()
            .document_heading("Practice Set")
            .build()
            .unwrap();
        assemble(&QuestionSet::default(), None, &out, &config).unwrap();
        let text: Vec<String> = read_back(&out).into_iter().filter(|l| !l.is_empty()).collect();
        assert_eq!(text, vec!["Practice Set"]);
    }
}
