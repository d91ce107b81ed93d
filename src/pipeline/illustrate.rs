//! Illustrator: one raster diagram per question record.
//!
//! The generator is picked from the record's question text with the same
//! priority-table dispatch the templater uses:
//!
//! ```text
//! "shirt" | "pants" | "uniform"   → Table   (colour-name grid)
//! "ball" | "radius" | "packed"    → Balls   (2 × 3 circle packing)
//! anything else                   → Banner  (wrapped, centred title)
//! ```
//!
//! Every written file is recorded in an [`ImageManifest`] (`images.json`
//! in the output directory) keyed by the record's `order`, so the
//! Assembler does not have to recover the association from filenames.

use crate::artifact::{ensure_dir, save_json, IMAGE_MANIFEST};
use crate::config::PipelineConfig;
use crate::error::QuizGenError;
use crate::model::{DiagramKind, ImageArtifact, ImageManifest, QuestionRecord, QuestionSet};
use crate::pipeline::canvas::{line_height, text_width, Canvas, Fonts, BLACK};
use crate::pipeline::classify::{first_match, KeywordRule, PANTS_COLORS, SHIRT_COLORS};
use crate::progress::Stage;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Longest sanitised title kept in a filename.
const MAX_STEM_CHARS: usize = 40;

/// Banner lines stay strictly below this many characters.
const BANNER_WRAP: usize = 30;

const TABLE_CELL_W: i32 = 140;
const TABLE_CELL_H: i32 = 60;
const BALL_ROWS: u32 = 2;
const BALL_COLS: u32 = 3;
const BALL_RADIUS: u32 = 20;
const BANNER_W: u32 = 800;
const BANNER_H: u32 = 200;

/// First match wins.
pub const DIAGRAM_RULES: &[KeywordRule<DiagramKind>] = &[
    KeywordRule {
        keywords: &["shirt", "pants", "uniform"],
        kind: DiagramKind::Table,
    },
    KeywordRule {
        keywords: &["ball", "radius", "packed"],
        kind: DiagramKind::Balls,
    },
];

pub fn select_diagram(question_text: &str) -> DiagramKind {
    first_match(DIAGRAM_RULES, question_text, DiagramKind::Banner)
}

/// Draw one diagram per record into `out_dir` and write the manifest.
pub fn illustrate(
    questions: &QuestionSet,
    out_dir: &Path,
    config: &PipelineConfig,
) -> Result<ImageManifest, QuizGenError> {
    ensure_dir(out_dir)?;
    let fonts = Fonts::load(config.font_path.as_deref());
    let total = questions.len();

    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_start(Stage::Illustrate, total);
    }

    let mut manifest = ImageManifest::default();
    for record in &questions.questions {
        if let Some(ref cb) = config.progress_callback {
            cb.on_item_start(Stage::Illustrate, record.order, total);
        }
        match draw_record(record, out_dir, &fonts) {
            Ok(artifact) => {
                debug!("Question {} → {}", record.order, artifact.path.display());
                if let Some(ref cb) = config.progress_callback {
                    cb.on_item_complete(Stage::Illustrate, record.order, total);
                }
                manifest.images.push(artifact);
            }
            Err(e) => {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_item_error(Stage::Illustrate, record.order, total, &e.to_string());
                }
                return Err(e);
            }
        }
    }

    save_json(&manifest, &out_dir.join(IMAGE_MANIFEST))?;
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_complete(Stage::Illustrate, total);
    }
    info!("Generated {} images in {}", manifest.images.len(), out_dir.display());
    Ok(manifest)
}

fn draw_record(
    record: &QuestionRecord,
    out_dir: &Path,
    fonts: &Fonts,
) -> Result<ImageArtifact, QuizGenError> {
    let kind = select_diagram(&record.question);
    let canvas = match kind {
        DiagramKind::Table => uniform_table(&SHIRT_COLORS, &PANTS_COLORS, fonts),
        DiagramKind::Balls => packed_balls(BALL_ROWS, BALL_COLS, BALL_RADIUS, None, fonts),
        DiagramKind::Banner => {
            let text = if record.title.is_empty() {
                "Question"
            } else {
                record.title.as_str()
            };
            text_banner(text, BANNER_W, BANNER_H, fonts)
        }
    };

    let path = image_path(out_dir, &record.title, kind);
    canvas.save_png(&path)?;
    Ok(ImageArtifact {
        order: record.order,
        title: record.title.clone(),
        kind,
        path,
    })
}

/// `<out_dir>/<sanitised title><suffix>.png`.
pub fn image_path(out_dir: &Path, title: &str, kind: DiagramKind) -> PathBuf {
    out_dir.join(format!("{}{}.png", sanitize_title(title), kind.suffix()))
}

/// Replace every non-alphanumeric char with `_` and keep at most 40 chars.
///
/// An empty title becomes `q`.
pub fn sanitize_title(title: &str) -> String {
    if title.is_empty() {
        return "q".to_string();
    }
    title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .take(MAX_STEM_CHARS)
        .collect()
}

/// Two-column table: header row, then one row per entry of the longer list.
pub fn uniform_table(shirts: &[&str], pants: &[&str], fonts: &Fonts) -> Canvas {
    let rows = shirts.len().max(pants.len()) as i32;
    let width = TABLE_CELL_W * 2 + 40;
    let height = (rows + 1) * TABLE_CELL_H + 40;
    let mut canvas = Canvas::new(width as u32, height as u32);
    let font = fonts.regular();

    let (x0, y0) = (20, 20);
    let cell_row = |canvas: &mut Canvas, y: i32, left: &str, right: &str| {
        canvas.rect_outline(x0, y, x0 + TABLE_CELL_W - 1, y + TABLE_CELL_H - 1, BLACK);
        canvas.rect_outline(
            x0 + TABLE_CELL_W,
            y,
            x0 + TABLE_CELL_W * 2 - 1,
            y + TABLE_CELL_H - 1,
            BLACK,
        );
        canvas.text(font, 16.0, (x0 + 10) as f32, (y + 15) as f32, left, BLACK);
        canvas.text(font, 16.0, (x0 + TABLE_CELL_W + 10) as f32, (y + 15) as f32, right, BLACK);
    };

    cell_row(&mut canvas, y0, "Shirt Color", "Pants Color");
    for i in 0..rows as usize {
        let y = y0 + (i as i32 + 1) * TABLE_CELL_H;
        let s = shirts.get(i).copied().unwrap_or("");
        let p = pants.get(i).copied().unwrap_or("");
        cell_row(&mut canvas, y, s, p);
    }
    canvas
}

/// `rows × cols` circles on a square lattice, captioned with the radius.
///
/// `spacing` defaults to `2 * radius + 4`; circles only stay disjoint while
/// `spacing >= 2 * radius`.
pub fn packed_balls(rows: u32, cols: u32, radius: u32, spacing: Option<u32>, fonts: &Fonts) -> Canvas {
    let spacing = spacing.unwrap_or(radius * 2 + 4);
    let width = cols * spacing + 40;
    let height = rows * spacing + 40;
    let mut canvas = Canvas::new(width, height);

    let (x0, y0) = (20i32, 20i32);
    let step = spacing as i32;
    for r in 0..rows as i32 {
        for c in 0..cols as i32 {
            let cx = x0 + c * step + step / 2;
            let cy = y0 + r * step + step / 2;
            canvas.circle_outline(cx, cy, radius as i32, BLACK);
        }
    }

    let caption = format!("Each circle radius={radius} units");
    canvas.text(fonts.regular(), 14.0, 10.0, height as f32 - 20.0, &caption, BLACK);
    canvas
}

/// Title text wrapped and centred on a wide banner.
pub fn text_banner(text: &str, width: u32, height: u32, fonts: &Fonts) -> Canvas {
    let mut canvas = Canvas::new(width, height);
    let font = fonts.bold();
    let px = 20.0;
    let lines = wrap_words(text, BANNER_WRAP);

    let mut y = height as f32 / 2.0 - lines.len() as f32 * 15.0;
    let h = line_height(font, px);
    for line in &lines {
        let w = text_width(font, px, line);
        canvas.text(font, px, (width as f32 - w) / 2.0, y, line, BLACK);
        y += h + 5.0;
    }
    canvas
}

/// Greedy word wrap: a word joins the current line only while the line,
/// a space and the word stay under `limit` characters.
pub fn wrap_words(text: &str, limit: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if line.is_empty() {
            line.push_str(word);
        } else if line.chars().count() + 1 + word.chars().count() < limit {
            line.push(' ');
            line.push_str(word);
        } else {
            lines.push(std::mem::replace(&mut line, word.to_string()));
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Difficulty;
    use crate::pipeline::canvas::WHITE;

    fn record(order: u32, title: &str, question: &str) -> QuestionRecord {
        QuestionRecord {
            title: title.into(),
            question: question.into(),
            order,
            difficulty: Difficulty::Easy,
            ..Default::default()
        }
    }

    #[test]
    fn diagram_priority() {
        assert_eq!(select_diagram("How many UNIFORMS?"), DiagramKind::Table);
        assert_eq!(select_diagram("pants and a ball"), DiagramKind::Table);
        assert_eq!(select_diagram("tightly Packed tins"), DiagramKind::Balls);
        assert_eq!(select_diagram("radius of a ball"), DiagramKind::Balls);
        assert_eq!(select_diagram("What is 7 + 5?"), DiagramKind::Banner);
    }

    #[test]
    fn sanitize_replaces_and_truncates() {
        assert_eq!(sanitize_title("Uniform Color Combinations"), "Uniform_Color_Combinations");
        assert_eq!(sanitize_title("A/B: c?"), "A_B__c_");
        assert_eq!(sanitize_title(&"x".repeat(60)).len(), 40);
        assert_eq!(sanitize_title(""), "q");
    }

    #[test]
    fn image_path_uses_suffix() {
        let p = image_path(Path::new("out"), "Packed Spheres", DiagramKind::Balls);
        assert_eq!(p, Path::new("out").join("Packed_Spheres_balls.png"));
    }

    #[test]
    fn wrap_keeps_lines_below_limit() {
        let text = "Packed Spheres in a Rectangular Box with a Very Long Title";
        let lines = wrap_words(text, 30);
        assert!(lines.len() > 1);
        for l in &lines {
            assert!(l.chars().count() < 30, "{l:?}");
        }
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn wrap_long_word_gets_own_line() {
        let long = "y".repeat(40);
        let lines = wrap_words(&format!("ab {long} cd"), 30);
        assert_eq!(lines, vec!["ab".to_string(), long, "cd".to_string()]);
        assert!(wrap_words("   ", 30).is_empty());
    }

    #[test]
    fn diagram_sizes() {
        let fonts = Fonts::none();
        let t = uniform_table(&SHIRT_COLORS, &PANTS_COLORS, &fonts);
        assert_eq!((t.width(), t.height()), (320, 340));
        let b = packed_balls(2, 3, 20, None, &fonts);
        assert_eq!((b.width(), b.height()), (172, 128));
        let banner = text_banner("Hello", 800, 200, &fonts);
        assert_eq!((banner.width(), banner.height()), (800, 200));
    }

    #[test]
    fn balls_are_drawn_without_font() {
        let b = packed_balls(2, 3, 20, None, &Fonts::none());
        // First circle centre (42, 42), rightmost point at x = 62.
        assert_eq!(b.pixel(62, 42), BLACK);
        assert_eq!(b.pixel(42, 42), WHITE);
    }

    #[test]
    fn one_image_per_record_with_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let set = QuestionSet {
            questions: vec![
                record(1, "Uniform Color Combinations", "one shirt and one pair of pants"),
                record(2, "Packed Spheres", "6 tightly packed balls of radius 3"),
                record(3, "Autogen Question 3", "What is 2+2?"),
            ],
        };
        let config = PipelineConfig::default();
        let manifest = illustrate(&set, dir.path(), &config).unwrap();

        assert_eq!(manifest.images.len(), 3);
        let names: Vec<String> = manifest
            .images
            .iter()
            .map(|a| a.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "Uniform_Color_Combinations_table.png",
                "Packed_Spheres_balls.png",
                "Autogen_Question_3_banner.png"
            ]
        );
        for a in &manifest.images {
            assert!(a.path.is_file());
        }
        assert_eq!(manifest.find(2).unwrap().kind, DiagramKind::Balls);

        let reloaded: ImageManifest =
            crate::artifact::load_json(&dir.path().join(IMAGE_MANIFEST)).unwrap();
        assert_eq!(reloaded, manifest);
    }

    #[test]
    fn empty_set_writes_empty_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let manifest =
            illustrate(&QuestionSet::default(), dir.path(), &PipelineConfig::default()).unwrap();
        assert!(manifest.images.is_empty());
        assert!(dir.path().join(IMAGE_MANIFEST).is_file());
    }
}
