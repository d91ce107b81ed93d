//! Minimal raster canvas for diagram generation.
//!
//! Pure `image`-crate pixel drawing: outlined rectangles, outlined circles
//! (midpoint algorithm) and anti-aliased text through `ab_glyph`. Text needs
//! a TrueType font from disk; when none can be found every text call is a
//! no-op and shapes are still drawn.

use crate::error::QuizGenError;
use ab_glyph::{point, Font, FontVec, PxScale, ScaleFont};
use image::{ImageFormat, Rgb, RgbImage};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// Environment variable naming a TTF file to use for diagram text.
pub const FONT_ENV: &str = "QUIZGEN_FONT";

const REGULAR_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

const BOLD_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

/// Regular and bold faces for diagram text. Either may be missing.
pub struct Fonts {
    regular: Option<FontVec>,
    bold: Option<FontVec>,
}

impl Fonts {
    /// Load fonts: explicit override, then `QUIZGEN_FONT`, then system paths.
    ///
    /// An explicit or environment font is used for both faces.
    pub fn load(override_path: Option<&Path>) -> Self {
        let explicit: Option<PathBuf> = override_path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(FONT_ENV).map(PathBuf::from));

        if let Some(path) = explicit {
            match load_font_file(&path) {
                Some(font) => {
                    return Self {
                        regular: Some(font),
                        bold: None,
                    }
                }
                None => warn!("Font '{}' could not be loaded; trying system fonts", path.display()),
            }
        }

        let regular = first_loadable(REGULAR_CANDIDATES);
        let bold = first_loadable(BOLD_CANDIDATES);
        if regular.is_none() && bold.is_none() {
            warn!("No TrueType font found; diagrams will be drawn without text (set {FONT_ENV})");
        }
        Self { regular, bold }
    }

    /// A font set with no faces; text is skipped.
    pub fn none() -> Self {
        Self {
            regular: None,
            bold: None,
        }
    }

    pub fn regular(&self) -> Option<&FontVec> {
        self.regular.as_ref().or(self.bold.as_ref())
    }

    pub fn bold(&self) -> Option<&FontVec> {
        self.bold.as_ref().or(self.regular.as_ref())
    }
}

fn first_loadable(candidates: &[&str]) -> Option<FontVec> {
    candidates
        .iter()
        .map(Path::new)
        .filter(|p| p.is_file())
        .find_map(load_font_file)
}

fn load_font_file(path: &Path) -> Option<FontVec> {
    let bytes = std::fs::read(path).ok()?;
    match FontVec::try_from_vec(bytes) {
        Ok(font) => {
            debug!("Loaded font {}", path.display());
            Some(font)
        }
        Err(e) => {
            warn!("Invalid font file {}: {}", path.display(), e);
            None
        }
    }
}

/// An RGB drawing surface with a white background.
pub struct Canvas {
    img: RgbImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            img: RgbImage::from_pixel(width, height, WHITE),
        }
    }

    pub fn width(&self) -> u32 {
        self.img.width()
    }

    pub fn height(&self) -> u32 {
        self.img.height()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgb<u8> {
        *self.img.get_pixel(x, y)
    }

    /// Set one pixel; coordinates outside the canvas are ignored.
    pub fn put(&mut self, x: i32, y: i32, color: Rgb<u8>) {
        if x >= 0 && y >= 0 && (x as u32) < self.img.width() && (y as u32) < self.img.height() {
            self.img.put_pixel(x as u32, y as u32, color);
        }
    }

    /// Mix `color` into the existing pixel by `coverage` in [0, 1].
    fn blend(&mut self, x: i32, y: i32, color: Rgb<u8>, coverage: f32) {
        if x < 0 || y < 0 || x as u32 >= self.img.width() || y as u32 >= self.img.height() {
            return;
        }
        let a = coverage.clamp(0.0, 1.0);
        let dst = self.img.get_pixel_mut(x as u32, y as u32);
        for c in 0..3 {
            let mixed = dst.0[c] as f32 * (1.0 - a) + color.0[c] as f32 * a;
            dst.0[c] = mixed.round() as u8;
        }
    }

    /// One-pixel outline of the box with inclusive corners `(x0, y0)`–`(x1, y1)`.
    pub fn rect_outline(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgb<u8>) {
        for x in x0..=x1 {
            self.put(x, y0, color);
            self.put(x, y1, color);
        }
        for y in y0..=y1 {
            self.put(x0, y, color);
            self.put(x1, y, color);
        }
    }

    /// One-pixel circle outline centred on `(cx, cy)`.
    pub fn circle_outline(&mut self, cx: i32, cy: i32, radius: i32, color: Rgb<u8>) {
        let mut x = radius;
        let mut y = 0;
        let mut err = 1 - radius;
        while x >= y {
            for (dx, dy) in [
                (x, y),
                (y, x),
                (-y, x),
                (-x, y),
                (-x, -y),
                (-y, -x),
                (y, -x),
                (x, -y),
            ] {
                self.put(cx + dx, cy + dy, color);
            }
            y += 1;
            if err < 0 {
                err += 2 * y + 1;
            } else {
                x -= 1;
                err += 2 * (y - x) + 1;
            }
        }
    }

    /// Draw `text` with its top-left corner at `(x, y)`. No font, no text.
    pub fn text(&mut self, font: Option<&FontVec>, px: f32, x: f32, y: f32, text: &str, color: Rgb<u8>) {
        let Some(font) = font else { return };
        let scale = PxScale::from(px);
        let scaled = font.as_scaled(scale);
        let baseline = y + scaled.ascent();
        let mut caret = x;
        let mut prev = None;

        for ch in text.chars() {
            let id = font.glyph_id(ch);
            if let Some(p) = prev {
                caret += scaled.kern(p, id);
            }
            let glyph = id.with_scale_and_position(scale, point(caret, baseline));
            caret += scaled.h_advance(id);
            prev = Some(id);

            if let Some(outlined) = font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|gx, gy, coverage| {
                    let px = bounds.min.x as i32 + gx as i32;
                    let py = bounds.min.y as i32 + gy as i32;
                    self.blend(px, py, color, coverage);
                });
            }
        }
    }

    /// Encode as PNG at `path`.
    pub fn save_png(&self, path: &Path) -> Result<(), QuizGenError> {
        self.img
            .save_with_format(path, ImageFormat::Png)
            .map_err(|e| QuizGenError::ImageWriteFailed {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })
    }

    pub fn into_image(self) -> RgbImage {
        self.img
    }
}

/// Advance width of `text` at `px`, or 0 without a font.
pub fn text_width(font: Option<&FontVec>, px: f32, text: &str) -> f32 {
    let Some(font) = font else { return 0.0 };
    let scaled = font.as_scaled(PxScale::from(px));
    let mut width = 0.0;
    let mut prev = None;
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(p) = prev {
            width += scaled.kern(p, id);
        }
        width += scaled.h_advance(id);
        prev = Some(id);
    }
    width
}

/// Line height of the face at `px`; falls back to `px` without a font.
pub fn line_height(font: Option<&FontVec>, px: f32) -> f32 {
    font.map(|f| f.as_scaled(PxScale::from(px)).height())
        .unwrap_or(px)
}
