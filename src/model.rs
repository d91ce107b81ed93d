//! Records exchanged between pipeline stages.
//!
//! Every type here is serialised to disk between stages, so field names are
//! part of the artifact format (`parsed.json`, `questions.json`,
//! `images.json`). Decoding is deliberately forgiving: a record produced by
//! a language model may omit fields or spell numbers as strings, and a
//! missing field becomes its empty/placeholder default rather than an error.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;

/// Output of the Extractor, persisted as `parsed.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedDocument {
    /// Absolute path of the source document.
    #[serde(rename = "source_file")]
    pub source_path: PathBuf,
    /// All paragraph text, joined by `\n`, in document order.
    pub raw_text: String,
    /// One trimmed chunk of `raw_text` per original question.
    #[serde(rename = "questions")]
    pub question_blocks: Vec<String>,
    /// Files copied out of the document's media store.
    pub extracted_images: Vec<PathBuf>,
}

/// How hard a question is. Any label other than the exact lowercase
/// `easy`, `moderate` or `hard` is kept verbatim, including other casings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Difficulty {
    Easy,
    #[default]
    Moderate,
    Hard,
    Other(String),
}

impl Difficulty {
    pub fn as_str(&self) -> &str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Moderate => "moderate",
            Difficulty::Hard => "hard",
            Difficulty::Other(s) => s,
        }
    }
}

impl From<String> for Difficulty {
    fn from(s: String) -> Self {
        match s.as_str() {
            "easy" => Difficulty::Easy,
            "moderate" => Difficulty::Moderate,
            "hard" => Difficulty::Hard,
            _ => Difficulty::Other(s),
        }
    }
}

impl From<Difficulty> for String {
    fn from(d: Difficulty) -> Self {
        d.as_str().to_string()
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structured multiple-choice question.
///
/// `correct_answer` is an arbitrary string expected to equal one entry of
/// `options`; it is a bare number for some templates and a full dimension
/// expression for others, so it is never parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestionRecord {
    pub title: String,
    pub description: String,
    /// Question text; may embed `$...$` math markup.
    pub question: String,
    pub instruction: String,
    pub difficulty: Difficulty,
    /// 1-based position of the source block.
    #[serde(deserialize_with = "number_or_string")]
    pub order: u32,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: String,
    pub subject: String,
    pub unit: String,
    pub topic: String,
    #[serde(deserialize_with = "number_or_string")]
    pub plusmarks: u32,
}

impl Default for QuestionRecord {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            question: String::new(),
            instruction: String::new(),
            difficulty: Difficulty::default(),
            order: 0,
            options: Vec::new(),
            correct_answer: String::new(),
            explanation: String::new(),
            subject: String::new(),
            unit: String::new(),
            topic: String::new(),
            plusmarks: 1,
        }
    }
}

impl QuestionRecord {
    /// Build a record from any JSON object, coercing instead of rejecting.
    ///
    /// Numbers and booleans become strings in text fields and options;
    /// `null`, missing or unusable values fall back to [`Default`].
    pub fn from_json_object(obj: &Map<String, Value>) -> Self {
        let text = |key: &str| obj.get(key).and_then(scalar_text).unwrap_or_default();
        let defaults = Self::default();

        let options = match obj.get("options") {
            Some(Value::Array(items)) => items.iter().filter_map(scalar_text).collect(),
            Some(other) => scalar_text(other).into_iter().collect(),
            None => Vec::new(),
        };

        Self {
            title: text("title"),
            description: text("description"),
            question: text("question"),
            instruction: text("instruction"),
            difficulty: obj
                .get("difficulty")
                .and_then(scalar_text)
                .map(Difficulty::from)
                .unwrap_or_default(),
            order: obj.get("order").and_then(whole_number).unwrap_or(defaults.order),
            options,
            correct_answer: text("correct_answer"),
            explanation: text("explanation"),
            subject: text("subject"),
            unit: text("unit"),
            topic: text("topic"),
            plusmarks: obj
                .get("plusmarks")
                .and_then(whole_number)
                .unwrap_or(defaults.plusmarks),
        }
    }

    /// True when `correct_answer` is exactly one of `options`.
    pub fn answer_is_listed(&self) -> bool {
        self.options.iter().any(|o| o == &self.correct_answer)
    }
}

/// Ordered records, persisted as `questions.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionSet {
    #[serde(default)]
    pub questions: Vec<QuestionRecord>,
}

impl QuestionSet {
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Records sorted by ascending `order`.
    pub fn in_order(&self) -> Vec<&QuestionRecord> {
        let mut refs: Vec<&QuestionRecord> = self.questions.iter().collect();
        refs.sort_by_key(|q| q.order);
        refs
    }
}

/// Which diagram generator produced an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagramKind {
    Table,
    Balls,
    Banner,
}

impl DiagramKind {
    /// Filename suffix, without extension.
    pub fn suffix(self) -> &'static str {
        match self {
            DiagramKind::Table => "_table",
            DiagramKind::Balls => "_balls",
            DiagramKind::Banner => "_banner",
        }
    }
}

/// A generated raster file and the record it was drawn for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageArtifact {
    pub order: u32,
    pub title: String,
    pub kind: DiagramKind,
    pub path: PathBuf,
}

/// Illustrator manifest, persisted as `images.json` inside the image directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageManifest {
    #[serde(default)]
    pub images: Vec<ImageArtifact>,
}

impl ImageManifest {
    pub fn find(&self, order: u32) -> Option<&ImageArtifact> {
        self.images.iter().find(|a| a.order == order)
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn whole_number(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .or_else(|| {
                n.as_f64()
                    .filter(|v| *v >= 0.0 && v.fract() == 0.0 && *v <= u32::MAX as f64)
                    .map(|v| v as u32)
            }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Accept `3`, `"3"` or `3.0` for integer fields a model may stringify.
fn number_or_string<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct NumberVisitor;

    impl<'de> Visitor<'de> for NumberVisitor {
        type Value = u32;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a non-negative integer or a numeric string")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<u32, E> {
            u32::try_from(v).map_err(|_| E::custom(format!("{v} is out of range")))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<u32, E> {
            u32::try_from(v).map_err(|_| E::custom(format!("{v} is out of range")))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<u32, E> {
            if v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 {
                Ok(v as u32)
            } else {
                Err(E::custom(format!("{v} is not a whole number")))
            }
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<u32, E> {
            v.trim()
                .parse::<u32>()
                .map_err(|_| E::custom(format!("'{v}' is not a number")))
        }
    }

    deserializer.deserialize_any(NumberVisitor)
}
