//! Classifier/Templater: deterministic, offline question synthesis.
//!
//! Each raw block is dispatched to exactly one template by case-insensitive
//! keyword presence. The dispatch is a static priority table
//! ([`TEMPLATE_RULES`]) evaluated top to bottom, first match wins; a block
//! matching no rule gets the fallback template.
//!
//! ```text
//! "uniform" | "shirt"            → UniformCombinations
//! "balls" | "radius" | "pack"    → PackedSpheres
//! anything else                  → Fallback
//! ```
//!
//! The two named templates ignore the numbers in the source block and emit
//! a fixed-structure variant; only the fallback carries source text through.

use crate::model::{Difficulty, QuestionRecord, QuestionSet};
use tracing::debug;

/// Subject shared by every templated record.
pub const SUBJECT: &str = "Quantitative Math";

/// Shirt colours used by the uniform template.
pub const SHIRT_COLORS: [&str; 4] = ["Blue", "Green", "Gray", "White"];

/// Pants colours used by the uniform template.
pub const PANTS_COLORS: [&str; 3] = ["Black", "Khaki", "Navy"];

/// Ball radius, in centimetres, used by the packed-spheres template.
pub const SPHERE_RADIUS_CM: u32 = 3;

/// Template chosen for a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    UniformCombinations,
    PackedSpheres,
    Fallback,
}

/// One row of the dispatch table.
#[derive(Debug)]
pub struct KeywordRule<K: 'static> {
    pub keywords: &'static [&'static str],
    pub kind: K,
}

impl<K: Copy> KeywordRule<K> {
    /// `lowered` must already be lowercase.
    pub fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k))
    }
}

/// First matching rule wins.
pub const TEMPLATE_RULES: &[KeywordRule<TemplateKind>] = &[
    KeywordRule {
        keywords: &["uniform", "shirt"],
        kind: TemplateKind::UniformCombinations,
    },
    KeywordRule {
        keywords: &["balls", "radius", "pack"],
        kind: TemplateKind::PackedSpheres,
    },
];

/// Evaluate a rule table against `text`, case-insensitively.
pub fn first_match<K: Copy>(rules: &[KeywordRule<K>], text: &str, fallback: K) -> K {
    let lowered = text.to_lowercase();
    rules
        .iter()
        .find(|r| r.matches(&lowered))
        .map(|r| r.kind)
        .unwrap_or(fallback)
}

/// Pick the template for one raw block.
pub fn select_template(block: &str) -> TemplateKind {
    first_match(TEMPLATE_RULES, block, TemplateKind::Fallback)
}

/// Build one record per block, `order` = position + 1.
pub fn classify_and_template(blocks: &[String], fallback_char_limit: usize) -> QuestionSet {
    let questions = blocks
        .iter()
        .enumerate()
        .map(|(i, block)| {
            let order = i as u32 + 1;
            let kind = select_template(block);
            debug!("Block {} → {:?}", order, kind);
            let mut record = match kind {
                TemplateKind::UniformCombinations => uniform_combinations(),
                TemplateKind::PackedSpheres => packed_spheres(),
                TemplateKind::Fallback => fallback(block, order, fallback_char_limit),
            };
            record.order = order;
            record
        })
        .collect();
    QuestionSet { questions }
}

/// Two independent choice sets; answer is the product of their sizes.
pub fn uniform_combinations() -> QuestionRecord {
    let shirts = SHIRT_COLORS.len();
    let pants = PANTS_COLORS.len();
    let total = shirts * pants;
    let options = vec![
        total.to_string(),
        (total - 1).to_string(),
        (total + 1).to_string(),
        (total * 2).to_string(),
    ];

    QuestionRecord {
        title: "Uniform Color Combinations".into(),
        description: "Compute the number of different uniform combinations from given options."
            .into(),
        question: format!(
            "Each student must wear one shirt and one pair of pants. There are {} shirt colors: {} \
             and {} pants colors: {}. How many different uniforms are possible?",
            shirts,
            SHIRT_COLORS.join(", "),
            pants,
            PANTS_COLORS.join(", ")
        ),
        instruction: "Select the best answer.".into(),
        difficulty: Difficulty::Easy,
        order: 0,
        correct_answer: total.to_string(),
        options,
        explanation: format!("Number of combinations = {shirts} * {pants} = {total}."),
        subject: SUBJECT.into(),
        unit: "Numbers and Operations".into(),
        topic: "Computation with Whole Numbers".into(),
        plusmarks: 1,
    }
}

/// Bounding box of a 2 × 3 packing of six equal spheres.
pub fn packed_spheres() -> QuestionRecord {
    let r = SPHERE_RADIUS_CM;
    let options = vec![
        dims(2, 3, 6),
        dims(2 * r, 4 * r, 6 * r),
        dims(2, 4, 6),
        dims(4 * r, 8 * r, 12 * r),
        dims(6 * r, 8 * r, 12 * r),
    ];
    let correct_answer = options[1].clone();

    QuestionRecord {
        title: "Packed Spheres in a Rectangular Box".into(),
        description:
            "Find the dimensions of a rectangular box tightly holding a pack of spheres.".into(),
        question: format!(
            "The top view of a rectangular package of 6 tightly packed balls is shown. If each \
             ball has a radius of {r} centimeters, which of the following are closest to the \
             dimensions, in centimeters, of the rectangular package?"
        ),
        instruction: "Choose the best option.".into(),
        difficulty: Difficulty::Moderate,
        order: 0,
        options,
        correct_answer,
        explanation: "Constructed variant; the arrangement chosen gives the corresponding \
                      bounding box dimensions."
            .into(),
        subject: SUBJECT.into(),
        unit: "Geometry and Measurement".into(),
        topic: "Packing / Coordinate Geometry".into(),
        plusmarks: 1,
    }
}

/// Generic record carrying the start of the original block.
pub fn fallback(block: &str, order: u32, char_limit: usize) -> QuestionRecord {
    QuestionRecord {
        title: format!("Autogen Question {order}"),
        description: "Auto-generated problem from template fallback.".into(),
        question: block.chars().take(char_limit).collect(),
        instruction: "Answer the following.".into(),
        difficulty: Difficulty::Moderate,
        order,
        options: ["A", "B", "C", "D"].iter().map(|s| s.to_string()).collect(),
        correct_answer: "A".into(),
        explanation: "Fallback explanation.".into(),
        subject: SUBJECT.into(),
        unit: "Problem Solving".into(),
        topic: "Word Problems".into(),
        plusmarks: 1,
    }
}

/// `a \times b \times c`, kept as LaTeX for the downstream renderer.
fn dims(a: u32, b: u32, c: u32) -> String {
    format!("{a} \\times {b} \\times {c}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn priority_order_uniform_beats_spheres() {
        // Mentions both a shirt and balls; the uniform rule is checked first.
        assert_eq!(
            select_template("A SHIRT box holds 6 balls"),
            TemplateKind::UniformCombinations
        );
        assert_eq!(select_template("Tightly PACKED tins"), TemplateKind::PackedSpheres);
        assert_eq!(select_template("radius of a wheel"), TemplateKind::PackedSpheres);
        assert_eq!(select_template("What is 7 + 5?"), TemplateKind::Fallback);
    }

    #[test]
    fn shirt_blocks_yield_twelve() {
        let set = classify_and_template(
            &blocks(&["3. Each closet has shirts in 4 colors and pants in 3 colors..."]),
            600,
        );
        let q = &set.questions[0];
        assert_eq!(q.options, vec!["12", "11", "13", "24"]);
        assert_eq!(q.correct_answer, "12");
        assert_eq!(q.subject, "Quantitative Math");
        assert_eq!(q.difficulty, Difficulty::Easy);
        assert!(q.answer_is_listed());
    }

    #[test]
    fn packed_spheres_answer_is_an_option_string() {
        let q = packed_spheres();
        assert_eq!(q.options.len(), 5);
        assert_eq!(q.correct_answer, "6 \\times 12 \\times 18");
        assert_eq!(q.correct_answer, q.options[1]);
        assert!(q.answer_is_listed());
    }

    #[test]
    fn fallback_truncates_and_uses_letters() {
        let long = "x".repeat(1000);
        let set = classify_and_template(&blocks(&["What is 2+2?", &long]), 600);
        let q = &set.questions[1];
        assert_eq!(q.options, vec!["A", "B", "C", "D"]);
        assert_eq!(q.correct_answer, "A");
        assert_eq!(q.question.chars().count(), 600);
        assert_eq!(q.title, "Autogen Question 2");
    }

    #[test]
    fn fallback_truncation_respects_char_boundaries() {
        let block = "é".repeat(700);
        let q = fallback(&block, 1, 600);
        assert_eq!(q.question.chars().count(), 600);
    }

    #[test]
    fn orders_are_one_based_and_unique() {
        let input = blocks(&["shirt", "balls", "other", "uniform", "nothing"]);
        let set = classify_and_template(&input, 600);
        let orders: Vec<u32> = set.questions.iter().map(|q| q.order).collect();
        assert_eq!(orders, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn empty_input_empty_set() {
        assert!(classify_and_template(&[], 600).is_empty());
    }
}
