//! Pipeline stages for docx question generation.
//!
//! Each submodule implements exactly one transformation step. Stages talk to
//! each other only through the artifacts in [`crate::artifact`], so any one
//! of them can be re-run on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ classify | llm ──▶ illustrate ──▶ assemble
//! (path/URL) (docx-rs,   (templates or    (image +        (docx-rs)
//!             zip)        chat model)      ab_glyph)
//! ```
//!
//! 1. [`input`]: canonicalise the user-supplied path or URL to a local file
//! 2. [`extract`]: paragraph text and embedded media; [`segment`] splits the
//!    text into per-question blocks
//! 3. [`classify`]: deterministic keyword-dispatched templates; [`llm`] is
//!    the generative alternative and the only stage with network I/O
//! 4. [`illustrate`]: one diagram per record, drawn on a [`canvas`]
//! 5. [`assemble`]: tagged-line output document with figures

pub mod assemble;
pub mod canvas;
pub mod classify;
pub mod extract;
pub mod illustrate;
pub mod input;
pub mod llm;
pub mod segment;
