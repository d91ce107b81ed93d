//! Progress-callback trait for per-question pipeline events.
//!
//! Inject an [`Arc<dyn StageProgressCallback>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`] to receive
//! events as the generation and illustration stages work through the
//! question list.
//!
//! # Example
//!
//! ```rust
//! use quizgen::{PipelineConfig, Stage, StageProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl StageProgressCallback for CountingCallback {
//!     fn on_item_complete(&self, stage: Stage, order: u32, total: usize) {
//!         let done = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("{stage}: question {order} done ({done}/{total})");
//!     }
//! }
//!
//! let config = PipelineConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { completed: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::fmt;
use std::sync::Arc;

/// Pipeline stage an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extract,
    Generate,
    Illustrate,
    Assemble,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Extract => "extract",
            Stage::Generate => "generate",
            Stage::Illustrate => "illustrate",
            Stage::Assemble => "assemble",
        };
        f.write_str(name)
    }
}

/// Called by the stages as they process each question.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Events arrive in question order; the pipeline is
/// sequential.
pub trait StageProgressCallback: Send + Sync {
    /// Called once before the first item of a stage.
    fn on_stage_start(&self, stage: Stage, total: usize) {
        let _ = (stage, total);
    }

    /// Called just before an item is processed.
    fn on_item_start(&self, stage: Stage, order: u32, total: usize) {
        let _ = (stage, order, total);
    }

    /// Called when an item is done.
    fn on_item_complete(&self, stage: Stage, order: u32, total: usize) {
        let _ = (stage, order, total);
    }

    /// Called when an item fails. The stage aborts right after.
    fn on_item_error(&self, stage: Stage, order: u32, total: usize, error: &str) {
        let _ = (stage, order, total, error);
    }

    /// Called once after the last item of a stage.
    fn on_stage_complete(&self, stage: Stage, total: usize) {
        let _ = (stage, total);
    }
}

/// A no-op implementation, the default when no callback is configured.
pub struct NoopProgressCallback;

impl StageProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type ProgressCallback = Arc<dyn StageProgressCallback>;
