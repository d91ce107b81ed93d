//! Shared terminal plumbing for the stage binaries (`cli` feature).
//!
//! Logging setup, ANSI colour helpers, the indicatif progress callback and
//! the y/n prompt used by `run-all`.

use crate::progress::{Stage, StageProgressCallback};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────

pub fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
pub fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
pub fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
pub fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}
pub fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
pub fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── Output flags shared by every binary ──────────────────────────────────

#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "QUIZGEN_VERBOSE")]
    pub verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "QUIZGEN_QUIET")]
    pub quiet: bool,

    /// Disable progress bars.
    #[arg(long, env = "QUIZGEN_NO_PROGRESS")]
    pub no_progress: bool,
}

impl OutputArgs {
    pub fn show_progress(&self) -> bool {
        !self.quiet && !self.no_progress
    }

    /// Install the stderr subscriber. `RUST_LOG` wins over the flags.
    pub fn init_logging(&self) {
        let filter = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "info"
        };
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
            )
            .with_writer(io::stderr)
            .init();
    }

    /// Progress callback for the config, or `None` when bars are disabled.
    pub fn progress_callback(&self) -> Option<Arc<dyn StageProgressCallback>> {
        self.show_progress()
            .then(|| CliProgressCallback::new() as Arc<dyn StageProgressCallback>)
    }
}

// ── CLI progress callback using indicatif ────────────────────────────────

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

/// One bar per stage, replaced when the next stage starts.
pub struct CliProgressCallback {
    bar: Mutex<Option<ProgressBar>>,
    start_times: Mutex<HashMap<u32, Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            bar: Mutex::new(None),
            start_times: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Some(ref bar) = *self.bar.lock().unwrap() {
            f(bar);
        }
    }

    fn elapsed(&self, order: u32) -> f64 {
        self.start_times
            .lock()
            .unwrap()
            .remove(&order)
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl StageProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage, total: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        let bar = ProgressBar::new(total as u64);
        bar.set_style(style);
        bar.set_prefix(stage.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));
        self.errors.store(0, Ordering::SeqCst);

        if let Some(old) = self.bar.lock().unwrap().replace(bar) {
            old.finish_and_clear();
        }
    }

    fn on_item_start(&self, _stage: Stage, order: u32, _total: usize) {
        self.start_times.lock().unwrap().insert(order, Instant::now());
        self.with_bar(|bar| bar.set_message(format!("question {order}")));
    }

    fn on_item_complete(&self, _stage: Stage, order: u32, total: usize) {
        let secs = self.elapsed(order);
        self.with_bar(|bar| {
            bar.println(format!(
                "  {} Question {:>3}/{:<3}  {}",
                green("✓"),
                order,
                total,
                dim(&format!("{secs:.1}s")),
            ));
            bar.inc(1);
        });
    }

    fn on_item_error(&self, _stage: Stage, order: u32, total: usize, error: &str) {
        let secs = self.elapsed(order);
        self.errors.fetch_add(1, Ordering::SeqCst);
        let msg: String = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.with_bar(|bar| {
            bar.println(format!(
                "  {} Question {:>3}/{:<3}  {}  {}",
                red("✗"),
                order,
                total,
                red(&msg),
                dim(&format!("{secs:.1}s")),
            ));
        });
    }

    fn on_stage_complete(&self, stage: Stage, total: usize) {
        if let Some(bar) = self.bar.lock().unwrap().take() {
            bar.finish_and_clear();
        }
        let errors = self.errors.load(Ordering::SeqCst);
        if errors == 0 {
            eprintln!("{} {}: {} items", green("✔"), stage, bold(&total.to_string()));
        } else {
            eprintln!(
                "{} {}: {} items, {} with errors",
                yellow("⚠"),
                stage,
                bold(&total.to_string()),
                red(&errors.to_string())
            );
        }
    }
}

// ── Prompts ──────────────────────────────────────────────────────────────

/// Ask a y/n question on stderr; only `y`/`yes` (any case) is a yes.
pub fn confirm(question: &str) -> bool {
    eprint!("{}", yellow(&format!("{question} (y/n): ")));
    let _ = io::stderr().flush();
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(_) => is_yes(&line),
        Err(_) => false,
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
