//! Terminal output: colored module prefixes and a build progress line.
//!
//! ```ignore
//! log!("build"; "rendering {} documents", count);
//!
//! if let Some(progress) = Progress::start("documents", paths.len()) {
//!     progress.tick();
//!     progress.finish();
//! }
//! ```
//!
//! Every line looks like `[module] message`. The progress line is redrawn
//! in place as `[documents] [████░░░░] 42/100` and only when stdout is a
//! terminal.

use colored::{ColoredString, Colorize};
use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType, size},
};
use parking_lot::Mutex;
use std::{
    io::{IsTerminal, Write, stdout},
    sync::{
        OnceLock,
        atomic::{AtomicUsize, Ordering},
    },
};

static TERMINAL_WIDTH: OnceLock<usize> = OnceLock::new();

const FALLBACK_WIDTH: usize = 120;
const BAR_MIN: usize = 10;
const BAR_MAX: usize = 40;

fn terminal_width() -> usize {
    *TERMINAL_WIDTH.get_or_init(|| size().map_or(FALLBACK_WIDTH, |(w, _)| usize::from(w)))
}

/// `"[module] "` display width.
const fn prefix_width(module: &str) -> usize {
    module.len() + 3
}

/// Log a message with a colored module prefix.
///
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Write one `[module] message` line.
///
/// On a terminal the message is cut to the terminal width so it never wraps
/// under the progress line; piped output is written in full.
pub fn log(module: &str, message: &str) {
    let mut out = stdout().lock();

    let message = if out.is_terminal() {
        execute!(out, Clear(ClearType::UntilNewLine)).ok();
        truncate_str(message, terminal_width().saturating_sub(prefix_width(module)))
    } else {
        message
    };

    writeln!(out, "{} {message}", prefix(module)).ok();
    out.flush().ok();
}

fn prefix(module: &str) -> ColoredString {
    let text = format!("[{module}]");
    match module {
        "serve" => text.bright_blue().bold(),
        "watch" => text.bright_green().bold(),
        "error" | "failed" => text.bright_red().bold(),
        "warn" => text.bright_magenta().bold(),
        _ => text.bright_yellow().bold(),
    }
}

/// Cut `s` to at most `max` bytes on a char boundary.
fn truncate_str(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// `████░░░░` for `done` of `total` in `width` cells.
fn bar(done: usize, total: usize, width: usize) -> String {
    let filled = if total == 0 { 0 } else { (done.min(total) * width) / total };
    "█".repeat(filled) + &"░".repeat(width - filled)
}

/// Single progress line, shared by rayon workers.
pub struct Progress {
    module: &'static str,
    total: usize,
    done: AtomicUsize,
    // Serializes redraws so concurrent ticks never interleave escape codes.
    draw: Mutex<()>,
}

impl Progress {
    /// `None` for fewer than two items or when stdout is not a terminal.
    pub fn start(module: &'static str, total: usize) -> Option<Self> {
        if total < 2 || !stdout().is_terminal() {
            return None;
        }
        // Reserve the line the bar is drawn on.
        let mut out = stdout().lock();
        writeln!(out).ok();
        out.flush().ok();

        Some(Self {
            module,
            total,
            done: AtomicUsize::new(0),
            draw: Mutex::new(()),
        })
    }

    pub fn tick(&self) {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        self.redraw(done);
    }

    fn redraw(&self, done: usize) {
        let _guard = self.draw.lock();

        let count = format!("{done}/{}", self.total);
        let overhead = prefix_width(self.module) + count.len() + 4;
        let width = terminal_width().saturating_sub(overhead).clamp(BAR_MIN, BAR_MAX);

        let mut out = stdout().lock();
        execute!(out, cursor::MoveUp(1), Clear(ClearType::CurrentLine)).ok();
        write!(out, "{} [{}] {count}", prefix(self.module), bar(done, self.total, width)).ok();
        execute!(out, cursor::MoveDown(1)).ok();
        write!(out, "\r").ok();
        out.flush().ok();
    }

    /// Erase the progress line.
    pub fn finish(&self) {
        let _guard = self.draw.lock();
        let mut out = stdout().lock();
        execute!(out, cursor::MoveUp(1), Clear(ClearType::CurrentLine)).ok();
        out.flush().ok();
    }
}
