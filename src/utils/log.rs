//! Logging utilities with colored output.
//!
//! Provides the `log!` macro for formatted terminal output with colored
//! scope prefixes, e.g. `log!("build"; "compiled {} pages", n)`.
//!
//! When the binary runs as a language service, stdout belongs to the
//! message transport; call [`silence`] before entering the service loop
//! and all logging becomes a no-op.

use colored::{ColoredString, Colorize};
use crossterm::{
    execute,
    terminal::{Clear, ClearType, size},
};
use std::{
    io::{Write, stdout},
    sync::{
        OnceLock,
        atomic::{AtomicBool, Ordering},
    },
};

/// Cached terminal width (fetched once on first use)
static TERMINAL_WIDTH: OnceLock<u16> = OnceLock::new();

/// Set when stdout is reserved for the language-service transport.
static SILENCED: AtomicBool = AtomicBool::new(false);

/// Length of brackets around scope name: "[]"
const BRACKET_LEN: usize = 2;
/// Space after prefix: "[scope] " <- this space
const SPACE_AFTER_PREFIX: usize = 1;

/// Total prefix length for a scope name: `scope.len() + 3`
/// (for "[", "]", and trailing space).
#[inline]
const fn calc_prefix_len(scope_len: usize) -> usize {
    scope_len + BRACKET_LEN + SPACE_AFTER_PREFIX
}

/// Get terminal width, cached after first call.
/// Falls back to 120 columns if detection fails.
fn get_terminal_width() -> u16 {
    *TERMINAL_WIDTH.get_or_init(|| size().map(|(w, _)| w).unwrap_or(120))
}

/// Suppress all terminal logging for the rest of the process.
pub fn silence() {
    SILENCED.store(true, Ordering::Relaxed);
}

/// Log a message with a colored scope prefix.
///
/// # Usage
/// ```ignore
/// log!("scope"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($scope:expr; $($arg:tt)*) => {{
        $crate::utils::log::log($scope, &format!($($arg)*))
    }};
}

/// Log a message with a colored scope prefix.
///
/// Automatically truncates long messages to fit terminal width.
#[inline]
pub fn log(scope: &str, message: &str) {
    if SILENCED.load(Ordering::Relaxed) {
        return;
    }

    let scope_lower = scope.to_ascii_lowercase();
    let prefix = colorize_prefix(scope, &scope_lower);
    let width = get_terminal_width() as usize;

    let mut stdout = stdout().lock();
    execute!(stdout, Clear(ClearType::UntilNewLine)).ok();

    // Truncate message if it exceeds available width
    let prefix_len = calc_prefix_len(scope.len());
    let max_msg_len = width.saturating_sub(prefix_len);

    let message = if message.len() > max_msg_len {
        truncate_str(message, max_msg_len)
    } else {
        message
    };

    writeln!(stdout, "{prefix} {message}").ok();
    stdout.flush().ok();
}

/// Apply color to a scope prefix based on scope type.
#[inline]
fn colorize_prefix(scope: &str, scope_lower: &str) -> ColoredString {
    let prefix = format!("[{scope}]");
    match scope_lower {
        "serve" => prefix.bright_blue().bold(),
        "watch" => prefix.bright_green().bold(),
        "error" => prefix.bright_red().bold(),
        "parse" => prefix.bright_magenta().bold(),
        _ => prefix.bright_yellow().bold(),
    }
}

/// Truncate a string to fit within max_len bytes.
///
/// Ensures the result is valid UTF-8 by finding the nearest character boundary.
#[inline]
fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    // Find the last valid UTF-8 boundary within max_len
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
