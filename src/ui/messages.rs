//! Coloured user-facing output for the CLI. Diagnostics go through `tracing`.

use crate::utils::colors::{BLUE, BOLD, GREEN, RED, RESET, YELLOW};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Info,
    Success,
    Warning,
    Error,
}

impl Level {
    fn style(self) -> (&'static str, &'static str) {
        match self {
            Level::Info => (BLUE, "ℹ️"),
            Level::Success => (GREEN, "✅"),
            Level::Warning => (YELLOW, "⚠️"),
            Level::Error => (RED, "❌"),
        }
    }
}

/// One message line. The icon is dropped when the text already starts with
/// one, so callers can pass their own.
fn render(level: Level, msg: &dyn fmt::Display) -> String {
    let (color, icon) = level.style();
    let text = msg.to_string();
    if text.starts_with(|c: char| !c.is_ascii() && !c.is_alphanumeric()) {
        format!("{color}{BOLD}{text}{RESET}")
    } else {
        format!("{color}{BOLD}{icon}{RESET} {text}")
    }
}

pub fn info<T: fmt::Display>(msg: T) {
    println!("{}", render(Level::Info, &msg));
}

pub fn success<T: fmt::Display>(msg: T) {
    println!("{}", render(Level::Success, &msg));
}

pub fn warning<T: fmt::Display>(msg: T) {
    println!("{}", render(Level::Warning, &msg));
}

/// Errors go to stderr so exports piped to stdout stay clean.
pub fn error<T: fmt::Display>(msg: T) {
    eprintln!("{}", render(Level::Error, &msg));
}
