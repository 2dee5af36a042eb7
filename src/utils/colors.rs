/// ANSI color helper utilities for terminal output.
pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";

pub const GREY: &str = "\x1b[90m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const BLUE: &str = "\x1b[34m";
pub const CYAN: &str = "\x1b[36m";

/// Color of a 1-10 wellbeing score:
/// 7..=10 → green, 4..=6 → yellow, below → red.
/// With `inverted` (stress), low is good.
pub fn color_for_metric(value: u8, inverted: bool) -> &'static str {
    let v = if inverted { 11u8.saturating_sub(value) } else { value };
    match v {
        7.. => GREEN,
        4..=6 => YELLOW,
        _ => RED,
    }
}

/// `value` wrapped in its metric color.
pub fn colorize_metric(value: u8, inverted: bool) -> String {
    format!("{}{value:>2}{RESET}", color_for_metric(value, inverted))
}
