use std::fmt::Display;

use colored::*;
use tracing::info;

/// Target of events that carry terminal decoration rather than log messages.
pub const PRINT_TARGET: &str = "badcapt::print";

pub const TOTAL_WIDTH: usize = 64;
const KEY_WIDTH: usize = 16;

const PRIMARY: Color = Color::BrightGreen;
const SEPARATOR: Color = Color::BrightBlack;
const TEXT_DEFAULT: Color = Color::White;

pub fn print(msg: &str) {
    info!(target: PRINT_TARGET, "{msg}");
}

pub fn banner() {
    let text_content: String = format!("⟦ BADCAPT v{} ⟧ ", env!("CARGO_PKG_VERSION"));
    let text_width: usize = text_content.chars().count();
    let text: ColoredString = text_content.bright_green().bold();
    let sep: ColoredString = "═".repeat(TOTAL_WIDTH.saturating_sub(text_width) / 2).color(SEPARATOR);

    print(&format!("{}{}{}", sep, text, sep));
}

pub fn header(msg: &str) {
    let formatted: String = format!("⟦ {} ⟧", msg);
    let msg_len: usize = formatted.chars().count();

    let dash_count: usize = TOTAL_WIDTH.saturating_sub(msg_len);
    let left: usize = dash_count / 2;
    let right: usize = dash_count - left;

    let line: String = format!(
        "{}{}{}",
        "─".repeat(left).color(SEPARATOR),
        formatted.to_uppercase().color(PRIMARY),
        "─".repeat(right).color(SEPARATOR)
    );
    print(&line);
}

pub fn aligned_line<V: Display>(key: &str, value: V) {
    let dots: String = ".".repeat((KEY_WIDTH + 1).saturating_sub(key.chars().count()));
    let line: String = format!(
        "{} {}{}{} {}",
        ">".color(SEPARATOR),
        key.color(PRIMARY),
        dots.color(SEPARATOR),
        ":".color(SEPARATOR),
        value.to_string().color(TEXT_DEFAULT)
    );
    print(&line);
}

pub fn end_of_program() {
    print(&format!("{}", "═".repeat(TOTAL_WIDTH).color(SEPARATOR)));
}
