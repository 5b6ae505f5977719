use std::sync::OnceLock;

use regex::Regex;

use crate::editing::document::{TextBlock, TextKind};

/// Matches explicit break tags and newlines; carriage returns are
/// stripped before splitting
static LINE_BREAK_REGEX: OnceLock<Regex> = OnceLock::new();

fn line_break_regex() -> &'static Regex {
    LINE_BREAK_REGEX.get_or_init(|| Regex::new(r"(?i)<br\s*/?>|\n").expect("Invalid break regex"))
}

/// Split clipboard plain text into trimmed, non-blank lines
pub(crate) fn split_lines(text: &str) -> Vec<String> {
    let text = text.replace('\r', "");
    line_break_regex()
        .split(&text)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Wrap each surviving line of a paste in its own block
pub(crate) fn blocks_from_plain_text(text: &str) -> Vec<TextBlock> {
    split_lines(text)
        .iter()
        .map(|line| TextBlock::with_text(TextKind::Div, line))
        .collect()
}
