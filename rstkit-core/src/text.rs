//! Small text helpers shared by the formatters.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Indentation used for directive options and content.
pub const INDENT: &str = "   ";

/// Display width of `text` in terminal columns, the measure docutils uses
/// for title underlines. East Asian wide characters take two columns.
///
/// ```
/// use rstkit_core::text::display_width;
///
/// assert_eq!(display_width("Intro"), 5);
/// assert_eq!(display_width("Café"), 4);
/// assert_eq!(display_width("标题"), 4);
/// ```
pub fn display_width(text: &str) -> usize {
    text.graphemes(true).map(UnicodeWidthStr::width).sum()
}

/// Indent every line of `body` by `margin`, terminating each with `\n`.
///
/// Blank lines stay empty so the output carries no trailing whitespace.
pub fn indent_block(body: &str, margin: &str) -> String {
    let mut out = String::with_capacity(body.len() + margin.len() * 4);
    for line in body.lines() {
        if !line.trim().is_empty() {
            out.push_str(margin);
            out.push_str(line);
        }
        out.push('\n');
    }
    out
}
