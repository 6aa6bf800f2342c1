//! Line-level parsing primitives for the text rewriters.
//!
//! Rewriters split a file with [`lines`] so every line keeps its terminator,
//! then splice a single token with [`replace_span`]. Everything outside the
//! span stays byte-identical.

use std::ops::Range;

/// Iterate over lines with their `\n` / `\r\n` terminators attached.
pub fn lines(content: &str) -> impl Iterator<Item = &str> {
    content.split_inclusive('\n')
}

/// The first whitespace-separated token of a line and the byte range of the
/// second one. A trailing `;` is not part of the second token.
pub fn leading_tokens(line: &str) -> Option<(&str, Range<usize>)> {
    let first_start = line.find(|c: char| !c.is_whitespace())?;
    let first_len = line[first_start..].find(char::is_whitespace)?;
    let first = &line[first_start..first_start + first_len];

    let rest = first_start + first_len;
    let second_start = rest + line[rest..].find(|c: char| !c.is_whitespace())?;
    let mut second_end = line[second_start..]
        .find(char::is_whitespace)
        .map(|n| second_start + n)
        .unwrap_or(line.len());

    if line[second_start..second_end].ends_with(';') {
        second_end -= 1;
    }
    if second_end == second_start {
        return None;
    }

    Some((first, second_start..second_end))
}

/// Copy of `line` with `span` replaced by `replacement`.
pub fn replace_span(line: &str, span: Range<usize>, replacement: &str) -> String {
    let mut out = String::with_capacity(line.len() + replacement.len());
    out.push_str(&line[..span.start]);
    out.push_str(replacement);
    out.push_str(&line[span.end..]);
    out
}
