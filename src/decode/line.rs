use memchr::memchr_iter;

use crate::error::DecodeError;

/// One scanned source line: trimmed content, indentation, and position.
/// Produced by [`scan_lines`], consumed once during parsing, never retained.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Line<'a> {
    /// Leading-space count (columns; a lenient-mode tab counts as one unit).
    pub indent: usize,
    /// `indent / indent_width`.
    pub level: usize,
    /// Content with leading indentation and trailing whitespace removed.
    pub content: &'a str,
    /// 1-based source line number.
    pub number: usize,
    pub is_blank: bool,
}

/// Split the input into classified lines.
///
/// Trailing `\r` is dropped per line, trailing whitespace trimmed, and blank
/// lines flagged. Strict mode rejects tabs in indentation and any indent that
/// is not a whole multiple of `indent_width`; lenient mode counts a tab as
/// one indent unit.
pub(crate) fn scan_lines(
    input: &str,
    indent_width: usize,
    strict: bool,
) -> Result<Vec<Line<'_>>, DecodeError> {
    let bytes = input.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut number = 1;

    for idx in memchr_iter(b'\n', bytes) {
        lines.push(build_line(input, start, idx, number, indent_width, strict)?);
        start = idx + 1;
        number += 1;
    }
    lines.push(build_line(
        input,
        start,
        input.len(),
        number,
        indent_width,
        strict,
    )?);

    Ok(lines)
}

fn build_line(
    input: &str,
    start: usize,
    mut end: usize,
    number: usize,
    indent_width: usize,
    strict: bool,
) -> Result<Line<'_>, DecodeError> {
    if end > start && input.as_bytes()[end - 1] == b'\r' {
        end -= 1;
    }
    let raw = &input[start..end];
    let trimmed = raw.trim_end();

    if trimmed.is_empty() {
        return Ok(Line {
            indent: 0,
            level: 0,
            content: "",
            number,
            is_blank: true,
        });
    }

    let mut indent_columns = 0usize;
    let mut indent_chars = 0usize;
    for ch in trimmed.chars() {
        match ch {
            ' ' => {
                indent_columns += 1;
                indent_chars += 1;
            }
            '\t' => {
                if strict {
                    return Err(DecodeError::indentation("tabs are not allowed in indentation")
                        .at(number, indent_chars + 1, trimmed));
                }
                indent_columns = indent_columns.saturating_add(indent_width);
                indent_chars += 1;
            }
            _ => break,
        }
    }

    if strict && indent_columns % indent_width != 0 {
        return Err(DecodeError::indentation(format!(
            "indentation of {indent_columns} is not a multiple of {indent_width}"
        ))
        .at(number, indent_columns + 1, trimmed));
    }

    Ok(Line {
        indent: indent_columns,
        level: indent_columns / indent_width,
        content: &trimmed[indent_chars..],
        number,
        is_blank: false,
    })
}
