use crate::constants::{is_keyword, is_structural_char};
use crate::error::DecodeError;

/// Whether a string must be quoted to survive a round trip.
///
/// Anything that could be mistaken for a literal, a number, a marker, or
/// structure gets quoted; the decoder's token classifier accepts a strict
/// subset of these shapes, so an unquoted string can never be re-read as
/// something else.
pub fn needs_quoting(s: &str, delimiter: char) -> bool {
    if s.is_empty() {
        return true;
    }
    if is_keyword(s) || is_number_like(s) {
        return true;
    }

    let mut chars = s.chars();
    let first = match chars.next() {
        Some(ch) => ch,
        None => return true,
    };

    // Leading '-' occupies the list-marker position.
    if first.is_whitespace() || first == '-' {
        return true;
    }
    if first == delimiter || is_structural_char(first) || first.is_control() {
        return true;
    }

    let mut last = first;
    for ch in chars {
        if ch == delimiter || is_structural_char(ch) || ch.is_control() {
            return true;
        }
        last = ch;
    }

    last.is_whitespace()
}

/// Broad numeric-looking test used only for quoting decisions. Deliberately
/// wider than the decode grammar (`05`, `1e5`, `1.2.3` all match) so the
/// encoder quotes every string the decoder might conceivably read as a number.
pub fn is_number_like(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.is_empty() {
        return false;
    }
    let mut i = 0;
    if bytes[0] == b'-' {
        i = 1;
    }
    if i >= bytes.len() || !bytes[i].is_ascii_digit() {
        return false;
    }
    bytes[i..].iter().all(|b| {
        b.is_ascii_digit() || *b == b'.' || *b == b'e' || *b == b'E' || *b == b'+' || *b == b'-'
    })
}

/// Append `s` with the five escapable characters replaced.
pub fn escape_string_into(out: &mut String, s: &str) {
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
}

/// Append `s` wrapped in double quotes, escaped.
pub fn quote_into(out: &mut String, s: &str) {
    out.push('"');
    escape_string_into(out, s);
    out.push('"');
}

/// Parse a quoted token (including both quotes) back into its string value.
pub fn unquote(token: &str) -> Result<String, DecodeError> {
    if token.len() < 2 || !token.starts_with('"') || !token.ends_with('"') {
        return Err(DecodeError::unterminated("unterminated string"));
    }
    unescape(&token[1..token.len() - 1])
}

/// Invert the five-entry escape table; any other escape is an error.
pub fn unescape(inner: &str) -> Result<String, DecodeError> {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            let next = chars
                .next()
                .ok_or_else(|| DecodeError::unterminated("unterminated escape sequence"))?;
            match next {
                'n' => out.push('\n'),
                'r' => out.push('\r'),
                't' => out.push('\t'),
                '"' => out.push('"'),
                '\\' => out.push('\\'),
                other => {
                    return Err(DecodeError::invalid_escape(format!(
                        "invalid escape sequence '\\{other}'"
                    )))
                }
            }
        } else {
            out.push(ch);
        }
    }
    Ok(out)
}

/// Keys render bare only as identifier-ish lexemes; everything else quotes.
pub fn is_bare_key(key: &str) -> bool {
    let bytes = key.as_bytes();
    if bytes.is_empty() {
        return false;
    }
    let first = bytes[0];
    if !first.is_ascii_alphabetic() && first != b'_' {
        return false;
    }
    bytes[1..]
        .iter()
        .all(|b| b.is_ascii_alphanumeric() || *b == b'_' || *b == b'.')
}

/// Render a key, quoting when it is not a bare lexeme.
pub fn write_key_into(out: &mut String, key: &str) {
    if is_bare_key(key) {
        out.push_str(key);
    } else {
        quote_into(out, key);
    }
}
