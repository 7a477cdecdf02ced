mod line;

use std::collections::HashSet;

use memchr::{memchr, memchr2, memchr_iter};
use smallvec::SmallVec;
use smol_str::SmolStr;

use crate::constants::MAX_DEPTH;
use crate::error::DecodeError;
use crate::number::parse_number_token;
use crate::options::{DecodeOptions, KeyMode, SymbolTable};
use crate::text::{is_bare_key, unquote};
use crate::value::{Map, Value};

use line::{scan_lines, Line};

type TokenBuf<'a> = SmallVec<[&'a str; 16]>;

pub(crate) fn decode_value(input: &str, options: &DecodeOptions) -> Result<Value, DecodeError> {
    options.validate()?;
    let mut decoder = Decoder::new(options);
    decoder.decode_document(input)
}

struct Decoder<'o> {
    indent_width: usize,
    strict: bool,
    key_mode: KeyMode,
    symbols: Option<&'o SymbolTable>,
    interner: HashSet<SmolStr>,
}

/// A parsed `key[N]{fields}:` line. Tokens stay raw (still quoted where the
/// source quoted them) until they are attached to a parent.
struct HeaderLine<'a> {
    key: Option<&'a str>,
    len: usize,
    delimiter: char,
    fields: Option<Vec<&'a str>>,
    inline: Option<&'a str>,
}

struct ParsedArray {
    value: Value,
    next_idx: usize,
    /// Lenient-mode escape: the line that ended a tabular block was really a
    /// parent field written at row level, so the parent re-reads it at its
    /// own level.
    deindent_next: bool,
}

impl<'o> Decoder<'o> {
    fn new(options: &'o DecodeOptions) -> Self {
        Self {
            indent_width: options.indent.width(),
            strict: options.strict,
            key_mode: options.key_mode,
            symbols: options.symbols.as_ref(),
            interner: HashSet::new(),
        }
    }

    fn decode_document(&mut self, input: &str) -> Result<Value, DecodeError> {
        let lines = scan_lines(input, self.indent_width, self.strict)?;

        let non_blank = lines.iter().filter(|line| !line.is_blank).count();
        if non_blank == 0 {
            return Ok(Value::Object(Map::new()));
        }

        let first_idx = lines
            .iter()
            .position(|line| !line.is_blank)
            .expect("at least one non-blank line");
        let first_line = lines[first_idx];

        // A keyless bracket header opens a root array.
        if first_line.content.starts_with('[') {
            if let Some(header) = self
                .parse_array_header(first_line.content)
                .map_err(|e| at_line(e, &first_line))?
            {
                if header.key.is_none() {
                    if first_line.indent != 0 {
                        return Err(at_line(
                            DecodeError::indentation("unexpected indentation"),
                            &first_line,
                        ));
                    }
                    let parsed = self
                        .parse_array_from_header(&header, &lines, first_idx + 1, 0)
                        .map_err(|e| at_line(e, &first_line))?;
                    ensure_no_trailing_content(&lines, parsed.next_idx)?;
                    return Ok(parsed.value);
                }
            }
        }

        if non_blank == 1 {
            if self.strict && first_line.indent != 0 {
                return Err(at_line(
                    DecodeError::indentation("unexpected indentation"),
                    &first_line,
                ));
            }
            return self
                .decode_single_line(first_line.content)
                .map_err(|e| at_line(e, &first_line));
        }

        let mut map = Map::new();
        let next_idx = self.parse_object_block_into(&lines, 0, 0, &mut map)?;
        if lines[next_idx..].iter().any(|line| !line.is_blank) {
            return Err(DecodeError::unexpected("unexpected trailing content"));
        }
        Ok(Value::Object(map))
    }

    /// A one-line document: keyed array, single key-value pair, or root
    /// scalar.
    fn decode_single_line(&mut self, content: &str) -> Result<Value, DecodeError> {
        if looks_like_array_header(content)? {
            if let Some(header) = self.parse_array_header(content)? {
                let items = match header.inline {
                    Some(inline) => self.parse_inline_array(inline, header.delimiter)?,
                    None => Vec::new(),
                };
                if self.strict && items.len() != header.len {
                    return Err(length_mismatch(header.len, items.len()));
                }
                let array = Value::Array(items);
                return match header.key {
                    None => Ok(array),
                    Some(raw) => {
                        let key = self.parse_key_token(raw)?;
                        let mut map = Map::new();
                        self.insert_key(&mut map, key, array)?;
                        Ok(Value::Object(map))
                    }
                };
            }
        }

        if let Some((key_raw, value_raw)) = split_key_value(content)? {
            let key = self.parse_key_token(key_raw)?;
            let value = if value_raw.trim().is_empty() {
                Value::Object(Map::new())
            } else {
                self.parse_value_token(value_raw)?
            };
            let mut map = Map::new();
            self.insert_key(&mut map, key, value)?;
            return Ok(Value::Object(map));
        }

        self.parse_value_token(content)
    }

    fn parse_object_block(
        &mut self,
        lines: &[Line<'_>],
        idx: usize,
        base_level: usize,
    ) -> Result<(Map, usize), DecodeError> {
        let mut map = Map::new();
        let next_idx = self.parse_object_block_into(lines, idx, base_level, &mut map)?;
        Ok((map, next_idx))
    }

    fn parse_object_block_into(
        &mut self,
        lines: &[Line<'_>],
        mut idx: usize,
        base_level: usize,
        map: &mut Map,
    ) -> Result<usize, DecodeError> {
        if base_level > MAX_DEPTH {
            return Err(DecodeError::depth_limit(MAX_DEPTH));
        }
        let mut override_level: Option<usize> = None;
        while idx < lines.len() {
            let line = lines[idx];
            if line.is_blank {
                idx += 1;
                continue;
            }
            let level = override_level.take().unwrap_or(line.level);
            if level < base_level {
                break;
            }
            if level > base_level {
                return Err(at_line(
                    DecodeError::indentation("unexpected indentation"),
                    &line,
                ));
            }
            let content = line.content;

            if looks_like_array_header(content).map_err(|e| at_line(e, &line))? {
                if let Some(header) = self
                    .parse_array_header(content)
                    .map_err(|e| at_line(e, &line))?
                {
                    let raw_key = header.key.ok_or_else(|| {
                        at_line(
                            DecodeError::header("array header is missing its key"),
                            &line,
                        )
                    })?;
                    let parsed = self
                        .parse_array_from_header(&header, lines, idx + 1, base_level)
                        .map_err(|e| at_line(e, &line))?;
                    let key = self.parse_key_token(raw_key).map_err(|e| at_line(e, &line))?;
                    self.insert_key(map, key, parsed.value)
                        .map_err(|e| at_line(e, &line))?;
                    if parsed.deindent_next {
                        override_level = Some(base_level);
                    }
                    idx = parsed.next_idx;
                    continue;
                }
            }

            if let Some((key_raw, value_raw)) =
                split_key_value(content).map_err(|e| at_line(e, &line))?
            {
                let key = self.parse_key_token(key_raw).map_err(|e| at_line(e, &line))?;
                if value_raw.trim().is_empty() {
                    let (nested, next_idx) =
                        self.parse_object_block(lines, idx + 1, base_level + 1)?;
                    self.insert_key(map, key, Value::Object(nested))
                        .map_err(|e| at_line(e, &line))?;
                    idx = next_idx;
                } else {
                    let value = self
                        .parse_value_token(value_raw)
                        .map_err(|e| at_line(e, &line))?;
                    self.insert_key(map, key, value)
                        .map_err(|e| at_line(e, &line))?;
                    idx += 1;
                }
                continue;
            }

            if self.strict {
                return Err(at_line(
                    DecodeError::unexpected("expected 'key: value', found a bare token"),
                    &line,
                ));
            }
            let key = self.parse_key_token(content).map_err(|e| at_line(e, &line))?;
            self.insert_key(map, key, Value::Null)
                .map_err(|e| at_line(e, &line))?;
            idx += 1;
        }
        Ok(idx)
    }

    fn parse_array_from_header(
        &mut self,
        header: &HeaderLine<'_>,
        lines: &[Line<'_>],
        idx: usize,
        base_level: usize,
    ) -> Result<ParsedArray, DecodeError> {
        if let Some(inline) = header.inline {
            let items = self.parse_inline_array(inline, header.delimiter)?;
            if self.strict && items.len() != header.len {
                return Err(length_mismatch(header.len, items.len()));
            }
            return Ok(ParsedArray {
                value: Value::Array(items),
                next_idx: idx,
                deindent_next: false,
            });
        }

        if let Some(fields) = header.fields.as_deref() {
            let (rows, next_idx, deindent_next) = self.parse_tabular_block(
                lines,
                idx,
                base_level,
                fields,
                header.delimiter,
                header.len,
            )?;
            if self.strict && rows.len() != header.len {
                return Err(length_mismatch(header.len, rows.len()));
            }
            return Ok(ParsedArray {
                value: Value::Array(rows),
                next_idx,
                deindent_next,
            });
        }

        if header.len == 0 {
            return Ok(ParsedArray {
                value: Value::Array(Vec::new()),
                next_idx: idx,
                deindent_next: false,
            });
        }

        let (items, next_idx) = self.parse_list_block(lines, idx, base_level + 1, header.len)?;
        if self.strict && items.len() != header.len {
            return Err(length_mismatch(header.len, items.len()));
        }
        Ok(ParsedArray {
            value: Value::Array(items),
            next_idx,
            deindent_next: false,
        })
    }

    fn parse_tabular_block(
        &mut self,
        lines: &[Line<'_>],
        mut idx: usize,
        base_level: usize,
        fields: &[&str],
        delimiter: char,
        expected_len: usize,
    ) -> Result<(Vec<Value>, usize, bool), DecodeError> {
        let mut field_keys = Vec::with_capacity(fields.len());
        for field in fields {
            field_keys.push(self.parse_key_token(field)?);
        }

        let mut rows = Vec::with_capacity(expected_len.min(1024));
        let mut row_level = None;
        while idx < lines.len() {
            let line = lines[idx];
            if line.is_blank {
                if !self.strict {
                    idx += 1;
                    continue;
                }
                let mut peek = idx + 1;
                while peek < lines.len() && lines[peek].is_blank {
                    peek += 1;
                }
                if peek >= lines.len() || lines[peek].level <= base_level {
                    break;
                }
                return Err(at_line(
                    DecodeError::blank_line("blank line not allowed inside array"),
                    &line,
                ));
            }
            let level = line.level;
            if row_level.is_none() {
                if level <= base_level {
                    return Ok((rows, idx, false));
                }
                row_level = Some(level);
            }
            let row_level = row_level.expect("row level established above");
            if level < row_level {
                return Ok((rows, idx, false));
            }
            if level > row_level {
                return Err(at_line(
                    DecodeError::indentation("unexpected indentation"),
                    &line,
                ));
            }

            let mut row_content = line.content;
            if let Some(stripped) = row_content.strip_prefix('-') {
                if stripped.starts_with(' ') || stripped.starts_with('\t') {
                    row_content = stripped.trim_start();
                }
            }
            if !is_tabular_row(row_content, delimiter).map_err(|e| at_line(e, &line))? {
                return Ok((rows, idx, true));
            }

            let mut tokens = split_delimited(row_content, delimiter).map_err(|e| at_line(e, &line))?;
            if tokens.len() != field_keys.len() {
                if self.strict {
                    return Err(at_line(
                        DecodeError::length_mismatch(format!(
                            "expected {} fields per row, found {}",
                            field_keys.len(),
                            tokens.len()
                        )),
                        &line,
                    ));
                }
                if tokens.len() < field_keys.len() {
                    tokens.extend(std::iter::repeat("").take(field_keys.len() - tokens.len()));
                } else {
                    tokens.truncate(field_keys.len());
                }
            }

            let mut obj = Map::new();
            for (key, token) in field_keys.iter().zip(tokens.iter()) {
                let value = if token.is_empty() {
                    Value::String(String::new())
                } else {
                    self.parse_value_token(token).map_err(|e| at_line(e, &line))?
                };
                self.insert_key(&mut obj, key.clone(), value)
                    .map_err(|e| at_line(e, &line))?;
            }
            rows.push(Value::Object(obj));
            idx += 1;
        }
        Ok((rows, idx, false))
    }

    fn parse_list_block(
        &mut self,
        lines: &[Line<'_>],
        mut idx: usize,
        item_level: usize,
        expected_len: usize,
    ) -> Result<(Vec<Value>, usize), DecodeError> {
        if item_level > MAX_DEPTH {
            return Err(DecodeError::depth_limit(MAX_DEPTH));
        }
        let mut items = Vec::with_capacity(expected_len.min(1024));
        while idx < lines.len() {
            let line = lines[idx];
            if line.is_blank {
                if !self.strict {
                    idx += 1;
                    continue;
                }
                let mut peek = idx + 1;
                while peek < lines.len() && lines[peek].is_blank {
                    peek += 1;
                }
                if peek >= lines.len() || lines[peek].level < item_level {
                    break;
                }
                return Err(at_line(
                    DecodeError::blank_line("blank line not allowed inside array"),
                    &line,
                ));
            }
            let level = line.level;
            if level < item_level {
                break;
            }
            if level > item_level {
                return Err(at_line(
                    DecodeError::indentation("unexpected indentation"),
                    &line,
                ));
            }
            let content = line.content;
            if !content.starts_with('-') {
                return Err(at_line(
                    DecodeError::unexpected("expected a '- ' list item"),
                    &line,
                ));
            }
            let item_content = content[1..].trim_start();
            let (item, next_idx) = self
                .parse_list_item(item_content, lines, idx + 1, item_level)
                .map_err(|e| at_line(e, &line))?;
            items.push(item);
            idx = next_idx;
        }
        Ok((items, idx))
    }

    fn parse_list_item(
        &mut self,
        item_content: &str,
        lines: &[Line<'_>],
        idx: usize,
        item_level: usize,
    ) -> Result<(Value, usize), DecodeError> {
        // A bare marker is an empty object.
        if item_content.is_empty() {
            return Ok((Value::Object(Map::new()), idx));
        }

        if looks_like_array_header(item_content)? {
            if let Some(header) = self.parse_array_header(item_content)? {
                let raw_key = match header.key {
                    None => {
                        let parsed =
                            self.parse_array_from_header(&header, lines, idx, item_level)?;
                        return Ok((parsed.value, parsed.next_idx));
                    }
                    Some(raw) => raw,
                };
                // A keyed array hoisted onto the marker line keeps its block
                // one level under the item's fields.
                let array_base_level = if header.fields.is_some() && !self.strict {
                    item_level
                } else {
                    item_level + 1
                };
                let parsed =
                    self.parse_array_from_header(&header, lines, idx, array_base_level)?;
                let key = self.parse_key_token(raw_key)?;
                let mut map = Map::new();
                self.insert_key(&mut map, key, parsed.value)?;
                let next_idx = self.parse_object_block_into(
                    lines,
                    parsed.next_idx,
                    item_level + 1,
                    &mut map,
                )?;
                return Ok((Value::Object(map), next_idx));
            }
        }

        if split_key_value(item_content)?.is_some() {
            return self.parse_object_item_from_line(item_content, lines, idx, item_level);
        }

        let value = self.parse_value_token(item_content)?;
        Ok((value, idx))
    }

    /// An object list item whose first field sits on the marker line.
    fn parse_object_item_from_line(
        &mut self,
        first_content: &str,
        lines: &[Line<'_>],
        mut idx: usize,
        item_level: usize,
    ) -> Result<(Value, usize), DecodeError> {
        let base_level = item_level + 1;
        let mut map = Map::new();
        if let Some((key_raw, value_raw)) = split_key_value(first_content)? {
            let key = self.parse_key_token(key_raw)?;
            if value_raw.trim().is_empty() {
                let (nested, next_idx) = self.parse_object_block(lines, idx, base_level + 1)?;
                self.insert_key(&mut map, key, Value::Object(nested))?;
                idx = next_idx;
            } else {
                let value = self.parse_value_token(value_raw)?;
                self.insert_key(&mut map, key, value)?;
            }
        }
        let next_idx = self.parse_object_block_into(lines, idx, base_level, &mut map)?;
        Ok((Value::Object(map), next_idx))
    }

    fn parse_inline_array(
        &self,
        inline: &str,
        delimiter: char,
    ) -> Result<Vec<Value>, DecodeError> {
        let tokens = split_delimited(inline, delimiter)?;
        let mut values = Vec::with_capacity(tokens.len());
        for token in tokens {
            if token.is_empty() {
                values.push(Value::String(String::new()));
            } else {
                values.push(self.parse_value_token(token)?);
            }
        }
        Ok(values)
    }

    /// Classify a bare token: literal, number, or plain string, in that
    /// order. Quoted tokens unescape to strings unconditionally.
    fn parse_value_token(&self, token: &str) -> Result<Value, DecodeError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(DecodeError::unexpected("empty value"));
        }
        if token.starts_with('"') {
            return Ok(Value::String(unquote(token)?));
        }
        // The encoder quotes every string containing a colon, so an unquoted
        // colon here means broken structure (`key: : value` and the like).
        if self.strict && token.contains(':') {
            return Err(DecodeError::unexpected(format!(
                "unexpected ':' in unquoted value '{token}'"
            )));
        }
        match token {
            "null" => return Ok(Value::Null),
            "true" => return Ok(Value::Bool(true)),
            "false" => return Ok(Value::Bool(false)),
            _ => {}
        }
        if let Some(number) = parse_number_token(token) {
            return Ok(Value::Number(number));
        }
        Ok(Value::String(token.to_string()))
    }

    fn parse_key_token(&mut self, token: &str) -> Result<SmolStr, DecodeError> {
        let token = token.trim();
        if token.starts_with('"') {
            let value = unquote(token)?;
            return self.make_key(&value);
        }
        if self.strict {
            if token.chars().any(char::is_whitespace) {
                return Err(DecodeError::unexpected(format!(
                    "invalid unquoted key '{token}'"
                )));
            }
            if token.is_ascii() && !is_bare_key(token) {
                return Err(DecodeError::unexpected(format!(
                    "invalid unquoted key '{token}'"
                )));
            }
        }
        self.make_key(token)
    }

    fn make_key(&mut self, text: &str) -> Result<SmolStr, DecodeError> {
        match self.key_mode {
            KeyMode::Strings => Ok(SmolStr::new(text)),
            KeyMode::Intern => {
                if let Some(existing) = self.interner.get(text) {
                    return Ok(existing.clone());
                }
                let key = SmolStr::new(text);
                self.interner.insert(key.clone());
                Ok(key)
            }
            KeyMode::InternExisting => self
                .symbols
                .and_then(|table| table.get(text))
                .ok_or_else(|| DecodeError::unknown_symbol(text)),
        }
    }

    fn insert_key(&self, map: &mut Map, key: SmolStr, value: Value) -> Result<(), DecodeError> {
        if self.strict && map.contains_key(key.as_str()) {
            return Err(DecodeError::duplicate_key(key.as_str()));
        }
        map.insert(key, value);
        Ok(())
    }

    fn parse_array_header<'s>(
        &self,
        content: &'s str,
    ) -> Result<Option<HeaderLine<'s>>, DecodeError> {
        let bracket_start = match find_unquoted(content, '[')? {
            Some(idx) => idx,
            None => return Ok(None),
        };
        let bracket_end = match content[bracket_start + 1..].find(']') {
            Some(idx) => bracket_start + 1 + idx,
            None => return Err(DecodeError::header("unterminated array header")),
        };

        let key_part = content[..bracket_start].trim();
        let key = (!key_part.is_empty()).then_some(key_part);

        let inner = content[bracket_start + 1..bracket_end].trim_matches(' ');
        if inner.is_empty() {
            return Err(DecodeError::header("array length missing"));
        }

        // An optional single-character length marker may prefix the count.
        let mut digits = inner;
        let first = inner.chars().next().expect("inner is non-empty");
        if !first.is_ascii_digit() && crate::options::Delimiter::from_char(first).is_none() {
            digits = &inner[first.len_utf8()..];
        }

        let digits_end = digits
            .find(|ch: char| !ch.is_ascii_digit())
            .unwrap_or(digits.len());
        if digits_end == 0 {
            return Err(DecodeError::header("array length missing"));
        }
        let len: usize = digits[..digits_end]
            .parse()
            .map_err(|_| DecodeError::header("invalid array length"))?;

        let mut remainder = digits[digits_end..].chars().peekable();
        while matches!(remainder.peek(), Some(' ')) {
            remainder.next();
        }
        let delimiter = match remainder.next() {
            None => ',',
            Some(delimiter) => {
                if remainder.any(|ch| ch != ' ') {
                    return Err(DecodeError::header("invalid array delimiter"));
                }
                if crate::options::Delimiter::from_char(delimiter).is_none() {
                    return Err(DecodeError::header("invalid array delimiter"));
                }
                delimiter
            }
        };

        let mut rest = content[bracket_end + 1..].trim_start();
        let mut fields = None;
        if let Some(after_brace) = rest.strip_prefix('{') {
            let end = after_brace
                .find('}')
                .ok_or_else(|| DecodeError::header("unterminated field list"))?;
            let segment = &after_brace[..end];
            let mut parsed_fields = Vec::new();
            for token in split_delimited(segment, delimiter)? {
                if token.is_empty() {
                    return Err(DecodeError::header("empty field name"));
                }
                parsed_fields.push(token);
            }
            if parsed_fields.is_empty() {
                return Err(DecodeError::header("empty field list"));
            }
            fields = Some(parsed_fields);
            rest = after_brace[end + 1..].trim_start();
        }

        let colon_idx = rest
            .find(':')
            .ok_or_else(|| DecodeError::header("array header is missing ':'"))?;
        if !rest[..colon_idx].trim().is_empty() {
            return Err(DecodeError::header("unexpected text after array header"));
        }
        let inline = rest[colon_idx + 1..].trim();
        let inline = (!inline.is_empty()).then_some(inline);

        Ok(Some(HeaderLine {
            key,
            len,
            delimiter,
            fields,
            inline,
        }))
    }
}

fn length_mismatch(declared: usize, actual: usize) -> DecodeError {
    DecodeError::length_mismatch(format!(
        "array declares {declared} elements but has {actual}"
    ))
}

fn at_line(err: DecodeError, line: &Line<'_>) -> DecodeError {
    err.at(line.number, line.indent + 1, line.content)
}

fn ensure_no_trailing_content(lines: &[Line<'_>], start_idx: usize) -> Result<(), DecodeError> {
    if let Some(line) = lines[start_idx..].iter().find(|line| !line.is_blank) {
        return Err(at_line(
            DecodeError::unexpected("unexpected trailing content"),
            line,
        ));
    }
    Ok(())
}

/// True when the first unquoted '[' precedes any unquoted ':' and a colon
/// exists at all, i.e. the line can only be an array header.
fn looks_like_array_header(content: &str) -> Result<bool, DecodeError> {
    let bracket = find_unquoted(content, '[')?;
    let colon = find_unquoted(content, ':')?;
    Ok(match (bracket, colon) {
        (Some(b), Some(c)) => b < c,
        _ => false,
    })
}

fn find_unquoted(content: &str, needle: char) -> Result<Option<usize>, DecodeError> {
    let mut in_quotes = false;
    let mut escape = false;
    for (idx, ch) in content.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        if in_quotes {
            if ch == '\\' {
                escape = true;
            } else if ch == '"' {
                in_quotes = false;
            }
            continue;
        }
        if ch == '"' {
            in_quotes = true;
            continue;
        }
        if ch == needle {
            return Ok(Some(idx));
        }
    }
    if in_quotes {
        return Err(DecodeError::unterminated("unterminated string"));
    }
    Ok(None)
}

/// Split at the first unquoted colon into raw key and value parts.
fn split_key_value(content: &str) -> Result<Option<(&str, &str)>, DecodeError> {
    let bytes = content.as_bytes();
    if content.is_ascii() && memchr2(b'"', b'\\', bytes).is_none() {
        return Ok(memchr(b':', bytes).map(|idx| (&content[..idx], &content[idx + 1..])));
    }
    match find_unquoted(content, ':')? {
        Some(idx) => Ok(Some((&content[..idx], &content[idx + 1..]))),
        None => Ok(None),
    }
}

/// Delimiter-aware field splitting: the delimiter only separates outside
/// quoted spans; tokens come back trimmed.
fn split_delimited<'s>(input: &'s str, delimiter: char) -> Result<TokenBuf<'s>, DecodeError> {
    let mut tokens = TokenBuf::new();
    let bytes = input.as_bytes();

    if input.is_ascii() && memchr2(b'"', b'\\', bytes).is_none() {
        let delim = delimiter as u8;
        let mut start = 0;
        for idx in memchr_iter(delim, bytes) {
            tokens.push(input[start..idx].trim());
            start = idx + 1;
        }
        if start < bytes.len() || input.ends_with(delimiter) {
            tokens.push(input[start..].trim());
        }
        return Ok(tokens);
    }

    let mut in_quotes = false;
    let mut escape = false;
    let mut start = 0;
    for (idx, ch) in input.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        if in_quotes {
            if ch == '\\' {
                escape = true;
            } else if ch == '"' {
                in_quotes = false;
            }
            continue;
        }
        if ch == '"' {
            in_quotes = true;
            continue;
        }
        if ch == delimiter {
            tokens.push(input[start..idx].trim());
            start = idx + ch.len_utf8();
        }
    }
    if in_quotes {
        return Err(DecodeError::unterminated("unterminated string"));
    }
    if start < input.len() || input.ends_with(delimiter) {
        tokens.push(input[start..].trim());
    }
    Ok(tokens)
}

/// A row line contains no unquoted colon before the first delimiter;
/// otherwise it is a `key: value` line that ends the tabular block.
fn is_tabular_row(content: &str, delimiter: char) -> Result<bool, DecodeError> {
    let colon = find_unquoted(content, ':')?;
    let delim = find_unquoted(content, delimiter)?;
    Ok(match (colon, delim) {
        (Some(c), Some(d)) => d < c,
        (Some(_), None) => false,
        _ => true,
    })
}
