use std::collections::HashSet;
use std::fmt;

use smol_str::SmolStr;

use crate::error::{DecodeError, EncodeError};

/// Delimiter separating inline-array elements, tabular fields, and row cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delimiter {
    #[default]
    Comma,
    Tab,
    Pipe,
}

impl Delimiter {
    pub fn as_char(self) -> char {
        match self {
            Delimiter::Comma => ',',
            Delimiter::Tab => '\t',
            Delimiter::Pipe => '|',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            ',' => Some(Delimiter::Comma),
            '\t' => Some(Delimiter::Tab),
            '|' => Some(Delimiter::Pipe),
            _ => None,
        }
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Indentation unit for nested structures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indent {
    Spaces(usize),
}

impl Indent {
    pub fn spaces(count: usize) -> Self {
        Indent::Spaces(count)
    }

    pub fn width(self) -> usize {
        match self {
            Indent::Spaces(count) => count,
        }
    }
}

impl Default for Indent {
    fn default() -> Self {
        Indent::Spaces(crate::constants::DEFAULT_INDENT)
    }
}

/// How decoded object keys are produced.
///
/// `Intern` shares one allocation per distinct key across the whole decode
/// call. `InternExisting` additionally requires every key to be registered in
/// a [`SymbolTable`] up front, so untrusted input cannot grow the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyMode {
    #[default]
    Strings,
    Intern,
    InternExisting,
}

/// Pre-registered key set for [`KeyMode::InternExisting`].
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: HashSet<SmolStr>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, key: &str) {
        self.symbols.insert(SmolStr::new(key));
    }

    pub fn contains(&self, key: &str) -> bool {
        self.symbols.contains(key)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub(crate) fn get(&self, key: &str) -> Option<SmolStr> {
        self.symbols.get(key).cloned()
    }
}

impl<S: AsRef<str>> FromIterator<S> for SymbolTable {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut table = SymbolTable::new();
        for key in iter {
            table.register(key.as_ref());
        }
        table
    }
}

/// Options for encoding a value tree.
#[derive(Debug, Clone, Default)]
pub struct EncodeOptions {
    pub indent: Indent,
    pub delimiter: Delimiter,
    pub length_marker: Option<char>,
}

impl EncodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_indent(mut self, indent: Indent) -> Self {
        self.indent = indent;
        self
    }

    pub fn with_delimiter(mut self, delimiter: Delimiter) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Prefix the element count in array headers, e.g. `#` for `tags[#3]:`.
    pub fn with_length_marker(mut self, marker: char) -> Self {
        self.length_marker = Some(marker);
        self
    }

    pub(crate) fn validate(&self) -> Result<(), EncodeError> {
        if self.indent.width() == 0 {
            return Err(EncodeError::InvalidOptions(
                "indent width must be greater than zero".to_string(),
            ));
        }
        if let Some(marker) = self.length_marker {
            if marker.is_ascii_digit()
                || marker == ']'
                || marker == '['
                || Delimiter::from_char(marker).is_some()
            {
                return Err(EncodeError::InvalidOptions(format!(
                    "length marker '{marker}' would be ambiguous inside an array header"
                )));
            }
        }
        Ok(())
    }
}

/// Options for decoding a document.
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    pub indent: Indent,
    pub strict: bool,
    pub key_mode: KeyMode,
    pub symbols: Option<SymbolTable>,
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_indent(mut self, indent: Indent) -> Self {
        self.indent = indent;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_key_mode(mut self, key_mode: KeyMode) -> Self {
        self.key_mode = key_mode;
        self
    }

    pub fn with_symbols(mut self, symbols: SymbolTable) -> Self {
        self.symbols = Some(symbols);
        self
    }

    pub(crate) fn validate(&self) -> Result<(), DecodeError> {
        if self.indent.width() == 0 {
            return Err(DecodeError::invalid_options(
                "indent width must be greater than zero",
            ));
        }
        if self.key_mode == KeyMode::InternExisting && self.symbols.is_none() {
            return Err(DecodeError::invalid_options(
                "key mode InternExisting requires a symbol table",
            ));
        }
        Ok(())
    }
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            indent: Indent::default(),
            strict: true,
            key_mode: KeyMode::default(),
            symbols: None,
        }
    }
}
