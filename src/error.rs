use std::fmt;

use thiserror::Error;

/// Errors produced while encoding a value tree.
///
/// The canonical value type is a closed enum, so "unsupported value kind"
/// cannot arise at this layer; what remains is option misconfiguration and
/// the nesting-depth cap.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("invalid encode options: {0}")]
    InvalidOptions(String),

    #[error("maximum nesting depth of {0} exceeded")]
    DepthLimit(usize),
}

/// Machine-distinguishable reason for a [`DecodeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErrorKind {
    InvalidOptions,
    Indentation,
    BlankLine,
    UnexpectedLine,
    InvalidHeader,
    LengthMismatch,
    InvalidEscape,
    UnterminatedString,
    DuplicateKey,
    UnknownSymbol,
    DepthLimit,
}

/// 1-based position of a decode failure in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

/// A decode failure: reason code, message, and (when the failure originates
/// from a specific source line) its position and a snippet of that line.
///
/// Built at the failure site and never mutated afterwards; the parsing loops
/// attach position data before the error leaves the decoder.
#[derive(Debug, Clone)]
pub struct DecodeError {
    kind: DecodeErrorKind,
    message: String,
    location: Option<Location>,
    context: Option<String>,
}

impl DecodeError {
    pub(crate) fn new(kind: DecodeErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            location: None,
            context: None,
        }
    }

    pub(crate) fn invalid_options(message: impl Into<String>) -> Self {
        Self::new(DecodeErrorKind::InvalidOptions, message)
    }

    pub(crate) fn indentation(message: impl Into<String>) -> Self {
        Self::new(DecodeErrorKind::Indentation, message)
    }

    pub(crate) fn blank_line(message: impl Into<String>) -> Self {
        Self::new(DecodeErrorKind::BlankLine, message)
    }

    pub(crate) fn unexpected(message: impl Into<String>) -> Self {
        Self::new(DecodeErrorKind::UnexpectedLine, message)
    }

    pub(crate) fn header(message: impl Into<String>) -> Self {
        Self::new(DecodeErrorKind::InvalidHeader, message)
    }

    pub(crate) fn length_mismatch(message: impl Into<String>) -> Self {
        Self::new(DecodeErrorKind::LengthMismatch, message)
    }

    pub(crate) fn invalid_escape(message: impl Into<String>) -> Self {
        Self::new(DecodeErrorKind::InvalidEscape, message)
    }

    pub(crate) fn unterminated(message: impl Into<String>) -> Self {
        Self::new(DecodeErrorKind::UnterminatedString, message)
    }

    pub(crate) fn duplicate_key(key: &str) -> Self {
        Self::new(
            DecodeErrorKind::DuplicateKey,
            format!("duplicate key '{key}' in object"),
        )
    }

    pub(crate) fn unknown_symbol(key: &str) -> Self {
        Self::new(
            DecodeErrorKind::UnknownSymbol,
            format!("key '{key}' is not a registered symbol"),
        )
    }

    pub(crate) fn depth_limit(max: usize) -> Self {
        Self::new(
            DecodeErrorKind::DepthLimit,
            format!("maximum nesting depth of {max} exceeded"),
        )
    }

    /// Attach position and source context unless an inner failure already
    /// carries them.
    pub(crate) fn at(mut self, line: usize, column: usize, context: &str) -> Self {
        if self.location.is_none() {
            self.location = Some(Location { line, column });
            if !context.is_empty() {
                self.context = Some(context.to_string());
            }
        }
        self
    }

    pub fn kind(&self) -> DecodeErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn location(&self) -> Option<Location> {
        self.location
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(location) = self.location {
            write!(f, " at line {}, column {}", location.line, location.column)?;
        }
        if let Some(context) = &self.context {
            write!(f, ": `{context}`")?;
        }
        Ok(())
    }
}

impl std::error::Error for DecodeError {}
