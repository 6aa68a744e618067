//! Token definitions for the cogsl lexer
//!
//! A token never owns text. It names a half-open byte range `start..stop` into the
//! tokenizer's buffer plus the lexical class of every byte in that range. Text is
//! resolved afterwards against the finished buffer, see
//! [`GrowableBuffer::text`](crate::cogsl::lexing::GrowableBuffer::text).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// The closed set of lexical classes a byte (or run of bytes) can belong to.
///
/// The discriminants are the kind codes used in diagnostic output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LexicalClass {
    /// An invalid escape sequence terminator
    Undefined = 0,
    /// Zero-length marker opening every token stream
    StartOfDocument = 1,
    /// Zero-length marker closing every successful token stream
    EndOfDocument = 2,
    /// A run of blank characters, excluding unescaped newlines
    Whitespace = 3,
    /// An unescaped newline
    LineBreak = 4,
    /// A run of non-blank characters, including escaped newlines and backslashes
    Word = 5,
}

impl LexicalClass {
    /// Numeric kind code, as printed by the `token-simple` format.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Diagnostic name of the class.
    pub fn name(self) -> &'static str {
        match self {
            LexicalClass::Undefined => "UNDEFINED",
            LexicalClass::StartOfDocument => "START_OF_DOC",
            LexicalClass::EndOfDocument => "END_OF_DOC",
            LexicalClass::Whitespace => "WHITESPACE",
            LexicalClass::LineBreak => "LINE_BREAK",
            LexicalClass::Word => "WORD",
        }
    }

    /// Check if this class is one of the zero-length document markers
    pub fn is_boundary(self) -> bool {
        matches!(
            self,
            LexicalClass::StartOfDocument | LexicalClass::EndOfDocument
        )
    }
}

impl fmt::Display for LexicalClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A span of the tokenizer buffer tagged with its lexical class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub start: usize,
    pub stop: usize,
    pub kind: LexicalClass,
}

impl Token {
    pub fn new(start: usize, stop: usize, kind: LexicalClass) -> Self {
        debug_assert!(start <= stop, "token span is inverted: {start}..{stop}");
        Self { start, stop, kind }
    }

    /// A zero-length marker token at `offset`.
    pub fn marker(offset: usize, kind: LexicalClass) -> Self {
        Self::new(offset, offset, kind)
    }

    pub fn span(&self) -> Range<usize> {
        self.start..self.stop
    }

    pub fn len(&self) -> usize {
        self.stop - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.stop
    }
}

/// Renders `KIND<code> @ [start:stop]`.
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}<{}> @ [{}:{}]",
            self.kind,
            self.kind.code(),
            self.start,
            self.stop
        )
    }
}
