//! Byte classification
//!
//! The classifier is the only stateful piece of per-byte analysis, and its state is a
//! single flag: whether the previous byte opened an escape sequence. The flag lives
//! in the [`Classifier`] value, so an escape opened at the very end of one chunk is
//! completed by the first byte of the next.
//!
//! Rules, in priority order:
//!
//!     not escaped, `\`          -> enter escape, no class yet
//!     not escaped, blank byte   -> LineBreak for `\n`, Whitespace otherwise
//!     not escaped, other byte   -> Word
//!     escaped, `\n`             -> Word (escaped newline is literal content)
//!     escaped, `\`              -> Word (escaped backslash is literal content)
//!     escaped, other byte       -> Undefined (no other escapes exist)

use crate::cogsl::token::LexicalClass;

pub const ESCAPE: u8 = b'\\';
pub const NEWLINE: u8 = b'\n';

/// Result of feeding one byte to the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// The byte opened an escape sequence; its class is decided by the next byte.
    Pending,
    /// The byte's class is known.
    Resolved(LexicalClass),
}

/// Blank bytes are the ASCII characters `char::is_whitespace` accepts.
///
/// Bytes above 0x7F belong to multi-byte UTF-8 sequences and are never blank.
pub fn is_blank(byte: u8) -> bool {
    byte.is_ascii() && char::from(byte).is_whitespace()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Classifier {
    escaped: bool,
}

impl Classifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the last byte opened an escape sequence that is still waiting for its
    /// terminating byte.
    pub fn in_escape(&self) -> bool {
        self.escaped
    }

    pub fn classify(&mut self, byte: u8) -> Classification {
        let (class, escaped) = classify_byte(byte, self.escaped);
        self.escaped = escaped;
        match class {
            Some(class) => Classification::Resolved(class),
            None => Classification::Pending,
        }
    }
}

/// Pure classification step: `(byte, escape state) -> (class, next escape state)`.
pub fn classify_byte(byte: u8, escaped: bool) -> (Option<LexicalClass>, bool) {
    if escaped {
        let class = match byte {
            NEWLINE | ESCAPE => LexicalClass::Word,
            _ => LexicalClass::Undefined,
        };
        return (Some(class), false);
    }

    match byte {
        ESCAPE => (None, true),
        NEWLINE => (Some(LexicalClass::LineBreak), false),
        b if is_blank(b) => (Some(LexicalClass::Whitespace), false),
        _ => (Some(LexicalClass::Word), false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(b'a', LexicalClass::Word)]
    #[case(b'.', LexicalClass::Word)]
    #[case(b' ', LexicalClass::Whitespace)]
    #[case(b'\t', LexicalClass::Whitespace)]
    #[case(b'\r', LexicalClass::Whitespace)]
    #[case(0x0B, LexicalClass::Whitespace)]
    #[case(0x0C, LexicalClass::Whitespace)]
    #[case(b'\n', LexicalClass::LineBreak)]
    #[case(0xC3, LexicalClass::Word)]
    #[case(0xA0, LexicalClass::Word)]
    #[case(0x85, LexicalClass::Word)]
    fn test_unescaped_bytes(#[case] byte: u8, #[case] expected: LexicalClass) {
        assert_eq!(classify_byte(byte, false), (Some(expected), false));
    }

    #[rstest]
    #[case(b'\n', LexicalClass::Word)]
    #[case(b'\\', LexicalClass::Word)]
    #[case(b'x', LexicalClass::Undefined)]
    #[case(b' ', LexicalClass::Undefined)]
    #[case(b'n', LexicalClass::Undefined)]
    fn test_escaped_bytes(#[case] byte: u8, #[case] expected: LexicalClass) {
        assert_eq!(classify_byte(byte, true), (Some(expected), false));
    }

    #[test]
    fn test_backslash_opens_escape() {
        assert_eq!(classify_byte(b'\\', false), (None, true));
    }

    #[test]
    fn test_escape_state_carries_between_calls() {
        let mut classifier = Classifier::new();
        assert_eq!(classifier.classify(b'\\'), Classification::Pending);
        assert!(classifier.in_escape());
        assert_eq!(
            classifier.classify(b'\n'),
            Classification::Resolved(LexicalClass::Word)
        );
        assert!(!classifier.in_escape());
        assert_eq!(
            classifier.classify(b'\n'),
            Classification::Resolved(LexicalClass::LineBreak)
        );
    }

    #[test]
    fn test_double_backslash_is_literal() {
        let mut classifier = Classifier::new();
        assert_eq!(classifier.classify(b'\\'), Classification::Pending);
        assert_eq!(
            classifier.classify(b'\\'),
            Classification::Resolved(LexicalClass::Word)
        );
        // A third backslash opens a fresh escape
        assert_eq!(classifier.classify(b'\\'), Classification::Pending);
    }
}
