//! Testing utilities for the cogsl tokenizer
//!
//! - [`ScriptedSource`]: a byte source that replays a fixed script of reads, empty
//!   reads, and failures, for exercising the driver's retry and error paths.
//! - [`check_token_stream`]: verifies the structural guarantees every token stream
//!   must meet (boundary markers, contiguous coverage, run collapsing, one-byte
//!   line breaks under `Separate`).
//! - [`render_tokens`]: a stable, human-readable rendering used by snapshot tests.
//! - [`read_sample`]: loads a curated sample document from `samples/`.
//!
//! Prefer the curated samples over ad-hoc strings when a test is about realistic
//! documents; ad-hoc strings are fine for edge cases.

use crate::cogsl::lexing::{ByteSource, GrowableBuffer, LineBreakPolicy, ReadOutcome};
use crate::cogsl::token::{LexicalClass, Token};
use std::collections::VecDeque;
use std::fmt::Write as _;
use std::io;
use std::path::PathBuf;

/// One step of a [`ScriptedSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedRead {
    /// Deliver these bytes, split across reads if the chunk is smaller
    Bytes(Vec<u8>),
    /// A zero-byte read that is not end-of-stream
    Empty,
    /// Fail with an I/O error of this kind
    Fail(io::ErrorKind),
}

/// Replays a script, then reports end-of-stream forever.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    script: VecDeque<ScriptedRead>,
    reads: usize,
}

impl ScriptedSource {
    pub fn new(script: impl IntoIterator<Item = ScriptedRead>) -> Self {
        Self {
            script: script.into_iter().collect(),
            reads: 0,
        }
    }

    /// Deliver `bytes` in pieces of at most `piece` bytes.
    pub fn chunked(bytes: &[u8], piece: usize) -> Self {
        Self::new(
            bytes
                .chunks(piece.max(1))
                .map(|chunk| ScriptedRead::Bytes(chunk.to_vec())),
        )
    }

    /// Number of `read_chunk` calls made so far.
    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl ByteSource for ScriptedSource {
    fn read_chunk(&mut self, chunk: &mut [u8]) -> io::Result<ReadOutcome> {
        self.reads += 1;
        match self.script.pop_front() {
            None => Ok(ReadOutcome::EndOfStream),
            Some(ScriptedRead::Empty) => Ok(ReadOutcome::Data(0)),
            Some(ScriptedRead::Fail(kind)) => Err(io::Error::new(kind, "scripted failure")),
            Some(ScriptedRead::Bytes(mut bytes)) => {
                let n = bytes.len().min(chunk.len());
                chunk[..n].copy_from_slice(&bytes[..n]);
                if n < bytes.len() {
                    self.script
                        .push_front(ScriptedRead::Bytes(bytes.split_off(n)));
                }
                Ok(ReadOutcome::Data(n))
            }
        }
    }
}

/// Check the structural guarantees of a complete token stream over `final_len` bytes.
///
/// Returns a description of the first violation found.
pub fn check_token_stream(
    tokens: &[Token],
    final_len: usize,
    policy: LineBreakPolicy,
) -> Result<(), String> {
    let (first, last) = match (tokens.first(), tokens.last()) {
        (Some(first), Some(last)) if tokens.len() >= 2 => (first, last),
        _ => return Err(format!("expected at least 2 tokens, got {}", tokens.len())),
    };

    if *first != Token::marker(0, LexicalClass::StartOfDocument) {
        return Err(format!("stream starts with {first}"));
    }
    if *last != Token::marker(final_len, LexicalClass::EndOfDocument) {
        return Err(format!("stream ends with {last}, expected length {final_len}"));
    }

    let body = &tokens[1..tokens.len() - 1];
    let mut covered = 0;
    for token in body {
        if token.kind.is_boundary() {
            return Err(format!("boundary marker inside the stream: {token}"));
        }
        if token.start != covered {
            return Err(format!("{token} does not start at {covered}"));
        }
        if token.is_empty() {
            return Err(format!("empty token {token}"));
        }
        if token.kind == LexicalClass::LineBreak
            && policy == LineBreakPolicy::Separate
            && token.len() != 1
        {
            return Err(format!("line break spans more than one newline: {token}"));
        }
        covered = token.stop;
    }
    if covered != final_len {
        return Err(format!("tokens cover {covered} of {final_len} bytes"));
    }

    for pair in body.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if a.kind != b.kind {
            continue;
        }
        let separate_breaks =
            a.kind == LexicalClass::LineBreak && policy == LineBreakPolicy::Separate;
        if !separate_breaks {
            return Err(format!("adjacent tokens share a class: {a}, {b}"));
        }
    }
    Ok(())
}

/// Render one token per line with its text, e.g. `WORD<5> @ [0:2] "go"`.
pub fn render_tokens(tokens: &[Token], buffer: &GrowableBuffer) -> String {
    let mut out = String::new();
    for token in tokens {
        if token.is_empty() {
            let _ = writeln!(out, "{token}");
        } else {
            let _ = writeln!(out, "{token} {:?}", buffer.text(token));
        }
    }
    out
}

pub fn sample_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("samples")
        .join(name)
}

/// Load a curated sample document.
pub fn read_sample(name: &str) -> io::Result<Vec<u8>> {
    std::fs::read(sample_path(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use LexicalClass::*;

    #[test]
    fn test_scripted_source_splits_large_reads() {
        let mut source = ScriptedSource::new([ScriptedRead::Bytes(b"abcdef".to_vec())]);
        let mut chunk = [0u8; 4];
        assert_eq!(source.read_chunk(&mut chunk).unwrap(), ReadOutcome::Data(4));
        assert_eq!(source.read_chunk(&mut chunk).unwrap(), ReadOutcome::Data(2));
        assert_eq!(&chunk[..2], b"ef");
        assert_eq!(
            source.read_chunk(&mut chunk).unwrap(),
            ReadOutcome::EndOfStream
        );
        assert_eq!(source.reads(), 3);
    }

    #[test]
    fn test_check_accepts_valid_stream() {
        let tokens = [
            Token::new(0, 0, StartOfDocument),
            Token::new(0, 2, Word),
            Token::new(2, 3, LineBreak),
            Token::new(3, 4, LineBreak),
            Token::new(4, 4, EndOfDocument),
        ];
        assert_eq!(
            check_token_stream(&tokens, 4, LineBreakPolicy::Separate),
            Ok(())
        );
        assert!(check_token_stream(&tokens, 4, LineBreakPolicy::Merge).is_err());
    }

    #[test]
    fn test_check_rejects_gap() {
        let tokens = [
            Token::new(0, 0, StartOfDocument),
            Token::new(0, 2, Word),
            Token::new(3, 4, Whitespace),
            Token::new(4, 4, EndOfDocument),
        ];
        let err = check_token_stream(&tokens, 4, LineBreakPolicy::Separate).unwrap_err();
        assert!(err.contains("does not start at 2"), "{err}");
    }

    #[test]
    fn test_check_rejects_wide_separate_line_break() {
        let tokens = [
            Token::new(0, 0, StartOfDocument),
            Token::new(0, 1, Word),
            Token::new(1, 3, LineBreak),
            Token::new(3, 3, EndOfDocument),
        ];
        let err = check_token_stream(&tokens, 3, LineBreakPolicy::Separate).unwrap_err();
        assert!(err.contains("more than one newline"), "{err}");
        assert_eq!(check_token_stream(&tokens, 3, LineBreakPolicy::Merge), Ok(()));
    }

    #[test]
    fn test_render() {
        let mut buffer = GrowableBuffer::new(0, 4, 1, 16);
        buffer.append(b"hi\n").unwrap();
        let tokens = [
            Token::new(0, 0, StartOfDocument),
            Token::new(0, 2, Word),
            Token::new(2, 3, LineBreak),
            Token::new(3, 3, EndOfDocument),
        ];
        assert_eq!(
            render_tokens(&tokens, &buffer),
            "START_OF_DOC<1> @ [0:0]\nWORD<5> @ [0:2] \"hi\"\nLINE_BREAK<4> @ [2:3] \"\\n\"\nEND_OF_DOC<2> @ [3:3]\n"
        );
    }
}
