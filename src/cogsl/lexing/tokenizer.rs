//! Stream driver
//!
//! The [`Tokenizer`] pulls fixed-size chunks from a [`ByteSource`], commits each chunk
//! to its [`GrowableBuffer`], and runs every new byte through the classifier and the
//! emitter in order. Classifier and emitter state outlive individual chunks, so the
//! token stream does not depend on how the source happens to split its data.
//!
//! Termination:
//!
//!     end-of-stream    -> flush the open run, emit EndOfDocument, close the sink
//!     any fatal error  -> drop the open run, close the sink, return the error
//!
//! A tokenizer owns one buffer and gives it up to the first run. Running it again
//! fails with [`LexError::BufferUninitialized`].

use super::buffer::GrowableBuffer;
use super::classifier::{Classification, Classifier};
use super::common::{LexError, LexResult, TokenSink};
use super::emitter::{Emitter, LineBreakPolicy};
use super::source::{ByteSource, ReadOutcome, SliceSource};
use crate::cogsl::token::Token;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How the driver treats reads that return no bytes and no end-of-stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadPolicy {
    /// Consecutive empty reads tolerated before giving up; `None` retries forever.
    pub max_empty_reads: Option<u32>,
    /// Longest stretch of consecutive empty reads; `None` waits forever.
    pub timeout: Option<Duration>,
    /// Pause between empty reads.
    pub backoff: Duration,
}

impl Default for ReadPolicy {
    fn default() -> Self {
        Self {
            max_empty_reads: Some(1024),
            timeout: None,
            backoff: Duration::from_millis(1),
        }
    }
}

/// Runtime configuration of a single tokenization run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizerConfig {
    /// Bytes requested from the source per read
    pub chunk_size: usize,
    /// Buffer grows by `growth_factor × chunk_size`; values below 1 count as 1
    pub growth_factor: usize,
    /// Bytes reserved before the first read
    pub initial_capacity: usize,
    /// Hard ceiling on the buffer size
    pub max_buffer_size: usize,
    pub line_breaks: LineBreakPolicy,
    pub read_policy: ReadPolicy,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 4 * 1024,
            growth_factor: 4,
            initial_capacity: 10 * 1024 * 1024,
            max_buffer_size: 100 * 1024 * 1024,
            line_breaks: LineBreakPolicy::Separate,
            read_policy: ReadPolicy::default(),
        }
    }
}

impl TokenizerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    pub fn growth_factor(mut self, factor: usize) -> Self {
        self.growth_factor = factor;
        self
    }

    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    pub fn max_buffer_size(mut self, size: usize) -> Self {
        self.max_buffer_size = size;
        self
    }

    pub fn line_breaks(mut self, policy: LineBreakPolicy) -> Self {
        self.line_breaks = policy;
        self
    }

    pub fn read_policy(mut self, policy: ReadPolicy) -> Self {
        self.read_policy = policy;
        self
    }

    pub fn validate(&self) -> LexResult<()> {
        if self.chunk_size == 0 {
            return Err(LexError::InvalidConfig(
                "chunk_size must be at least 1".to_string(),
            ));
        }
        if self.max_buffer_size == 0 {
            return Err(LexError::InvalidConfig(
                "max_buffer_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Shared cancellation switch, checked by the driver between chunks.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct Tokenizer {
    config: TokenizerConfig,
    buffer: Option<GrowableBuffer>,
    cancel: CancelFlag,
}

impl Tokenizer {
    /// Create a tokenizer with a freshly allocated buffer.
    pub fn new(config: TokenizerConfig) -> Self {
        let buffer = GrowableBuffer::new(
            config.initial_capacity,
            config.chunk_size,
            config.growth_factor,
            config.max_buffer_size,
        );
        Self {
            config,
            buffer: Some(buffer),
            cancel: CancelFlag::new(),
        }
    }

    /// Share an existing cancellation flag with this tokenizer.
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// The buffer waiting for a run, if it has not been consumed yet.
    pub fn buffer(&self) -> Option<&GrowableBuffer> {
        self.buffer.as_ref()
    }

    /// Tokenize `source` into `sink`, returning the filled buffer.
    ///
    /// The sink is closed when this returns, whether the run succeeded or not.
    pub fn tokenize<S, K>(&mut self, mut source: S, sink: &mut K) -> LexResult<GrowableBuffer>
    where
        S: ByteSource,
        K: TokenSink + ?Sized,
    {
        if let Err(err) = self.config.validate() {
            sink.close();
            return Err(err);
        }
        let Some(mut buffer) = self.buffer.take() else {
            sink.close();
            return Err(LexError::BufferUninitialized);
        };

        tracing::debug!(
            chunk_size = self.config.chunk_size,
            growth_factor = self.config.growth_factor,
            max_buffer_size = self.config.max_buffer_size,
            line_breaks = ?self.config.line_breaks,
            "starting tokenization"
        );

        let mut emitter = Emitter::new(self.config.line_breaks);
        let result = self.drive(&mut buffer, &mut source, &mut emitter, sink);
        sink.close();

        match result {
            Ok(()) => {
                tracing::debug!(
                    tokens = emitter.emitted(),
                    bytes = buffer.len(),
                    "tokenization finished"
                );
                Ok(buffer)
            }
            Err(err) => {
                emitter.abandon();
                match err {
                    LexError::Cancelled | LexError::SinkClosed => {
                        tracing::warn!(bytes = buffer.len(), "tokenization stopped: {err}")
                    }
                    _ => tracing::error!(bytes = buffer.len(), "tokenization failed: {err}"),
                }
                Err(err)
            }
        }
    }

    fn drive<S, K>(
        &self,
        buffer: &mut GrowableBuffer,
        source: &mut S,
        emitter: &mut Emitter,
        sink: &mut K,
    ) -> LexResult<()>
    where
        S: ByteSource,
        K: TokenSink + ?Sized,
    {
        let mut classifier = Classifier::new();
        let mut chunk = vec![0u8; self.config.chunk_size];
        let mut empty_reads = EmptyReads::new(&self.config.read_policy);

        emitter.start(sink)?;

        loop {
            if self.cancel.is_cancelled() {
                return Err(LexError::Cancelled);
            }
            if sink.is_closed() {
                return Err(LexError::SinkClosed);
            }

            let n = match source.read_chunk(&mut chunk) {
                Ok(ReadOutcome::EndOfStream) => {
                    if classifier.in_escape() {
                        tracing::debug!(offset = buffer.len() - 1, "dangling escape at end of input");
                    }
                    return emitter.finish(buffer.len(), sink);
                }
                Ok(ReadOutcome::Data(0)) => {
                    empty_reads.record()?;
                    continue;
                }
                Ok(ReadOutcome::Data(n)) if n > chunk.len() => {
                    return Err(LexError::SourceRead(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("source reported {n} bytes for a {} byte chunk", chunk.len()),
                    )));
                }
                Ok(ReadOutcome::Data(n)) => n,
                Err(err) => return Err(LexError::SourceRead(err)),
            };
            empty_reads.reset();
            tracing::trace!(bytes = n, buffered = buffer.len(), "read chunk");

            let offset = buffer.append(&chunk[..n])?;
            for (i, &byte) in chunk[..n].iter().enumerate() {
                match classifier.classify(byte) {
                    Classification::Resolved(kind) => emitter.observe(kind, offset + i, sink)?,
                    Classification::Pending => emitter.observe_escape(offset + i, sink)?,
                }
            }
        }
    }
}

/// Bookkeeping for consecutive empty reads.
struct EmptyReads<'a> {
    policy: &'a ReadPolicy,
    count: u32,
    since: Option<Instant>,
}

impl<'a> EmptyReads<'a> {
    fn new(policy: &'a ReadPolicy) -> Self {
        Self {
            policy,
            count: 0,
            since: None,
        }
    }

    fn record(&mut self) -> LexResult<()> {
        self.count = self.count.saturating_add(1);
        let since = *self.since.get_or_insert_with(Instant::now);

        if let Some(max) = self.policy.max_empty_reads {
            if self.count > max {
                return Err(LexError::SourceStalled {
                    attempts: self.count,
                });
            }
        }
        if let Some(timeout) = self.policy.timeout {
            let waited = since.elapsed();
            if waited >= timeout {
                return Err(LexError::ReadTimeout { waited });
            }
        }

        tracing::trace!(attempt = self.count, "empty read, retrying");
        if !self.policy.backoff.is_zero() {
            std::thread::sleep(self.policy.backoff);
        }
        Ok(())
    }

    fn reset(&mut self) {
        if self.count > 0 {
            tracing::warn!(attempts = self.count, "source recovered after empty reads");
        }
        self.count = 0;
        self.since = None;
    }
}

/// Tokenize an in-memory byte slice in one call.
pub fn tokenize_bytes(
    bytes: &[u8],
    config: TokenizerConfig,
) -> LexResult<(Vec<Token>, GrowableBuffer)> {
    let mut tokens = Vec::new();
    let buffer = Tokenizer::new(config).tokenize(SliceSource::new(bytes), &mut tokens)?;
    Ok((tokens, buffer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cogsl::testing::{ScriptedRead, ScriptedSource};
    use crate::cogsl::token::LexicalClass::*;

    fn small() -> TokenizerConfig {
        TokenizerConfig::new()
            .chunk_size(4)
            .growth_factor(1)
            .initial_capacity(0)
            .max_buffer_size(1024)
    }

    #[test]
    fn test_go_run() {
        let (tokens, buffer) = tokenize_bytes(b"go  run", small()).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::new(0, 0, StartOfDocument),
                Token::new(0, 2, Word),
                Token::new(2, 4, Whitespace),
                Token::new(4, 7, Word),
                Token::new(7, 7, EndOfDocument),
            ]
        );
        assert_eq!(buffer.text(&tokens[3]), "run");
    }

    #[test]
    fn test_escaped_newline_folds_into_word() {
        let (tokens, _) = tokenize_bytes(b"a\\\nb", small()).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::new(0, 0, StartOfDocument),
                Token::new(0, 4, Word),
                Token::new(4, 4, EndOfDocument),
            ]
        );
    }

    #[test]
    fn test_invalid_escape_after_word() {
        let (tokens, _) = tokenize_bytes(b"a\\x", small()).unwrap();
        assert_eq!(tokens[1], Token::new(0, 2, Word));
        assert_eq!(tokens[2], Token::new(2, 3, Undefined));
    }

    #[test]
    fn test_leading_invalid_escape() {
        let (tokens, _) = tokenize_bytes(b"\\x", small()).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::new(0, 0, StartOfDocument),
                Token::new(0, 2, Undefined),
                Token::new(2, 2, EndOfDocument),
            ]
        );
    }

    #[test]
    fn test_escape_across_chunk_boundary() {
        // The backslash is the last byte of the first chunk
        let (tokens, _) = tokenize_bytes(b"abc\\\nde", small()).unwrap();
        assert_eq!(tokens[1], Token::new(0, 7, Word));
        assert_eq!(tokens.len(), 3);
    }

    #[test]
    fn test_escape_after_newline_splits_at_chunk_edge() {
        let source = ScriptedSource::chunked(b"a\n\\\nb", 3);
        let mut tokens = Vec::new();
        Tokenizer::new(small()).tokenize(source, &mut tokens).unwrap();
        assert_eq!(
            tokens[1..4],
            [
                Token::new(0, 1, Word),
                Token::new(1, 2, LineBreak),
                Token::new(2, 5, Word),
            ]
        );
    }

    #[test]
    fn test_capacity_boundary() {
        let config = TokenizerConfig::new()
            .chunk_size(4)
            .growth_factor(1)
            .max_buffer_size(8);

        let (tokens, buffer) = tokenize_bytes(b"abcdefgh", config.clone()).unwrap();
        assert_eq!(buffer.len(), 8);
        assert_eq!(tokens.last(), Some(&Token::new(8, 8, EndOfDocument)));

        let err = tokenize_bytes(b"abcdefghi", config).unwrap_err();
        assert!(matches!(
            err,
            LexError::CapacityExceeded {
                requested: 9,
                max: 8
            }
        ));
    }

    #[test]
    fn test_buffer_is_single_use() {
        let mut tokenizer = Tokenizer::new(small());
        let mut tokens = Vec::new();
        tokenizer
            .tokenize(SliceSource::new(b"one"), &mut tokens)
            .unwrap();
        assert!(tokenizer.buffer().is_none());

        let err = tokenizer
            .tokenize(SliceSource::new(b"two"), &mut tokens)
            .unwrap_err();
        assert!(matches!(err, LexError::BufferUninitialized));
    }

    #[test]
    fn test_rejects_zero_chunk_size() {
        let err = tokenize_bytes(b"abc", small().chunk_size(0)).unwrap_err();
        assert!(matches!(err, LexError::InvalidConfig(_)));
    }

    #[test]
    fn test_source_error_drops_open_run() {
        let source = ScriptedSource::new([
            ScriptedRead::Bytes(b"ab ".to_vec()),
            ScriptedRead::Bytes(b"cd".to_vec()),
            ScriptedRead::Fail(io::ErrorKind::ConnectionReset),
        ]);
        let mut tokens = Vec::new();
        let err = Tokenizer::new(small())
            .tokenize(source, &mut tokens)
            .unwrap_err();

        assert!(matches!(err, LexError::SourceRead(_)));
        // The trailing "cd" run was never closed
        assert_eq!(
            tokens,
            vec![
                Token::new(0, 0, StartOfDocument),
                Token::new(0, 2, Word),
                Token::new(2, 3, Whitespace),
            ]
        );
    }

    #[test]
    fn test_empty_reads_are_retried() {
        let source = ScriptedSource::new([
            ScriptedRead::Empty,
            ScriptedRead::Bytes(b"hi".to_vec()),
            ScriptedRead::Empty,
            ScriptedRead::Empty,
        ]);
        let config = small().read_policy(ReadPolicy {
            max_empty_reads: Some(2),
            timeout: None,
            backoff: Duration::ZERO,
        });
        let mut tokens = Vec::new();
        Tokenizer::new(config).tokenize(source, &mut tokens).unwrap();
        assert_eq!(tokens[1], Token::new(0, 2, Word));
    }

    #[test]
    fn test_stalled_source() {
        let source = ScriptedSource::new(std::iter::repeat(ScriptedRead::Empty).take(10));
        let config = small().read_policy(ReadPolicy {
            max_empty_reads: Some(3),
            timeout: None,
            backoff: Duration::ZERO,
        });
        let mut tokens = Vec::new();
        let err = Tokenizer::new(config)
            .tokenize(source, &mut tokens)
            .unwrap_err();
        assert!(matches!(err, LexError::SourceStalled { attempts: 4 }));
    }

    #[test]
    fn test_read_timeout() {
        let source = ScriptedSource::new(std::iter::repeat(ScriptedRead::Empty).take(100));
        let config = small().read_policy(ReadPolicy {
            max_empty_reads: None,
            timeout: Some(Duration::from_millis(5)),
            backoff: Duration::from_millis(1),
        });
        let mut tokens = Vec::new();
        let err = Tokenizer::new(config)
            .tokenize(source, &mut tokens)
            .unwrap_err();
        assert!(matches!(err, LexError::ReadTimeout { .. }));
    }

    #[test]
    fn test_cancel_before_first_chunk() {
        let tokenizer = Tokenizer::new(small());
        let cancel = tokenizer.cancel_flag();
        cancel.cancel();

        let mut tokenizer = tokenizer;
        let mut tokens = Vec::new();
        let err = tokenizer
            .tokenize(SliceSource::new(b"never read"), &mut tokens)
            .unwrap_err();
        assert!(matches!(err, LexError::Cancelled));
        assert_eq!(tokens, vec![Token::new(0, 0, StartOfDocument)]);
    }

    #[test]
    fn test_oversized_read_is_rejected() {
        struct Liar;
        impl ByteSource for Liar {
            fn read_chunk(&mut self, chunk: &mut [u8]) -> io::Result<ReadOutcome> {
                Ok(ReadOutcome::Data(chunk.len() + 1))
            }
        }
        let mut tokens = Vec::new();
        let err = Tokenizer::new(small()).tokenize(Liar, &mut tokens).unwrap_err();
        assert!(matches!(err, LexError::SourceRead(_)));
    }
}
