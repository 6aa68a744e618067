//! Common lexer module
//!
//! Shared error types and the sink interface every token consumer implements.

use crate::cogsl::token::Token;
use std::io;
use std::time::Duration;

pub type LexResult<T> = Result<T, LexError>;

/// Errors raised by the growable buffer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BufferError {
    #[error("buffer would need {requested} bytes, exceeding the maximum size of {max}")]
    CapacityExceeded { requested: usize, max: usize },
}

/// Errors that end a tokenization run.
///
/// Every variant is terminal: the open run is dropped and the token queue is closed.
#[derive(Debug, thiserror::Error)]
pub enum LexError {
    #[error("the tokenizer's buffer was not initialized")]
    BufferUninitialized,

    #[error("the tokenizer's buffer has reached the maximum size of {max} (needed {requested})")]
    CapacityExceeded { requested: usize, max: usize },

    #[error("failed to read from source: {0}")]
    SourceRead(#[source] io::Error),

    #[error("token sink closed before tokenization finished")]
    SinkClosed,

    #[error("source returned {attempts} consecutive empty reads")]
    SourceStalled { attempts: u32 },

    #[error("source produced no data for {waited:?}")]
    ReadTimeout { waited: Duration },

    #[error("tokenization was cancelled")]
    Cancelled,

    #[error("invalid tokenizer configuration: {0}")]
    InvalidConfig(String),

    #[error("tokenizer task failed: {0}")]
    ProducerFailed(String),
}

impl From<BufferError> for LexError {
    fn from(err: BufferError) -> Self {
        match err {
            BufferError::CapacityExceeded { requested, max } => {
                LexError::CapacityExceeded { requested, max }
            }
        }
    }
}

/// Receiving end of the emitter.
///
/// Implemented by the queue sender for concurrent consumers and by `Vec<Token>`
/// for collecting a whole run in place.
pub trait TokenSink {
    /// Deliver one token. Fails with [`LexError::SinkClosed`] once the consumer is gone.
    fn push(&mut self, token: Token) -> LexResult<()>;

    /// Whether the consumer has stopped listening.
    fn is_closed(&self) -> bool {
        false
    }

    /// Signal that no more tokens will arrive.
    fn close(&mut self) {}
}

impl TokenSink for Vec<Token> {
    fn push(&mut self, token: Token) -> LexResult<()> {
        Vec::push(self, token);
        Ok(())
    }
}

impl<S: TokenSink + ?Sized> TokenSink for &mut S {
    fn push(&mut self, token: Token) -> LexResult<()> {
        (**self).push(token)
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }

    fn close(&mut self) {
        (**self).close()
    }
}
