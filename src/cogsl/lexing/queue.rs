//! Token queue between the producer and its consumer
//!
//! The producer runs the [`Tokenizer`] on a blocking worker thread and pushes tokens
//! into a tokio `mpsc` channel; the consumer pulls them in emission order, from async
//! code with [`TokenReceiver::recv`] or from a plain thread with
//! [`TokenReceiver::blocking_recv`].
//!
//! A capacity of zero selects an unbounded channel. Any other capacity bounds the
//! channel and blocks the producer while it is full.
//!
//! The buffer stays with the producer until its task completes;
//! [`TokenizeHandle::finish`] hands it over. Only then is it safe to resolve token
//! offsets to text.

use super::buffer::GrowableBuffer;
use super::common::{LexError, LexResult, TokenSink};
use super::source::ByteSource;
use super::tokenizer::{CancelFlag, Tokenizer};
use crate::cogsl::token::Token;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Producer side of the token queue.
///
/// Pushing blocks the calling thread on a full bounded queue, so it must not be used
/// from inside an async task.
#[derive(Debug)]
pub enum TokenSender {
    Bounded(mpsc::Sender<Token>),
    Unbounded(mpsc::UnboundedSender<Token>),
    Closed,
}

/// Consumer side of the token queue.
#[derive(Debug)]
pub enum TokenReceiver {
    Bounded(mpsc::Receiver<Token>),
    Unbounded(mpsc::UnboundedReceiver<Token>),
}

/// Create a token queue; `capacity == 0` means unbounded.
pub fn token_queue(capacity: usize) -> (TokenSender, TokenReceiver) {
    if capacity == 0 {
        let (tx, rx) = mpsc::unbounded_channel();
        (TokenSender::Unbounded(tx), TokenReceiver::Unbounded(rx))
    } else {
        let (tx, rx) = mpsc::channel(capacity);
        (TokenSender::Bounded(tx), TokenReceiver::Bounded(rx))
    }
}

impl TokenSink for TokenSender {
    fn push(&mut self, token: Token) -> LexResult<()> {
        match self {
            TokenSender::Bounded(tx) => tx.blocking_send(token).map_err(|_| LexError::SinkClosed),
            TokenSender::Unbounded(tx) => tx.send(token).map_err(|_| LexError::SinkClosed),
            TokenSender::Closed => Err(LexError::SinkClosed),
        }
    }

    fn is_closed(&self) -> bool {
        match self {
            TokenSender::Bounded(tx) => tx.is_closed(),
            TokenSender::Unbounded(tx) => tx.is_closed(),
            TokenSender::Closed => true,
        }
    }

    fn close(&mut self) {
        *self = TokenSender::Closed;
    }
}

impl TokenReceiver {
    /// Next token, or `None` once the producer has closed the queue.
    pub async fn recv(&mut self) -> Option<Token> {
        match self {
            TokenReceiver::Bounded(rx) => rx.recv().await,
            TokenReceiver::Unbounded(rx) => rx.recv().await,
        }
    }

    /// Blocking variant of [`recv`](Self::recv) for consumers outside async code.
    pub fn blocking_recv(&mut self) -> Option<Token> {
        match self {
            TokenReceiver::Bounded(rx) => rx.blocking_recv(),
            TokenReceiver::Unbounded(rx) => rx.blocking_recv(),
        }
    }

    /// Stop accepting tokens. The producer notices before its next chunk.
    ///
    /// Tokens already queued can still be received.
    pub fn close(&mut self) {
        match self {
            TokenReceiver::Bounded(rx) => rx.close(),
            TokenReceiver::Unbounded(rx) => rx.close(),
        }
    }
}

/// A running tokenization: the token stream plus the producer task.
#[derive(Debug)]
pub struct TokenizeHandle {
    tokens: TokenReceiver,
    cancel: CancelFlag,
    task: JoinHandle<LexResult<GrowableBuffer>>,
}

/// Run `tokenizer` over `source` on a blocking worker thread.
///
/// Must be called from within a tokio runtime.
pub fn spawn_tokenizer<S>(tokenizer: Tokenizer, source: S, queue_capacity: usize) -> TokenizeHandle
where
    S: ByteSource + Send + 'static,
{
    let (mut sender, tokens) = token_queue(queue_capacity);
    let cancel = tokenizer.cancel_flag();
    let mut tokenizer = tokenizer;

    tracing::debug!(queue_capacity, "spawning tokenizer task");
    let task = tokio::task::spawn_blocking(move || tokenizer.tokenize(source, &mut sender));

    TokenizeHandle {
        tokens,
        cancel,
        task,
    }
}

impl TokenizeHandle {
    pub async fn recv(&mut self) -> Option<Token> {
        self.tokens.recv().await
    }

    pub fn tokens(&mut self) -> &mut TokenReceiver {
        &mut self.tokens
    }

    /// Ask the producer to stop before reading its next chunk.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Stop consuming and wait for the producer, returning the filled buffer.
    ///
    /// Tokens left in the queue are discarded. If the producer had not finished yet,
    /// it observes the closed queue and fails with [`LexError::SinkClosed`].
    pub async fn finish(self) -> LexResult<GrowableBuffer> {
        let TokenizeHandle { tokens, task, .. } = self;
        drop(tokens);
        match task.await {
            Ok(result) => result,
            Err(err) => Err(LexError::ProducerFailed(err.to_string())),
        }
    }

    /// Drain every token, then wait for the producer.
    pub async fn collect(mut self) -> LexResult<(Vec<Token>, GrowableBuffer)> {
        let mut collected = Vec::new();
        while let Some(token) = self.tokens.recv().await {
            collected.push(token);
        }
        let buffer = self.finish().await?;
        Ok((collected, buffer))
    }
}
