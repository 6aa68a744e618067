//! Lexer
//!
//! This module implements the streaming tokenizer for cogsl documents.
//!
//! Structure:
//!     A single producer reads the source in chunks and turns bytes into token spans.
//! Nothing is looked up twice and nothing is copied out of the buffer: tokens are
//! offsets, and text is resolved once the run is over.
//!
//! The pipeline consists of:
//! 1. Source adapter: pull fixed-size chunks from any [`ByteSource`] ./source.rs
//! 2. Growable buffer: append each chunk at stable offsets ./buffer.rs
//! 3. Classifier: byte -> lexical class, with the escape flag ./classifier.rs
//! 4. Emitter: edge-triggered run collapsing into spans ./emitter.rs
//! 5. Driver: the read loop, termination and error handling ./tokenizer.rs
//! 6. Queue: producer task and channel to the consumer ./queue.rs
//!
//! Escapes
//!
//!     A backslash escapes the byte after it. `\` + newline and `\\` are literal word
//!     content; any other escaped byte is `Undefined`. The backslash itself never
//!     starts or ends a run: the run boundary is decided by the byte that completes
//!     the escape.

pub mod buffer;
pub mod classifier;
pub mod common;
pub mod emitter;
pub mod queue;
pub mod source;
pub mod tokenizer;

pub use buffer::GrowableBuffer;
pub use classifier::{classify_byte, Classification, Classifier};
pub use common::{BufferError, LexError, LexResult, TokenSink};
pub use emitter::{Emitter, LineBreakPolicy};
pub use queue::{spawn_tokenizer, token_queue, TokenReceiver, TokenSender, TokenizeHandle};
pub use source::{ByteSource, ReadOutcome, ReaderSource, SliceSource};
pub use tokenizer::{tokenize_bytes, CancelFlag, ReadPolicy, Tokenizer, TokenizerConfig};
