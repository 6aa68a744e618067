//! # cogsl
//!
//! Lexical front-end for CogSL, the Cognitive Systems Language: a description language
//! whose form sits between natural language and programming languages.
//!
//! The crate consumes a byte stream incrementally and emits an ordered stream of token
//! spans over a growing buffer, so analysis starts before the whole document is read.
//! See [`cogsl::lexing`] for the pipeline.
//!
//! ## Testing
//!
//! Shared test helpers and curated sample documents live in the
//! [testing module](cogsl::testing).

pub mod cogsl;

pub use cogsl::lexing::{spawn_tokenizer, tokenize_bytes, LexError, Tokenizer, TokenizerConfig};
pub use cogsl::token::{LexicalClass, Token};
