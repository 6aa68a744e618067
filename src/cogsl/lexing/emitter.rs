//! Edge-triggered span emission
//!
//! The emitter keeps exactly one open run: the class being accumulated and the offset
//! where it began. Each resolved classification is compared against that run; a
//! change of class closes the run as a token ending at the current offset and opens a
//! new one there. Runs of any length collapse into one token this way.
//!
//! Invariant: an open run always starts where the last emitted token stopped, so the
//! emitted spans tile the buffer without gaps or overlap.
//!
//! Adjacent newlines are governed by [`LineBreakPolicy`]. Under `Separate` every
//! newline is forced into its own one-byte token even though the class does not change.
//!
//! An escape byte has no class of its own. It stays in the open run, except that a
//! `LineBreak` run only ever holds newlines: an escape closes it, and the byte that
//! completes the escape opens the next run at the escape's offset.

use super::common::{LexResult, TokenSink};
use crate::cogsl::token::{LexicalClass, Token};
use serde::Deserialize;
use std::str::FromStr;

/// How consecutive unescaped newlines are tokenized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineBreakPolicy {
    /// Every newline is its own `LineBreak` token, so a blank line stays visible.
    #[default]
    Separate,
    /// Consecutive newlines collapse into one `LineBreak` token like any other run.
    Merge,
}

impl FromStr for LineBreakPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "separate" => Ok(LineBreakPolicy::Separate),
            "merge" => Ok(LineBreakPolicy::Merge),
            other => Err(format!(
                "unknown line break policy '{other}' (expected 'separate' or 'merge')"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenRun {
    kind: LexicalClass,
    start: usize,
}

#[derive(Debug, Clone)]
pub struct Emitter {
    policy: LineBreakPolicy,
    run: Option<OpenRun>,
    /// End of the last emitted token
    covered: usize,
    emitted: usize,
}

impl Emitter {
    pub fn new(policy: LineBreakPolicy) -> Self {
        Self {
            policy,
            run: None,
            covered: 0,
            emitted: 0,
        }
    }

    /// Emit the zero-length `StartOfDocument` marker.
    pub fn start<S: TokenSink + ?Sized>(&mut self, sink: &mut S) -> LexResult<()> {
        self.emit(Token::marker(0, LexicalClass::StartOfDocument), sink)
    }

    /// Feed the resolved class of the byte at `offset`.
    pub fn observe<S: TokenSink + ?Sized>(
        &mut self,
        kind: LexicalClass,
        offset: usize,
        sink: &mut S,
    ) -> LexResult<()> {
        let Some(run) = self.run else {
            // Bytes ahead of the first resolved class (a leading escape) join this run
            self.run = Some(OpenRun {
                kind,
                start: self.covered,
            });
            return Ok(());
        };

        let forced_break = kind == LexicalClass::LineBreak
            && run.kind == LexicalClass::LineBreak
            && self.policy == LineBreakPolicy::Separate;

        if kind != run.kind || forced_break {
            self.emit(Token::new(run.start, offset, run.kind), sink)?;
            self.covered = offset;
            self.run = Some(OpenRun {
                kind,
                start: offset,
            });
        }
        Ok(())
    }

    /// Note an escape byte at `offset` whose class is decided by the next byte.
    pub fn observe_escape<S: TokenSink + ?Sized>(
        &mut self,
        offset: usize,
        sink: &mut S,
    ) -> LexResult<()> {
        if let Some(run) = self.run {
            if run.kind == LexicalClass::LineBreak {
                self.emit(Token::new(run.start, offset, run.kind), sink)?;
                self.covered = offset;
                self.run = None;
            }
        }
        Ok(())
    }

    /// Flush the open run up to `final_len` and emit the `EndOfDocument` marker.
    ///
    /// Bytes past the last token with no open run can only be a dangling escape; they
    /// are flushed as `Undefined`.
    pub fn finish<S: TokenSink + ?Sized>(
        &mut self,
        final_len: usize,
        sink: &mut S,
    ) -> LexResult<()> {
        match self.run.take() {
            Some(run) => self.emit(Token::new(run.start, final_len, run.kind), sink)?,
            None if self.covered < final_len => self.emit(
                Token::new(self.covered, final_len, LexicalClass::Undefined),
                sink,
            )?,
            None => {}
        }
        self.covered = final_len;
        self.emit(Token::marker(final_len, LexicalClass::EndOfDocument), sink)
    }

    /// Drop the open run without emitting it.
    pub fn abandon(&mut self) {
        if let Some(run) = self.run.take() {
            tracing::debug!(kind = %run.kind, start = run.start, "abandoning open run");
        }
    }

    /// Class and start offset of the run currently being accumulated.
    pub fn open_run(&self) -> Option<(LexicalClass, usize)> {
        self.run.map(|run| (run.kind, run.start))
    }

    pub fn emitted(&self) -> usize {
        self.emitted
    }

    fn emit<S: TokenSink + ?Sized>(&mut self, token: Token, sink: &mut S) -> LexResult<()> {
        sink.push(token)?;
        self.emitted += 1;
        Ok(())
    }
}
