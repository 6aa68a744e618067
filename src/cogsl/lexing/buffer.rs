//! Append-only byte buffer with bounded, stepwise growth
//!
//! Every byte the tokenizer reads lands here and stays here for the rest of the run.
//! Tokens refer to the buffer by offset, so growth may relocate the backing storage
//! freely: offsets issued before a growth step are still valid after it.
//!
//! Capacity is tracked explicitly rather than read back from the `Vec`, so the
//! configured ceiling is exact regardless of what the allocator hands out.

use super::common::BufferError;
use crate::cogsl::token::Token;
use std::borrow::Cow;
use std::ops::Range;

#[derive(Debug, Clone)]
pub struct GrowableBuffer {
    bytes: Vec<u8>,
    capacity: usize,
    growth_step: usize,
    max_size: usize,
}

impl GrowableBuffer {
    /// Create a buffer that starts with `initial_capacity` bytes reserved and grows
    /// `growth_factor × chunk_size` bytes at a time up to `max_size`.
    ///
    /// `growth_factor` is clamped to at least 1 and the initial reservation never
    /// exceeds `max_size`.
    pub fn new(
        initial_capacity: usize,
        chunk_size: usize,
        growth_factor: usize,
        max_size: usize,
    ) -> Self {
        let capacity = initial_capacity.min(max_size);
        let growth_step = chunk_size.max(1).saturating_mul(growth_factor.max(1));
        Self {
            bytes: Vec::with_capacity(capacity),
            capacity,
            growth_step,
            max_size,
        }
    }

    /// Make room for `additional` more bytes, growing in whole steps when needed.
    pub fn ensure_capacity(&mut self, additional: usize) -> Result<(), BufferError> {
        let requested = self.bytes.len().saturating_add(additional);
        if requested <= self.capacity {
            return Ok(());
        }

        let missing = requested - self.capacity;
        let steps = missing.div_ceil(self.growth_step);
        let grown = self
            .capacity
            .saturating_add(steps.saturating_mul(self.growth_step))
            .min(self.max_size);

        if grown < requested {
            return Err(BufferError::CapacityExceeded {
                requested,
                max: self.max_size,
            });
        }

        tracing::debug!(
            from = self.capacity,
            to = grown,
            max = self.max_size,
            "growing token buffer"
        );
        self.bytes.reserve_exact(grown - self.bytes.len());
        self.capacity = grown;
        Ok(())
    }

    /// Append `chunk`, returning the offset at which it starts.
    ///
    /// Either the whole chunk is committed or nothing is.
    pub fn append(&mut self, chunk: &[u8]) -> Result<usize, BufferError> {
        self.ensure_capacity(chunk.len())?;
        let offset = self.bytes.len();
        self.bytes.extend_from_slice(chunk);
        Ok(offset)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Bytes in `range`, or `None` if the range reaches past the end of the buffer.
    pub fn slice(&self, range: Range<usize>) -> Option<&[u8]> {
        self.bytes.get(range)
    }

    /// Text covered by `token`, with invalid UTF-8 replaced.
    ///
    /// Tokens from another buffer may point past the end; those resolve to an empty string.
    pub fn text(&self, token: &Token) -> Cow<'_, str> {
        match self.slice(token.span()) {
            Some(bytes) => String::from_utf8_lossy(bytes),
            None => Cow::Borrowed(""),
        }
    }
}
