//! Pull-based byte sources
//!
//! A [`ByteSource`] fills a caller-provided chunk and reports either how many bytes it
//! wrote or that the stream has ended. Zero bytes without end-of-stream is a legal
//! answer (a non-blocking source with nothing ready) and the driver retries it under
//! its read policy.

use std::io::{self, Read};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// `n` bytes were written to the front of the chunk; `n` may be zero.
    Data(usize),
    /// The source is exhausted.
    EndOfStream,
}

pub trait ByteSource {
    fn read_chunk(&mut self, chunk: &mut [u8]) -> io::Result<ReadOutcome>;
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read_chunk(&mut self, chunk: &mut [u8]) -> io::Result<ReadOutcome> {
        (**self).read_chunk(chunk)
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn read_chunk(&mut self, chunk: &mut [u8]) -> io::Result<ReadOutcome> {
        (**self).read_chunk(chunk)
    }
}

/// Adapts any [`std::io::Read`].
///
/// `Ok(0)` from the reader is end-of-stream. `WouldBlock` and `Interrupted` are
/// reported as empty reads so the driver retries them.
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: R,
}

impl<R: Read> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> ByteSource for ReaderSource<R> {
    fn read_chunk(&mut self, chunk: &mut [u8]) -> io::Result<ReadOutcome> {
        if chunk.is_empty() {
            return Ok(ReadOutcome::Data(0));
        }
        match self.reader.read(chunk) {
            Ok(0) => Ok(ReadOutcome::EndOfStream),
            Ok(n) => Ok(ReadOutcome::Data(n)),
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
            {
                Ok(ReadOutcome::Data(0))
            }
            Err(err) => Err(err),
        }
    }
}

/// An in-memory source over a byte slice.
#[derive(Debug, Clone)]
pub struct SliceSource<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }
}

impl ByteSource for SliceSource<'_> {
    fn read_chunk(&mut self, chunk: &mut [u8]) -> io::Result<ReadOutcome> {
        let remaining = &self.bytes[self.position..];
        if remaining.is_empty() {
            return Ok(ReadOutcome::EndOfStream);
        }
        let n = remaining.len().min(chunk.len());
        chunk[..n].copy_from_slice(&remaining[..n]);
        self.position += n;
        Ok(ReadOutcome::Data(n))
    }
}
