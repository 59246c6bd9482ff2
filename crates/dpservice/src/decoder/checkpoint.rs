//! Reader that can replay everything read since the last checkpoint.

use std::io::{self, Read};

/// Wraps a reader and records every byte pulled from it since the last
/// [`checkpoint`](Self::checkpoint), so the bytes can be replayed after a
/// [`rewind`](Self::rewind).
#[derive(Debug)]
pub struct CheckpointReader<R> {
    inner: R,
    buf: Vec<u8>,
    offset: usize,
}

impl<R> CheckpointReader<R> {
    /// Wrap `inner`.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: Vec::new(),
            offset: 0,
        }
    }

    /// Forget everything consumed so far.
    ///
    /// Bytes that were replayed into the buffer but not read again are kept,
    /// so a rewind followed by a partial read loses nothing.
    pub fn checkpoint(&mut self) {
        self.buf.drain(..self.offset);
        self.offset = 0;
    }

    /// Replay from the last checkpoint on the next read.
    pub fn rewind(&mut self) {
        self.offset = 0;
    }

    /// Step back over the last `n` bytes read, so they are read again.
    ///
    /// Never steps back past the last checkpoint.
    pub fn unread(&mut self, n: usize) {
        self.offset = self.offset.saturating_sub(n);
    }

    /// Number of bytes held for replay.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Unwrap the underlying reader, dropping any buffered bytes.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for CheckpointReader<R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if self.offset < self.buf.len() {
            let pending = &self.buf[self.offset..];
            let n = pending.len().min(out.len());
            out[..n].copy_from_slice(&pending[..n]);
            self.offset += n;
            return Ok(n);
        }

        let n = self.inner.read(out)?;
        self.buf.extend_from_slice(&out[..n]);
        self.offset += n;
        Ok(n)
    }
}
