//! Removal of invalid UTF-8 from feed bytes.
//!
//! Some publishers emit Latin-1 bytes inside otherwise UTF-8 documents. JSON
//! text must be UTF-8, and a single stray byte would make the parser give up
//! on the rest of a multi-gigabyte document, so undecodable bytes are dropped
//! before parsing. A sequence split across two reads is carried over and
//! completed by the next one.

use std::io::{self, Read};

use tracing::warn;

const READ_CHUNK: usize = 64 * 1024;

/// Incremental filter that passes valid UTF-8 and drops everything else.
#[derive(Debug, Default)]
pub struct Utf8Filter {
    /// Start of a multi-byte sequence cut by the end of the previous input.
    carry: Vec<u8>,
    dropped: u64,
}

impl Utf8Filter {
    /// Append the valid UTF-8 of `input` to `out`.
    pub fn feed(&mut self, input: &[u8], out: &mut Vec<u8>) {
        let joined;
        let bytes = if self.carry.is_empty() {
            input
        } else {
            self.carry.extend_from_slice(input);
            joined = std::mem::take(&mut self.carry);
            joined.as_slice()
        };

        out.reserve(bytes.len());
        let mut chunks = bytes.utf8_chunks().peekable();
        while let Some(chunk) = chunks.next() {
            out.extend_from_slice(chunk.valid().as_bytes());
            let invalid = chunk.invalid();
            if invalid.is_empty() {
                continue;
            }
            if chunks.peek().is_none() && is_incomplete(invalid) {
                self.carry.extend_from_slice(invalid);
            } else {
                self.dropped += invalid.len() as u64;
            }
        }
    }

    /// Drop a sequence left unfinished at the end of the input.
    pub fn finish(&mut self) {
        self.dropped += self.carry.len() as u64;
        self.carry.clear();
    }

    /// Bytes dropped so far.
    #[must_use]
    pub const fn dropped(&self) -> u64 {
        self.dropped
    }
}

/// A truncated but so far valid sequence, as opposed to a wrong byte.
fn is_incomplete(bytes: &[u8]) -> bool {
    std::str::from_utf8(bytes).is_err_and(|e| e.error_len().is_none())
}

/// Reader adapter applying [`Utf8Filter`] to everything read through it.
pub struct Utf8FilterReader<R> {
    inner: R,
    filter: Utf8Filter,
    raw: Vec<u8>,
    filtered: Vec<u8>,
    pos: usize,
    eof: bool,
}

impl<R: Read> Utf8FilterReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            filter: Utf8Filter::default(),
            raw: vec![0; READ_CHUNK],
            filtered: Vec::with_capacity(READ_CHUNK),
            pos: 0,
            eof: false,
        }
    }
}

impl<R: Read> Read for Utf8FilterReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.pos == self.filtered.len() {
            if self.eof || buf.is_empty() {
                return Ok(0);
            }
            self.filtered.clear();
            self.pos = 0;
            let n = self.inner.read(&mut self.raw)?;
            if n == 0 {
                self.filter.finish();
                self.eof = true;
                if self.filter.dropped() > 0 {
                    warn!(
                        bytes = self.filter.dropped(),
                        "dropped bytes that are not valid UTF-8"
                    );
                }
            } else {
                self.filter.feed(&self.raw[..n], &mut self.filtered);
            }
        }

        let n = buf.len().min(self.filtered.len() - self.pos);
        buf[..n].copy_from_slice(&self.filtered[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}
