//! Input Buffer
//!
//! Holds the bytes the scanner has received but not yet consumed. Input
//! arrives in chunks of any size, either pushed by the host or pulled from a
//! `Read` source. Consumed bytes are dropped by compaction, so the buffer only
//! ever holds an unfinished markup construct plus whatever arrived after it.

use std::io::{ErrorKind, Read};

/// Chunk size used when pulling from a reader
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Growable buffer of unconsumed input
#[derive(Debug, Default)]
pub struct InputBuffer {
    data: Vec<u8>,
    /// Consumed prefix of `data`
    pos: usize,
    /// Absolute stream offset of `data[0]`
    base_offset: u64,
    /// No more input will arrive
    eof: bool,
    /// Bytes shifted by compaction so far
    moved: u64,
}

impl InputBuffer {
    pub fn new() -> Self {
        InputBuffer {
            data: Vec::with_capacity(DEFAULT_CHUNK_SIZE),
            pos: 0,
            base_offset: 0,
            eof: false,
            moved: 0,
        }
    }

    /// Append a chunk of input
    pub fn extend(&mut self, chunk: &[u8]) {
        self.maybe_compact();
        self.data.extend_from_slice(chunk);
    }

    /// Pull one chunk from a reader
    ///
    /// Returns the number of bytes read; zero marks end of input.
    pub fn fill_from<R: Read>(&mut self, reader: &mut R, chunk_size: usize) -> std::io::Result<usize> {
        if self.eof {
            return Ok(0);
        }
        self.maybe_compact();

        let start = self.data.len();
        self.data.resize(start + chunk_size.max(1), 0);
        loop {
            match reader.read(&mut self.data[start..]) {
                Ok(read) => {
                    self.data.truncate(start + read);
                    if read == 0 {
                        self.eof = true;
                    }
                    return Ok(read);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.data.truncate(start);
                    return Err(e);
                }
            }
        }
    }

    /// Declare that no more input will arrive
    pub fn mark_eof(&mut self) {
        self.eof = true;
    }

    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Unconsumed bytes
    pub fn pending(&self) -> &[u8] {
        &self.data[self.pos..]
    }

    /// Mark `n` pending bytes as consumed
    pub fn consume(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.data.len());
    }

    /// Absolute stream offset of the first pending byte
    pub fn offset(&self) -> u64 {
        self.base_offset + self.pos as u64
    }

    /// Total bytes received so far
    pub fn received(&self) -> u64 {
        self.base_offset + self.data.len() as u64
    }

    /// Number of unconsumed bytes
    pub fn pending_len(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Drop every consumed byte
    pub fn compact(&mut self) {
        if self.pos == 0 {
            return;
        }
        self.moved += (self.data.len() - self.pos) as u64;
        self.data.drain(..self.pos);
        self.base_offset += self.pos as u64;
        self.pos = 0;
    }

    /// Bytes shifted by compaction since the buffer was created
    pub fn bytes_moved(&self) -> u64 {
        self.moved
    }

    /// Compact only when the tail is no bigger than the consumed prefix,
    /// so the total bytes moved stay below the bytes received
    pub(crate) fn maybe_compact(&mut self) {
        if self.pos > 0 && self.pos >= self.data.len() - self.pos {
            self.compact();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_extend_and_consume() {
        let mut buffer = InputBuffer::new();
        buffer.extend(b"<a>");
        buffer.extend(b"text");
        assert_eq!(buffer.pending(), b"<a>text");
        buffer.consume(3);
        assert_eq!(buffer.pending(), b"text");
        assert_eq!(buffer.offset(), 3);
        assert_eq!(buffer.received(), 7);
    }

    #[test]
    fn test_compact_keeps_offsets() {
        let mut buffer = InputBuffer::new();
        buffer.extend(b"0123456789");
        buffer.consume(8);
        buffer.compact();
        assert_eq!(buffer.pending(), b"89");
        assert_eq!(buffer.offset(), 8);
        buffer.extend(b"ab");
        assert_eq!(buffer.pending(), b"89ab");
        assert_eq!(buffer.received(), 12);
        assert_eq!(buffer.bytes_moved(), 2);
    }

    #[test]
    fn test_maybe_compact_waits_for_consumed_prefix() {
        let mut buffer = InputBuffer::new();
        buffer.extend(b"0123456789");
        buffer.consume(3);
        buffer.maybe_compact();
        assert_eq!(buffer.bytes_moved(), 0);
        assert_eq!(buffer.offset(), 3);

        buffer.consume(3);
        buffer.maybe_compact();
        assert_eq!(buffer.bytes_moved(), 4);
        assert_eq!(buffer.pending(), b"6789");
        assert_eq!(buffer.offset(), 6);
    }

    #[test]
    fn test_fill_from_reader() {
        let mut source = Cursor::new(b"<root>content</root>".to_vec());
        let mut buffer = InputBuffer::new();
        assert_eq!(buffer.fill_from(&mut source, 6).unwrap(), 6);
        assert_eq!(buffer.pending(), b"<root>");
        while buffer.fill_from(&mut source, 6).unwrap() > 0 {}
        assert!(buffer.is_eof());
        assert_eq!(buffer.pending(), b"<root>content</root>");
    }
}
