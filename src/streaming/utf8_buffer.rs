//! UTF-8 Boundary Handler
//!
//! Multi-byte UTF-8 characters can split across chunk boundaries. Incomplete
//! trailing sequences are held until the next chunk arrives, so decoding any
//! split of a byte stream yields the same text as decoding it whole.
//!
//! A UTF-8 character can be 1-4 bytes:
//! - 1 byte:  0xxxxxxx (ASCII)
//! - 2 bytes: 110xxxxx 10xxxxxx
//! - 3 bytes: 1110xxxx 10xxxxxx 10xxxxxx
//! - 4 bytes: 11110xxx 10xxxxxx 10xxxxxx 10xxxxxx
//!
//! Invalid bytes decode to U+FFFD.

/// Decodes byte chunks into text, holding split sequences between chunks.
#[derive(Debug, Default)]
pub struct Utf8Buffer {
    /// Leftover bytes from previous chunk (an incomplete sequence, max 3 bytes)
    leftover: [u8; 4],
    /// Number of leftover bytes
    leftover_len: usize,
}

impl Utf8Buffer {
    /// Create a new UTF-8 boundary handler
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a chunk. An incomplete sequence at the end is held back.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        if self.leftover_len == 0 {
            let keep = Self::incomplete_tail(chunk);
            let split = chunk.len() - keep;
            self.hold(&chunk[split..]);
            return String::from_utf8_lossy(&chunk[..split]).into_owned();
        }

        let mut bytes = Vec::with_capacity(self.leftover_len + chunk.len());
        bytes.extend_from_slice(&self.leftover[..self.leftover_len]);
        bytes.extend_from_slice(chunk);

        let keep = Self::incomplete_tail(&bytes);
        let split = bytes.len() - keep;
        self.hold(&bytes[split..]);
        String::from_utf8_lossy(&bytes[..split]).into_owned()
    }

    /// Flush held bytes at end of input. Whatever is left can never complete.
    pub fn finish(&mut self) -> String {
        let text = String::from_utf8_lossy(&self.leftover[..self.leftover_len]).into_owned();
        self.leftover_len = 0;
        text
    }

    /// Number of bytes currently held
    pub fn pending(&self) -> usize {
        self.leftover_len
    }

    fn hold(&mut self, tail: &[u8]) {
        self.leftover[..tail.len()].copy_from_slice(tail);
        self.leftover_len = tail.len();
    }

    /// Check if byte is a UTF-8 continuation byte (10xxxxxx)
    #[inline]
    pub fn is_continuation(byte: u8) -> bool {
        (byte & 0b11000000) == 0b10000000
    }

    /// Get expected length of UTF-8 sequence from first byte
    #[inline]
    pub fn sequence_length(first_byte: u8) -> usize {
        match first_byte {
            0x00..=0x7F => 1, // ASCII
            0xC0..=0xDF => 2, // 2-byte sequence
            0xE0..=0xEF => 3, // 3-byte sequence
            0xF0..=0xF7 => 4, // 4-byte sequence
            _ => 1,           // Invalid, treat as single byte
        }
    }

    /// Length of a started-but-unfinished sequence at the end of `bytes`
    fn incomplete_tail(bytes: &[u8]) -> usize {
        let floor = bytes.len().saturating_sub(3);
        for i in (floor..bytes.len()).rev() {
            if !Self::is_continuation(bytes[i]) {
                let available = bytes.len() - i;
                return if available < Self::sequence_length(bytes[i]) {
                    available
                } else {
                    0
                };
            }
        }
        0
    }
}
