//! Incremental UTF-8 decoding for streamed response bodies.
//!
//! Network chunks may end in the middle of a multi-byte character. The
//! decoder keeps the incomplete tail and prepends it to the next chunk, so a
//! character split across two reads is emitted once, intact.

/// Stateful UTF-8 decoder fed one chunk at a time.
#[derive(Debug, Default)]
pub struct Utf8StreamDecoder {
    pending: Vec<u8>,
}

impl Utf8StreamDecoder {
    /// Create a decoder with no buffered bytes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode as much of `chunk` (plus any carried-over bytes) as possible.
    ///
    /// Invalid sequences become U+FFFD. A trailing sequence that is merely
    /// incomplete is held back until the next call or [`finish`](Self::finish).
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);

        let mut out = String::with_capacity(self.pending.len());
        let mut rest: &[u8] = &self.pending;
        let mut keep = 0;

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                    match err.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[bad..];
                        }
                        None => {
                            keep = after.len();
                            break;
                        }
                    }
                }
            }
        }

        let consumed = self.pending.len() - keep;
        self.pending.drain(..consumed);
        out
    }

    /// Flush the decoder at end of stream.
    ///
    /// A dangling partial sequence cannot be completed any more and is
    /// emitted as U+FFFD.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        let tail = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        tail
    }

    /// Number of bytes waiting for the rest of their character.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passes_through() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"Hi"), "Hi");
        assert_eq!(decoder.decode(b" there"), " there");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_split_multibyte_character() {
        // "é" is 0xC3 0xA9, "🙂" is four bytes.
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"caf\xC3"), "caf");
        assert_eq!(decoder.pending_len(), 1);
        assert_eq!(decoder.decode(b"\xA9 "), "é ");

        let smile = "🙂".as_bytes();
        assert_eq!(decoder.decode(&smile[..1]), "");
        assert_eq!(decoder.decode(&smile[1..3]), "");
        assert_eq!(decoder.decode(&smile[3..]), "🙂");
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn test_invalid_bytes_are_replaced() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"a\xFFb"), "a\u{FFFD}b");
    }

    #[test]
    fn test_dangling_sequence_flushed_on_finish() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"ok\xE2\x82"), "ok");
        assert_eq!(decoder.finish(), "\u{FFFD}");
        assert_eq!(decoder.pending_len(), 0);
    }
}
