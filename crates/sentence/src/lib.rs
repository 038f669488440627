//! # Incremental sentence segmentation
//!
//! Text arrives as arbitrarily-fragmented deltas; speech synthesis wants
//! complete sentences. The segmenter buffers incoming fragments and emits
//! a unit whenever it sees terminal punctuation (`.`, `!`, `?`) followed
//! by whitespace. Everything that never reaches such a boundary comes out
//! of `flush` at end of stream.
//!
//! Units keep their trailing whitespace, so concatenating every emitted
//! unit (plus the flushed remainder) reproduces the input byte-for-byte.
//! That is the contract the transcript persistence relies on.
//!
//! The boundary rule is deliberately permissive: "Mr. Smith" splits after
//! "Mr. " because the punctuation is followed by whitespace, while "3.14"
//! never splits because it is not. No lookahead correction is attempted.

const TERMINALS: [char; 3] = ['.', '!', '?'];

/// Buffering state machine that cuts incoming text into sentence units.
///
/// `feed` returns zero or more complete units per fragment; `flush`
/// drains whatever remainder never saw a boundary. Both reset the scan
/// position so an instance can be reused across responses.
#[derive(Debug, Default)]
pub struct SentenceSegmenter {
    buffer: String,
    scan_from: usize,
}

impl SentenceSegmenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a fragment and returns every sentence unit that became
    /// recognizable, in order.
    pub fn feed(&mut self, fragment: &str) -> Vec<String> {
        self.buffer.push_str(fragment);

        let mut units = Vec::new();
        while let Some(end) = self.next_boundary() {
            let rest = self.buffer.split_off(end);
            let unit = std::mem::replace(&mut self.buffer, rest);
            self.scan_from = 0;
            units.push(unit);
        }
        units
    }

    /// Drains the unterminated remainder, if any, and clears state.
    pub fn flush(&mut self) -> Option<String> {
        self.scan_from = 0;
        if self.buffer.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.buffer))
    }

    /// Text currently held without a recognized boundary.
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    /// Finds the byte offset one past the next boundary (terminal
    /// punctuation plus its contiguous whitespace run), starting at the
    /// remembered scan position. Advances the scan position past every
    /// offset that can no longer become a boundary when nothing matches.
    fn next_boundary(&mut self) -> Option<usize> {
        let hay = &self.buffer[self.scan_from..];
        let mut chars = hay.char_indices().peekable();

        while let Some((idx, c)) = chars.next() {
            if !TERMINALS.contains(&c) {
                continue;
            }
            match chars.peek() {
                Some(&(_, next)) if next.is_whitespace() => {
                    let mut end = idx + c.len_utf8();
                    while let Some(&(widx, w)) = chars.peek() {
                        if !w.is_whitespace() {
                            break;
                        }
                        end = widx + w.len_utf8();
                        chars.next();
                    }
                    return Some(self.scan_from + end);
                }
                Some(_) => {
                    // punctuation inside a token ("3.14", "e.g.x"), keep going
                }
                None => {
                    // terminal punctuation at buffer end is undecided until
                    // the next fragment arrives
                    self.scan_from += idx;
                    return None;
                }
            }
        }

        self.scan_from = self.buffer.len();
        None
    }
}
