//! # skein-chunk-buffer
//!
//! Accumulates a growing text stream (LLM token deltas) and flushes
//! coherent chunks once either a character threshold is reached or a
//! configured delimiter substring is observed (spec §4.3) — so a UI sees
//! whole sentences rather than token fragments.

/// Accumulates streamed text and invokes a flush callback once a threshold
/// or delimiter condition is met.
pub struct ChunkBuffer<F: FnMut(&str, &str)> {
    threshold: usize,
    delimiters: Vec<String>,
    pending: String,
    full: String,
    on_flush: F,
}

impl<F: FnMut(&str, &str)> ChunkBuffer<F> {
    /// Create a buffer that flushes after `threshold` pending characters or
    /// whenever any of `delimiters` appears, whichever comes first.
    /// `on_flush(chunk, full_text)` is called with the newly flushed slice
    /// and the entire accumulation so far.
    pub fn new(threshold: usize, delimiters: Vec<String>, on_flush: F) -> Self {
        Self {
            threshold,
            delimiters,
            pending: String::new(),
            full: String::new(),
            on_flush,
        }
    }

    /// Append newly streamed text, flushing zero or more chunks as
    /// thresholds/delimiters are crossed.
    pub fn push(&mut self, text: &str) {
        self.full.push_str(text);
        self.pending.push_str(text);
        self.drain_ready_chunks();
    }

    /// Flush any remaining buffered text. Call once after the stream ends.
    pub fn end(&mut self) {
        if !self.pending.is_empty() {
            let chunk = std::mem::take(&mut self.pending);
            (self.on_flush)(&chunk, &self.full);
        }
    }

    /// The full accumulation observed so far (including unflushed text).
    #[must_use]
    pub fn full_text(&self) -> &str {
        &self.full
    }

    fn earliest_delimiter(&self) -> Option<(usize, usize)> {
        self.delimiters
            .iter()
            .filter_map(|d| {
                if d.is_empty() {
                    None
                } else {
                    self.pending.find(d.as_str()).map(|idx| (idx, d.len()))
                }
            })
            .min_by_key(|&(idx, _)| idx)
    }

    fn drain_ready_chunks(&mut self) {
        loop {
            if let Some((idx, len)) = self.earliest_delimiter() {
                let split_at = idx + len;
                let chunk: String = self.pending.drain(..split_at).collect();
                (self.on_flush)(&chunk, &self.full);
            } else if self.pending.len() >= self.threshold && self.threshold > 0 {
                let chunk = std::mem::take(&mut self.pending);
                (self.on_flush)(&chunk, &self.full);
                break;
            } else {
                break;
            }
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn round_trip_concatenation_equals_input(
            pieces in proptest::collection::vec("[a-zA-Z0-9 .!\n]{0,12}", 0..20),
            threshold in 1usize..16,
        ) {
            let input: String = pieces.concat();
            let flushed = std::cell::RefCell::new(String::new());
            let mut buf = ChunkBuffer::new(threshold, vec![". ".to_string(), "\n".to_string()], |chunk, _full| {
                flushed.borrow_mut().push_str(chunk);
            });
            for piece in &pieces {
                buf.push(piece);
            }
            buf.end();
            prop_assert_eq!(flushed.into_inner(), input);
        }
    }
}
