//! Incremental chunking of documents that arrive as fragments.

use std::mem::take;

use quarry_core::{ChunkingConfig, Passage};
use tracing::debug;

use super::chunk_text;

/// Streaming front end for [`chunk_text`].
///
/// Fragments accumulate in a buffer bounded by the flush threshold. When the
/// buffer grows past it, the whole buffer is chunked and emitted, and only its
/// trailing overlap is kept so the next flush still overlaps the previous one.
/// A change of source, or [`finish`](Self::finish), flushes the document.
#[derive(Debug)]
pub struct StreamingAssembler {
    /// Chunking parameters
    config: ChunkingConfig,
    /// Carry-over text of the current document
    buffer: String,
    /// Length of `buffer` in chars
    buffer_chars: usize,
    /// Chars appended since the last flush
    fresh_chars: usize,
    /// Document the buffer belongs to
    source: Option<String>,
}

impl StreamingAssembler {
    /// Create an assembler with empty state.
    pub fn new(config: ChunkingConfig) -> Self {
        Self {
            config,
            buffer: String::default(),
            buffer_chars: 0,
            fresh_chars: 0,
            source: None,
        }
    }

    /// Append `fragment` of document `source`, returning any finalized passages.
    ///
    /// A source different from the previous call first flushes the previous
    /// document, so passages never span two sources.
    pub fn feed(&mut self, fragment: &str, source: &str) -> Vec<Passage> {
        let mut emitted = Vec::default();

        if self.source.as_deref() != Some(source) {
            emitted.extend(self.flush_document());
            self.source = Some(source.to_owned());
        }

        let fragment_chars = fragment.chars().count();
        self.buffer.push_str(fragment);
        self.buffer_chars += fragment_chars;
        self.fresh_chars += fragment_chars;

        if self.buffer_chars > self.config.flush_threshold() {
            emitted.extend(self.chunk_buffer());
            self.retain_overlap();
        }

        emitted
    }

    /// Flush the final document at end of stream.
    pub fn finish(&mut self) -> Vec<Passage> {
        let emitted = self.flush_document();
        self.source = None;
        emitted
    }

    /// Current source document, if any.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Chars currently held in the carry-over buffer.
    pub fn buffered_chars(&self) -> usize {
        self.buffer_chars
    }

    /// Chunk the buffer and clear it.
    ///
    /// A buffer holding only the overlap tail of an earlier flush has nothing
    /// new to contribute and is dropped without emitting.
    fn flush_document(&mut self) -> Vec<Passage> {
        let emitted = if self.fresh_chars > 0 {
            self.chunk_buffer()
        } else {
            Vec::default()
        };
        self.buffer.clear();
        self.buffer_chars = 0;
        self.fresh_chars = 0;
        emitted
    }

    fn chunk_buffer(&self) -> Vec<Passage> {
        let source = self.source.clone().unwrap_or_default();
        let passages: Vec<Passage> = chunk_text(&self.buffer, &self.config)
            .map(|content| Passage::new(content, source.clone()))
            .collect();
        debug!(
            "Flushed {} chars of {} into {} passages",
            self.buffer_chars,
            source,
            passages.len()
        );
        passages
    }

    /// Keep the trailing overlap of the buffer; empty if the buffer is shorter.
    fn retain_overlap(&mut self) {
        let overlap = self.config.overlap_chars();
        self.fresh_chars = 0;

        if overlap == 0 || self.buffer_chars <= overlap {
            self.buffer.clear();
            self.buffer_chars = 0;
            return;
        }

        let tail_start = self
            .buffer
            .char_indices()
            .rev()
            .nth(overlap - 1)
            .map_or(0, |(offset, _)| offset);
        self.buffer = take(&mut self.buffer).split_off(tail_start);
        self.buffer_chars = overlap;
    }
}
