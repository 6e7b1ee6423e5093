//! Whole-string chunking into overlapping, space-aligned windows.

use std::iter::FusedIterator;
use std::ops::Range;

use quarry_core::ChunkingConfig;
use quarry_core::config::CHARS_PER_TOKEN;

/// Estimate tokens from text (rough: ~4 chars per token)
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / CHARS_PER_TOKEN
}

/// Chunk `text` into trimmed, non-empty, overlapping passages.
///
/// Lazy and single-pass; passages borrow from `text`.
pub fn chunk_text<'text>(
    text: &'text str,
    config: &ChunkingConfig,
) -> impl Iterator<Item = &'text str> + 'text {
    ChunkWindows::new(text, config)
        .map(move |window| text[window].trim())
        .filter(|passage| !passage.is_empty())
}

/// Iterator over the raw byte ranges of each chunk window.
///
/// Windows are measured in chars. A window that is not the last one ends at
/// the last space inside it when that space lies past 80% of the window, so
/// words are not split unless there is no late space. Consecutive windows
/// share `overlap_chars` characters; the start offset strictly increases.
#[derive(Debug, Clone)]
pub struct ChunkWindows<'text> {
    /// Text being chunked
    text: &'text str,
    /// Window size in chars (at least 1)
    chunk_chars: usize,
    /// Overlap between windows in chars
    overlap_chars: usize,
    /// Byte offset of the next window
    start: usize,
    /// Whether the final window has been produced
    done: bool,
}

impl<'text> ChunkWindows<'text> {
    /// Create a window iterator over `text`.
    pub fn new(text: &'text str, config: &ChunkingConfig) -> Self {
        Self {
            text,
            chunk_chars: config.chunk_chars().max(1),
            overlap_chars: config.overlap_chars(),
            start: 0,
            done: text.is_empty(),
        }
    }

    /// Byte offset `chunk_chars` characters after `start`, or the text end.
    fn hard_end(&self) -> usize {
        self.text[self.start..]
            .char_indices()
            .nth(self.chunk_chars)
            .map_or(self.text.len(), |(offset, _)| self.start + offset)
    }

    /// Pull `end` back to the last space if it lies past 80% of the window.
    fn soft_end(&self, end: usize) -> usize {
        let window = &self.text[self.start..end];
        let Some(space) = window.rfind(' ') else {
            return end;
        };
        let chars_before = window[..space].chars().count();
        if chars_before * 5 > self.chunk_chars * 4 {
            self.start + space
        } else {
            end
        }
    }

    /// Byte offset `overlap_chars` characters before `end`, clamped to 0.
    fn overlap_start(&self, end: usize) -> usize {
        if self.overlap_chars == 0 {
            return end;
        }
        self.text[..end]
            .char_indices()
            .rev()
            .nth(self.overlap_chars - 1)
            .map_or(0, |(offset, _)| offset)
    }
}

impl Iterator for ChunkWindows<'_> {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let len = self.text.len();
        let mut end = self.hard_end();
        if end < len {
            end = self.soft_end(end);
        }
        let window = self.start..end;

        if end == len {
            self.done = true;
        } else {
            let next = self.overlap_start(end);
            // Overlap that would not move the cursor forward degrades to none.
            self.start = if next <= self.start || next >= end {
                end
            } else {
                next
            };
        }

        Some(window)
    }
}

impl FusedIterator for ChunkWindows<'_> {}
