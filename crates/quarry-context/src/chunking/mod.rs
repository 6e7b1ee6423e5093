//! Overlapping passage chunking for whole strings and streamed fragments.

mod chunker;
mod stream;

pub use chunker::{ChunkWindows, chunk_text, estimate_tokens};
pub use stream::StreamingAssembler;
