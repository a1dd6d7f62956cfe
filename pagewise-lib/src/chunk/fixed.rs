use std::iter;

use crate::chunk::{Chunk, ChunkSink, Chunker, Document};
use crate::config::ChunkConfig;

/// Fixed-size chunker - slides a character window across the text
///
/// Good for: text without paragraph breaks, consistent chunk sizes
///
/// Windows start every `chunk_size - overlap` characters and are trimmed;
/// windows that trim to nothing are skipped.
pub struct FixedSizeChunker {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Chunker for FixedSizeChunker {
    fn name(&self) -> &str {
        "fixed"
    }

    fn chunk(&self, content: &str, doc: &Document) -> Vec<Chunk> {
        let window = ChunkConfig {
            max_chunk_size: self.chunk_size,
            overlap_size: self.overlap,
            overlap_word_count: 0,
        };
        slide_windows(content, doc, self.chunk_size, window.stride())
    }
}

pub(crate) fn slide_windows(
    content: &str,
    doc: &Document,
    chunk_size: usize,
    stride: usize,
) -> Vec<Chunk> {
    debug_assert!(stride > 0, "window stride must be positive");
    let size = chunk_size.max(1);

    // byte offset of every char, plus the end, so windows land on char boundaries
    let bounds: Vec<usize> = content
        .char_indices()
        .map(|(i, _)| i)
        .chain(iter::once(content.len()))
        .collect();
    let total = bounds.len() - 1;

    let mut sink = ChunkSink::new(doc);
    let mut start = 0;
    while start < total {
        let end = (start + size).min(total);
        sink.push(&content[bounds[start]..bounds[end]]);
        start += stride;
    }
    sink.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Document {
        Document::new("doc", "doc.txt")
    }

    #[test]
    fn test_basic_chunking() {
        let chunker = FixedSizeChunker { chunk_size: 10, overlap: 0 };
        let content = "0123456789abcdefghij"; // 20 chars
        let chunks = chunker.chunk(content, &doc());

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "0123456789");
        assert_eq!(chunks[1].text, "abcdefghij");
    }

    #[test]
    fn test_overlap() {
        let chunker = FixedSizeChunker { chunk_size: 10, overlap: 5 };
        let content = "0123456789abcdefghij"; // 20 chars, stride=5
        let chunks = chunker.chunk(content, &doc());

        // stride=5, so positions: 0, 5, 10, 15
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0].text, "0123456789"); // 0..10
        assert_eq!(chunks[1].text, "56789abcde"); // 5..15
        assert_eq!(chunks[2].text, "abcdefghij"); // 10..20
        assert_eq!(chunks[3].text, "fghij"); // 15..20 (partial)
    }

    #[test]
    fn test_unicode_safety() {
        let chunker = FixedSizeChunker { chunk_size: 5, overlap: 0 };
        let content = "Hello 👋 World"; // emoji is 4 bytes

        // Should not panic on unicode boundaries
        let chunks = chunker.chunk(content, &doc());
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["Hello", "👋 Wo", "rld"]);
    }

    #[test]
    fn test_blank_windows_skipped() {
        let chunker = FixedSizeChunker { chunk_size: 4, overlap: 0 };
        let content = "abcd        efgh";
        let chunks = chunker.chunk(content, &doc());

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].text, "efgh");
        assert_eq!(chunks[1].chunk_index, 1);
        assert_eq!(chunks[1].id, "doc_1");
    }

    #[test]
    fn test_positional_ids() {
        let chunker = FixedSizeChunker { chunk_size: 5, overlap: 0 };
        let content = "aaaaaaaaaa"; // same content, different positions
        let chunks = chunker.chunk(content, &doc());

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].id, "doc_0");
        assert_eq!(chunks[1].id, "doc_1");
    }

    #[test]
    fn test_overlap_not_below_size_terminates() {
        let chunker = FixedSizeChunker { chunk_size: 3, overlap: 3 };
        let chunks = chunker.chunk("abcdef", &doc());

        // stride clamps to 1
        assert_eq!(chunks.len(), 6);
        assert_eq!(chunks[5].text, "f");
    }

    #[test]
    fn test_empty_content() {
        let chunker = FixedSizeChunker { chunk_size: 10, overlap: 0 };
        assert!(chunker.chunk("", &doc()).is_empty());
    }
}
