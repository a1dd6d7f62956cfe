use tracing::debug;

use crate::chunk::fixed::slide_windows;
use crate::chunk::paragraph::pack_paragraphs;
use crate::chunk::{char_len, Chunk, Chunker, Document};
use crate::config::ChunkConfig;
use crate::Result;

/// Two-tier segmenter used for ingestion.
///
/// Runs the paragraph packer first. When that yields at most one chunk for a
/// text longer than `max_chunk_size`, the paragraph structure did not actually
/// split anything (typically extracted text with no blank lines), so the
/// result is thrown away and the text is cut into fixed overlapping windows.
#[derive(Debug, Clone, Copy)]
pub struct Segmenter {
    config: ChunkConfig,
}

impl Segmenter {
    /// Create a segmenter, rejecting configs with a degenerate window stride.
    pub fn new(config: ChunkConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Create a segmenter without validation. The window stride is still
    /// clamped to at least one character.
    #[must_use]
    pub fn from_config(config: ChunkConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// Split `text` into chunks for `doc`.
    #[must_use]
    pub fn segment(&self, text: &str, doc: &Document) -> Vec<Chunk> {
        let max = self.config.max_chunk_size;
        let chunks = pack_paragraphs(text, doc, max, self.config.overlap_word_count);

        let text_len = char_len(text);
        if chunks.len() <= 1 && text_len > max {
            debug!(
                doc_id = %doc.id,
                text_len,
                "paragraph pass did not split text, falling back to fixed windows"
            );
            return slide_windows(text, doc, max, self.config.stride());
        }

        chunks
    }
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::from_config(ChunkConfig::default())
    }
}

impl Chunker for Segmenter {
    fn name(&self) -> &str {
        "auto"
    }

    fn chunk(&self, content: &str, doc: &Document) -> Vec<Chunk> {
        self.segment(content, doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::segment;
    use crate::Error;

    fn doc() -> Document {
        Document::new("doc", "doc.txt")
    }

    fn config(max_chunk_size: usize, overlap_size: usize) -> ChunkConfig {
        ChunkConfig {
            max_chunk_size,
            overlap_size,
            ..ChunkConfig::default()
        }
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = segment("  A short note without breaks.  ", &doc(), &ChunkConfig::default());

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "A short note without breaks.");
        assert_eq!(chunks[0].id, "doc_0");
    }

    #[test]
    fn test_empty_and_whitespace() {
        assert!(segment("", &doc(), &ChunkConfig::default()).is_empty());
        assert!(segment(" \n\n \t", &doc(), &ChunkConfig::default()).is_empty());
    }

    #[test]
    fn test_fallback_windows_for_unbroken_text() {
        let text: String = ('a'..='z').cycle().take(2500).collect();
        let chunks = segment(&text, &doc(), &config(1000, 200));

        assert_eq!(chunks.len(), 4);
        let chars: Vec<char> = text.chars().collect();
        let window = |a: usize, b: usize| chars[a..b].iter().collect::<String>();
        assert_eq!(chunks[0].text, window(0, 1000));
        assert_eq!(chunks[1].text, window(800, 1800));
        assert_eq!(chunks[2].text, window(1600, 2500));
        assert_eq!(chunks[3].text, window(2400, 2500));
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i);
        }
    }

    #[test]
    fn test_no_fallback_when_paragraphs_split() {
        let para = "word ".repeat(100);
        let text = format!("{para}\n\n{para}\n\n{para}");
        let chunks = segment(&text, &doc(), &config(600, 200));

        // every paragraph pass chunk starts on a word, never mid-window
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.text.starts_with("word")));
    }

    #[test]
    fn test_no_fallback_at_exact_budget() {
        let text = "x".repeat(1000);
        let chunks = segment(&text, &doc(), &config(1000, 200));

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text.len(), 1000);
    }

    #[test]
    fn test_overlap_words_in_second_chunk() {
        let text = "Paragraph one.\n\nParagraph two is much longer than sixty characters to force a split eventually maybe.";
        let cfg = ChunkConfig {
            max_chunk_size: 50,
            overlap_size: 10,
            overlap_word_count: 20,
        };
        let chunks = segment(text, &doc(), &cfg);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "Paragraph one.");
        assert!(chunks[1].text.starts_with("Paragraph one. "));
        assert!(chunks[1].text.ends_with("eventually maybe."));
    }

    #[test]
    fn test_deterministic() {
        let text = (0..40).map(|i| format!("Line {i} of a long report.")).collect::<Vec<_>>().join("\n\n");
        let cfg = config(200, 50);

        assert_eq!(segment(&text, &doc(), &cfg), segment(&text, &doc(), &cfg));
    }

    #[test]
    fn test_new_validates() {
        assert!(matches!(Segmenter::new(config(100, 100)), Err(Error::InvalidConfig(_))));
        assert!(Segmenter::new(config(100, 20)).is_ok());
    }

    #[test]
    fn test_unvalidated_overlap_falls_back_with_unit_stride() {
        let segmenter = Segmenter::from_config(config(4, 10));
        let chunks = segmenter.segment("abcdefgh", &doc());

        assert_eq!(chunks.len(), 8);
        assert_eq!(chunks[1].text, "bcde");
        assert_eq!(chunks[7].text, "h");
    }

    #[test]
    fn test_chunker_name() {
        assert_eq!(Segmenter::default().name(), "auto");
    }
}
